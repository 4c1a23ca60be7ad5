//! Value Objects - immutable business concepts

mod date_range;
mod sms;
mod user_role;

pub use date_range::{parse_date, DateRange, DATE_FORMAT};
pub use sms::{format_sms, SmsBody, SmsMessageType};
pub use user_role::UserRole;
