//! Domain Layer - SportzVillage operational records
//!
//! Plain business types shared by the database, tools and agent crates:
//! - Entities: users and school operational data (timetables, lessons, props, events)
//! - Value Objects: roles, date ranges, SMS message formats
//!
//! Nothing here touches files, networks or the LLM.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{
    title_case, Event, Lesson, LessonCompletion, LessonPlan, Prop, PropUpdate, TimetableEntry,
    User,
};
pub use errors::{DomainError, DomainResult};
pub use value_objects::{
    format_sms, parse_date, DateRange, SmsBody, SmsMessageType, UserRole, DATE_FORMAT,
};
