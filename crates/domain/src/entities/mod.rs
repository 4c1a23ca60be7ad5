//! Domain Entities - records read from and written to the operational store

mod activity;
mod school_data;
mod user;

pub use activity::{LessonCompletion, PropUpdate};
pub use school_data::{title_case, Event, Lesson, LessonPlan, Prop, TimetableEntry};
pub use user::User;
