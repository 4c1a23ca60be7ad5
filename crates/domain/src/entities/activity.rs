//! Activity records written by residents.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonCompletion {
    pub school_id: String,
    pub class: String,
    pub section: String,
    pub period_number: u32,
    pub lesson_id: String,
    pub resident_id: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// Filled with the local time on write when absent
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropUpdate {
    pub prop_id: String,
    pub status: String,
    pub resident_id: String,
    pub notes: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl PropUpdate {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}
