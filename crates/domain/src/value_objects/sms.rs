//! SMS formats used to report field activity to Head Office

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsMessageType {
    LessonCompletion,
    PropUpdate,
    Absence,
    General,
}

impl SmsMessageType {
    /// Unrecognised types are sent as general information.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "lesson_completion" => SmsMessageType::LessonCompletion,
            "prop_update" => SmsMessageType::PropUpdate,
            "absence" => SmsMessageType::Absence,
            _ => SmsMessageType::General,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            SmsMessageType::LessonCompletion => "[SV-LC]",
            SmsMessageType::PropUpdate => "[SV-PROP]",
            SmsMessageType::Absence => "[SV-ABS]",
            SmsMessageType::General => "[SV-INFO]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SmsMessageType::LessonCompletion => "lesson_completion",
            SmsMessageType::PropUpdate => "prop_update",
            SmsMessageType::Absence => "absence",
            SmsMessageType::General => "general",
        }
    }
}

impl fmt::Display for SmsMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipe-delimited SMS bodies.
pub struct SmsBody;

impl SmsBody {
    /// `school|class-section|Pperiod|lesson|resident|date|notes`
    #[allow(clippy::too_many_arguments)]
    pub fn lesson_completion(
        school_id: &str,
        class: &str,
        section: &str,
        period_number: u32,
        lesson_id: &str,
        resident_id: &str,
        date: &str,
        notes: Option<&str>,
    ) -> String {
        format!(
            "{}|{}-{}|P{}|{}|{}|{}|{}",
            school_id,
            class,
            section,
            period_number,
            lesson_id,
            resident_id,
            date,
            notes.unwrap_or("")
        )
    }

    /// `prop|status|resident|date|notes`
    pub fn prop_update(
        prop_id: &str,
        status: &str,
        resident_id: &str,
        date: &str,
        notes: Option<&str>,
    ) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            prop_id,
            status,
            resident_id,
            date,
            notes.unwrap_or("")
        )
    }
}

/// Prefix a body with its SV message tag.
pub fn format_sms(message_type: SmsMessageType, body: &str) -> String {
    format!("{} {}", message_type.prefix(), body)
}
