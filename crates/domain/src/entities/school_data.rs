//! Read-mostly operational data for each school.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub school_id: String,
    pub class: String,
    pub section: String,
    pub period_number: u32,
    pub time_slot: String,
    pub subject: String,
    pub is_pe_period: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub lesson_plan_id: String,
    pub school_id: String,
    pub session: String,
    /// Lesson ids, in teaching order
    pub lessons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: String,
    pub name: String,
    pub description: String,
    /// Minutes
    pub duration: u32,
    pub required_props: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub prop_id: String,
    pub prop_type: String,
    pub school_id: String,
    pub quantity: u32,
    pub available: u32,
    pub status: String,
}

impl Prop {
    /// Share of the stock currently out of the cupboard, in percent.
    pub fn utilization_percent(&self) -> f64 {
        if self.quantity == 0 {
            return 0.0;
        }
        let in_use = self.quantity.saturating_sub(self.available);
        f64::from(in_use) / f64::from(self.quantity) * 100.0
    }

    pub fn display_type(&self) -> String {
        title_case(&self.prop_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub school_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// `"football nets"` → `"Football Nets"`
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(quantity: u32, available: u32) -> Prop {
        Prop {
            prop_id: "PROP001".into(),
            prop_type: "football".into(),
            school_id: "SCH001".into(),
            quantity,
            available,
            status: "good".into(),
        }
    }

    #[test]
    fn test_utilization() {
        assert!((prop(10, 8).utilization_percent() - 20.0).abs() < 1e-9);
        assert_eq!(prop(0, 0).utilization_percent(), 0.0);
        // more available than owned never goes negative
        assert_eq!(prop(5, 7).utilization_percent(), 0.0);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("football"), "Football");
        assert_eq!(title_case("agility CONES"), "Agility Cones");
        assert_eq!(prop(1, 1).display_type(), "Football");
    }
}
