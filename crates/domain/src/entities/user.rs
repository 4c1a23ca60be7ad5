use crate::value_objects::UserRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    /// Never written to logs or exports
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: UserRole,
    pub name: String,
    pub school_id: Option<String>,
    pub reports_to: Option<String>,
}

impl User {
    pub fn school_label(&self) -> &str {
        self.school_id.as_deref().unwrap_or("Multiple/Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_not_serialized() {
        let user = User {
            user_id: "R001".into(),
            password: "r123".into(),
            role: UserRole::Resident,
            name: "Ravi Kumar".into(),
            school_id: Some("SCH001".into()),
            reports_to: Some("DM001".into()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("r123"));
        assert!(json.contains("\"role\":\"R\""));
    }

    #[test]
    fn test_school_label_fallback() {
        let user = User {
            user_id: "HO001".into(),
            password: String::new(),
            role: UserRole::HeadOffice,
            name: "Head Office".into(),
            school_id: None,
            reports_to: None,
        };
        assert_eq!(user.school_label(), "Multiple/Unknown");
    }
}
