//! UserRole - position of a user in the SportzVillage hierarchy

use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Organisational role.
///
/// Reporting chain: Head Office → Regional Manager → Delivery Manager →
/// Resident. Delivery Leads sit beside Delivery Managers; School Principals
/// sit outside the chain and receive reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UserRole {
    /// Head Office
    HeadOffice,
    /// Regional Manager
    RegionalManager,
    /// Delivery Manager
    DeliveryManager,
    /// Delivery Lead
    DeliveryLead,
    /// Resident coach placed at a school
    Resident,
    /// School Principal
    Principal,
}

impl UserRole {
    pub const ALL: [UserRole; 6] = [
        UserRole::HeadOffice,
        UserRole::RegionalManager,
        UserRole::DeliveryManager,
        UserRole::DeliveryLead,
        UserRole::Resident,
        UserRole::Principal,
    ];

    /// Short code stored in the users table.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::HeadOffice => "HO",
            UserRole::RegionalManager => "RM",
            UserRole::DeliveryManager => "DM",
            UserRole::DeliveryLead => "DL",
            UserRole::Resident => "R",
            UserRole::Principal => "PRINCIPAL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::HeadOffice => "Head Office",
            UserRole::RegionalManager => "Regional Manager",
            UserRole::DeliveryManager => "Delivery Manager",
            UserRole::DeliveryLead => "Delivery Lead",
            UserRole::Resident => "Resident",
            UserRole::Principal => "School Principal",
        }
    }

    /// Roles that manage other users.
    pub fn is_manager(&self) -> bool {
        matches!(
            self,
            UserRole::RegionalManager | UserRole::DeliveryManager | UserRole::DeliveryLead
        )
    }

    /// Role whose approval a sensitive action by this role needs, if any.
    pub fn approver(&self) -> Option<UserRole> {
        match self {
            UserRole::Resident => Some(UserRole::DeliveryManager),
            _ => None,
        }
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HO" => Ok(UserRole::HeadOffice),
            "RM" => Ok(UserRole::RegionalManager),
            "DM" => Ok(UserRole::DeliveryManager),
            "DL" => Ok(UserRole::DeliveryLead),
            "R" => Ok(UserRole::Resident),
            "PRINCIPAL" => Ok(UserRole::Principal),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("principal".parse::<UserRole>().unwrap(), UserRole::Principal);
        assert_eq!(" dm ".parse::<UserRole>().unwrap(), UserRole::DeliveryManager);
    }

    #[test]
    fn test_unknown_role() {
        assert_eq!(
            "COACH".parse::<UserRole>(),
            Err(DomainError::UnknownRole("COACH".to_string()))
        );
    }

    #[test]
    fn test_only_residents_need_approval() {
        assert_eq!(UserRole::Resident.approver(), Some(UserRole::DeliveryManager));
        assert_eq!(UserRole::HeadOffice.approver(), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&UserRole::RegionalManager).unwrap();
        assert_eq!(json, "\"RM\"");
        let role: UserRole = serde_json::from_str("\"R\"").unwrap();
        assert_eq!(role, UserRole::Resident);
    }
}
