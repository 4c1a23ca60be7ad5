//! Supervisor sign-off for actions taken on behalf of residents.

use async_trait::async_trait;
use domain::{User, UserRole};
use llm::ToolCall;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Tools that change shared state or leave the system.
pub const SUPERVISED_TOOLS: [&str; 2] = ["sms_sender_tool", "prop_update_tool"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalRequest {
    pub action: String,
    pub requires_role: UserRole,
    pub user_id: String,
    pub arguments: Value,
}

/// Decides whether a supervised action may run.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn approve(&self, request: &ApprovalRequest) -> bool;
}

/// Grants every request, leaving a trace in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalHandler for AutoApprove {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        warn!(
            action = %request.action,
            requires_role = %request.requires_role,
            user_id = %request.user_id,
            "[APPROVAL NEEDED] auto-approving"
        );
        true
    }
}

/// The approval `call` needs when made by `user`, if any.
pub fn approval_request(user: &User, call: &ToolCall) -> Option<ApprovalRequest> {
    let approver = user.role.approver()?;
    if !SUPERVISED_TOOLS.contains(&call.name.as_str()) {
        return None;
    }
    Some(ApprovalRequest {
        action: call.name.clone(),
        requires_role: approver,
        user_id: user.user_id.clone(),
        arguments: call.arguments.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(role: UserRole) -> User {
        User {
            user_id: "U1".into(),
            password: String::new(),
            role,
            name: "Test".into(),
            school_id: Some("SCH001".into()),
            reports_to: None,
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: json!({}),
        }
    }

    #[test]
    fn test_resident_sensitive_actions_need_dm() {
        let request = approval_request(&user(UserRole::Resident), &call("sms_sender_tool")).unwrap();
        assert_eq!(request.requires_role, UserRole::DeliveryManager);
        assert_eq!(request.action, "sms_sender_tool");

        assert!(approval_request(&user(UserRole::Resident), &call("prop_update_tool")).is_some());
        assert!(approval_request(&user(UserRole::Resident), &call("timetable_tool")).is_none());
    }

    #[test]
    fn test_other_roles_act_freely() {
        for role in [UserRole::DeliveryManager, UserRole::HeadOffice, UserRole::Principal] {
            assert!(approval_request(&user(role), &call("sms_sender_tool")).is_none());
        }
    }

    #[tokio::test]
    async fn test_auto_approve_grants() {
        let request = approval_request(&user(UserRole::Resident), &call("prop_update_tool")).unwrap();
        assert!(AutoApprove.approve(&request).await);
    }
}
