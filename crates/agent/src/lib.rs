//! Role-aware chat agent for the SportzVillage assistant.
//!
//! `SvAgent` wraps a `ChatModel` with the caller's toolset, a role-specific
//! system prompt, supervisor approval for sensitive resident actions and a
//! post-hoc accuracy check on every answer.

mod approval;
mod error;
pub mod prompts;
mod sv_agent;
pub mod validation;

pub use approval::{approval_request, ApprovalHandler, ApprovalRequest, AutoApprove, SUPERVISED_TOOLS};
pub use error::AgentError;
pub use sv_agent::{AgentDeps, SvAgent, UserContext, ITERATION_LIMIT_RESPONSE};
pub use validation::validate_response;
