use common::{DatabaseError, LlmError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("User {0} not found")]
    UnknownUser(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}
