//! Domain Errors - invalid business values

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
