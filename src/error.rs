use crate::gateway::GatewayError;
use thiserror::Error;

/// Errors surfaced by the progress/grading core. Each variant maps to a
/// stable wire code so handlers and tests agree on one taxonomy.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// The submission row already carries a score; it is immutable.
    #[error("submission is already graded")]
    AlreadyLocked,

    #[error("{0}")]
    Validation(String),

    #[error("grading gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Conflict(String),

    #[error("db error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "not_found",
            CoreError::AlreadyLocked => "already_locked",
            CoreError::Validation(_) => "validation",
            CoreError::Gateway(_) => "gateway_error",
            CoreError::Conflict(_) => "conflict",
            CoreError::Db(_) => "db_error",
        }
    }

    /// Gateway failures never commit partial state, so the caller may
    /// simply resubmit.
    pub fn retryable(&self) -> bool {
        matches!(self, CoreError::Gateway(_))
    }

    pub fn not_found(what: &str) -> Self {
        CoreError::NotFound(what.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }
}
