use chrono::NaiveDate;
use model::cadence::CadenceError;
use thiserror::Error;

/// Error types for the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Error from the database operations.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed input, rejected before any write.
    #[error("validation error: {0}")]
    Validation(String),

    /// A second occurrence for the same `(bill, due_date)` natural key.
    /// Benign duplicates from idempotent retries are absorbed before this
    /// is ever returned.
    #[error("duplicate occurrence for bill {bill_id} due {due_date}")]
    UniquenessViolation { bill_id: i32, due_date: NaiveDate },

    /// An operation that is not legal in the occurrence's current state,
    /// e.g. ignoring a paid occurrence. Never retried.
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// A running balance or debt accumulator that no longer matches its
    /// inputs. Logged and surfaced, never silently repaired.
    #[error("inconsistent balance state: {0}")]
    InconsistentBalance(String),

    /// A referenced row does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<CadenceError> for EngineError {
    fn from(error: CadenceError) -> Self {
        EngineError::Validation(error.to_string())
    }
}

/// Type alias for Result with EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;
