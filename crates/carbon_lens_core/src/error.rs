//! Error type for the core services.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An operation ran before `initialize()` or after `shutdown()`.
    #[error("The tracker is not initialized")]
    NotInitialized,

    /// A store read or write failed; in-memory state was left untouched.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Scan content was rejected before anything was written.
    #[error("Invalid scan: {0}")]
    InvalidScan(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
