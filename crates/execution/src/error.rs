// In crates/execution/src/error.rs

use core_types::PositionId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Position not found: {0}")]
    PositionNotFound(PositionId),

    #[error("API client error: {0}")]
    ApiClientError(#[from] api_client::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
