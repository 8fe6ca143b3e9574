// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown timeframe: {0}")]
    UnknownTimeframe(String),

    #[error("Unknown trade direction: {0}")]
    UnknownTradeDirection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
