// In crates/engine/src/error.rs

use core_types::Symbol;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The feed failed, timed out, or returned no bars. Aborts the cycle.
    #[error("Market feed unavailable: {0}")]
    FeedUnavailable(String),

    /// Too few bars to have a closed bar to act on. Aborts the cycle.
    #[error("Not enough bars to evaluate: need {needed}, got {got}")]
    IndicatorUnderflow { needed: usize, got: usize },

    /// The broker could not report the open positions. Aborts the cycle.
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The broker refused an order. Retried implicitly on the next cycle.
    #[error("Gateway rejected the order: {reason}")]
    GatewayRejected { reason: String },

    /// Positions are open on both sides of one symbol.
    #[error("Positions open on both sides of {0}")]
    ConcurrentPositionConflict(Symbol),

    #[error("A position is already open on {0}")]
    PositionAlreadyOpen(Symbol),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::Error),

    #[error("Risk error: {0}")]
    Risk(#[from] risk::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
