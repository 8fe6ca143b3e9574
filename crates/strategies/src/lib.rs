// In crates/strategies/src/lib.rs

use core_types::{Bar, IndicatorRow};

pub mod atr;
pub mod error;
pub mod signal;
pub mod supertrend;
pub mod types;

pub use error::{Error, Result};
pub use supertrend::SuperTrend;
pub use types::SuperTrendSettings;

/// The universal interface for an indicator-driven strategy.
///
/// A strategy turns a bar window into one `IndicatorRow` per bar, signal
/// included. Implementations are pure: the same window always yields the
/// same rows, and nothing is carried from one call to the next.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    fn assess(&self, bars: &[Bar]) -> Vec<IndicatorRow>;
}
