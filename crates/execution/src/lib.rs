// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::{Bar, Fill, OrderIntent, Position, Symbol, Timeframe};
use rust_decimal::Decimal;

pub mod error;
pub mod feed;
pub mod live;
pub mod simulated;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use live::LiveGateway;
pub use simulated::SimulatedGateway;
pub use types::AccountSnapshot;

/// The source of price history for one instrument.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Returns up to `count` bars, oldest first. The last bar is still forming.
    async fn fetch_bars(&self, symbol: &Symbol, timeframe: Timeframe, count: usize)
        -> Result<Vec<Bar>>;
}

/// The universal interface to a broker.
///
/// A `Gateway` takes `OrderIntent`s and submits them to a target, which could
/// be a live exchange or the in-process paper account. Positions are owned by
/// the broker: the engine only reads them back through
/// [`Gateway::list_open_positions`].
#[async_trait]
pub trait Gateway: Send + Sync {
    /// The name of the gateway (e.g., "LiveGateway", "SimulatedGateway").
    fn name(&self) -> &'static str;

    /// Opens a new position described by an `Open` intent.
    async fn open_position(&self, intent: &OrderIntent) -> Result<Fill>;

    /// Closes the position referenced by a `Close` intent, in full.
    async fn close_position(&self, intent: &OrderIntent) -> Result<Fill>;

    /// The positions currently open on `symbol`.
    async fn list_open_positions(&self, symbol: &Symbol) -> Result<Vec<Position>>;

    /// Balance and floating profit of the trading account.
    async fn account(&self) -> Result<types::AccountSnapshot>;

    /// Informs the gateway of the latest traded price. Brokers that price
    /// positions themselves ignore it.
    fn mark_price(&self, _symbol: &Symbol, _price: Decimal) {}
}
