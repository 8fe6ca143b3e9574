// In crates/risk/src/lib.rs

use core_types::{OrderIntent, Side, Symbol};
use rust_decimal::Decimal;

pub mod error;
pub mod simple_manager;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use simple_manager::SimpleRiskManager;
pub use types::SimpleRiskSettings;

/// The interface that turns an entry decision into a priced order.
///
/// A `RiskManager` decides the volume of a new position and the absolute
/// stop-loss and take-profit levels attached to it.
pub trait RiskManager: Sync {
    /// The name of the risk management strategy.
    fn name(&self) -> &'static str;

    /// Builds the `Open` intent for a new position.
    ///
    /// # Arguments
    ///
    /// * `symbol`: The instrument to trade.
    /// * `side`: The side of the new position.
    /// * `price`: The current market price the entry is expected to fill at.
    ///
    /// # Returns
    ///
    /// * `Ok(OrderIntent)`: The entry order, with protective levels attached.
    /// * `Err(Error::Vetoed)`: If the levels would be nonsensical for this price.
    fn entry_order(&self, symbol: &Symbol, side: Side, price: Decimal) -> Result<OrderIntent>;
}
