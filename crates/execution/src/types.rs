// In crates/execution/src/types.rs

use rust_decimal::Decimal;
use serde::Serialize;

/// The account figures shown next to the indicator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccountSnapshot {
    /// Settled balance, realised P&L included.
    pub balance: Decimal,
    /// Floating profit of the open positions.
    pub profit: Decimal,
}

impl AccountSnapshot {
    pub fn equity(&self) -> Decimal {
        self.balance + self.profit
    }
}
