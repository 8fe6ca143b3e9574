// In crates/risk/src/simple_manager.rs

use crate::types::SimpleRiskSettings;
use crate::{Error, Result, RiskManager};
use core_types::{OrderAction, OrderIntent, Side, Symbol};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;

/// A risk manager with a fixed lot size and fixed-distance SL/TP.
///
/// Levels are `price ∓ stop_loss_points * point_scale` and
/// `price ± take_profit_points * point_scale`, below/above the entry for a
/// long and mirrored for a short.
#[derive(Debug, Clone)]
pub struct SimpleRiskManager {
    lot_size: Decimal,
    stop_distance: Decimal,
    take_distance: Decimal,
}

impl SimpleRiskManager {
    /// Creates a new `SimpleRiskManager`, converting the settings to decimals once.
    pub fn new(settings: &SimpleRiskSettings) -> Result<Self> {
        let lot_size = to_decimal("lot_size", settings.lot_size)?;
        if lot_size <= Decimal::ZERO {
            return Err(Error::InvalidParameters(format!(
                "lot_size must be positive, got {}",
                settings.lot_size
            )));
        }
        if settings.stop_loss_points < 0.0 || settings.take_profit_points < 0.0 {
            return Err(Error::InvalidParameters(
                "stop-loss and take-profit distances cannot be negative".to_string(),
            ));
        }

        let scale = to_decimal("point_scale", settings.point_scale)?;
        Ok(Self {
            lot_size,
            stop_distance: to_decimal("stop_loss_points", settings.stop_loss_points)? * scale,
            take_distance: to_decimal("take_profit_points", settings.take_profit_points)? * scale,
        })
    }

    /// The absolute (stop_loss, take_profit) levels for an entry at `price`.
    pub fn protective_levels(&self, side: Side, price: Decimal) -> (Option<Decimal>, Option<Decimal>) {
        let level = |distance: Decimal, sign: Decimal| {
            (distance > Decimal::ZERO).then(|| price + distance * sign)
        };
        match side {
            Side::Long => (
                level(self.stop_distance, Decimal::NEGATIVE_ONE),
                level(self.take_distance, Decimal::ONE),
            ),
            Side::Short => (
                level(self.stop_distance, Decimal::ONE),
                level(self.take_distance, Decimal::NEGATIVE_ONE),
            ),
        }
    }
}

impl RiskManager for SimpleRiskManager {
    fn name(&self) -> &'static str {
        "SimpleRiskManager"
    }

    fn entry_order(&self, symbol: &Symbol, side: Side, price: Decimal) -> Result<OrderIntent> {
        if price <= Decimal::ZERO {
            return Err(Error::Vetoed {
                reason: format!("entry price {price} is not positive"),
            });
        }

        let (stop_loss, take_profit) = self.protective_levels(side, price);

        // A level at or below zero can never trigger; refuse rather than send it.
        if let Some(level) = stop_loss.into_iter().chain(take_profit).find(|l| *l <= Decimal::ZERO) {
            return Err(Error::Vetoed {
                reason: format!("protective level {level} for entry at {price} is not positive"),
            });
        }

        tracing::debug!(%symbol, ?side, %price, ?stop_loss, ?take_profit, "Priced entry order.");

        Ok(OrderIntent {
            action: OrderAction::Open,
            side,
            symbol: symbol.clone(),
            volume: self.lot_size,
            price,
            stop_loss,
            take_profit,
            position: None,
        })
    }
}

fn to_decimal(name: &str, value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .ok_or_else(|| Error::InvalidParameters(format!("{name} is not a finite number: {value}")))
}
