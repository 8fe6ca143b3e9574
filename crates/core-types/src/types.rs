// In crates/core-types/src/types.rs

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tradable instrument, e.g. "BTCUSDT" or "XAUUSD".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol(s.to_string())
    }
}

/// The direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

/// The sampling period of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// The kline interval string used by the exchange REST API.
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            _ => Err(Error::UnknownTimeframe(s.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One OHLC price sample. Immutable once received from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The open time of the bar.
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The trend state of the SuperTrend line at a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// The seed bar, before the recursion has a reference value.
    #[default]
    Undefined,
    Up,
    Down,
}

/// A discrete trade trigger derived from one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Signal {
    #[default]
    None,
    Buy,
    Sell,
}

/// The indicator values derived 1:1 from a bar.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub true_range: f64,
    pub atr: f64,
    pub hl2: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    /// The trailing SuperTrend price level.
    pub super_trend: f64,
    pub direction: Direction,
    pub signal: Signal,
}

/// Which entries the reconciler is allowed to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    #[default]
    Both,
    #[serde(alias = "only_buy")]
    BuyOnly,
    #[serde(alias = "only_sell")]
    SellOnly,
}

impl TradeDirection {
    pub fn allows(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (TradeDirection::Both, _)
                | (TradeDirection::BuyOnly, Side::Long)
                | (TradeDirection::SellOnly, Side::Short)
        )
    }
}

impl FromStr for TradeDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "both" => Ok(TradeDirection::Both),
            "buy_only" | "only_buy" => Ok(TradeDirection::BuyOnly),
            "sell_only" | "only_sell" => Ok(TradeDirection::SellOnly),
            _ => Err(Error::UnknownTradeDirection(s.to_string())),
        }
    }
}

/// The broker's reference for an open position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(pub String);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open position as reported by the broker. Read-only for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: Symbol,
    pub side: Side,
    pub volume: Decimal,
    pub open_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAction {
    Open,
    Close,
}

/// An order request handed to the execution gateway.
///
/// This is a plain value: whether the gateway accepts or rejects it never
/// feeds back into indicator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub action: OrderAction,
    /// For `Open`, the side of the new position. For `Close`, the side of the
    /// position being closed.
    pub side: Side,
    pub symbol: Symbol,
    pub volume: Decimal,
    pub price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// The position to close. Always `None` for `Open`.
    pub position: Option<PositionId>,
}

impl OrderIntent {
    /// Builds the intent that closes `position` in full at `price`.
    pub fn close(position: &Position, price: Decimal) -> Self {
        Self {
            action: OrderAction::Close,
            side: position.side,
            symbol: position.symbol.clone(),
            volume: position.volume,
            price,
            stop_loss: None,
            take_profit: None,
            position: Some(position.id.clone()),
        }
    }
}

/// The result of an accepted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: Symbol,
    pub action: OrderAction,
    pub side: Side,
    pub price: Decimal,
    pub volume: Decimal,
    pub position: Option<PositionId>,
    pub time: DateTime<Utc>,
}
