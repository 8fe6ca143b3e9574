// In crates/strategies/src/types.rs

use core_types::Bar;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SuperTrendSettings {
    /// The SuperTrend period. Also the ATR averaging window unless
    /// `atr_period` overrides it.
    #[serde(default = "default_period")]
    pub period: u32,
    /// The band width in ATRs.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Optional ATR averaging window, independent of `period`.
    #[serde(default)]
    pub atr_period: Option<u32>,
}

impl SuperTrendSettings {
    /// The window the ATR engine averages true range over.
    pub fn effective_atr_period(&self) -> u32 {
        self.atr_period.unwrap_or(self.period)
    }
}

impl Default for SuperTrendSettings {
    fn default() -> Self {
        Self {
            period: default_period(),
            multiplier: default_multiplier(),
            atr_period: None,
        }
    }
}

fn default_period() -> u32 {
    10
}

fn default_multiplier() -> f64 {
    3.0
}

/// A bar projected into `f64` for the indicator math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl From<&Bar> for PriceBar {
    fn from(bar: &Bar) -> Self {
        Self {
            high: bar.high.to_f64().unwrap_or_default(),
            low: bar.low.to_f64().unwrap_or_default(),
            close: bar.close.to_f64().unwrap_or_default(),
        }
    }
}

impl ta::High for PriceBar {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for PriceBar {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for PriceBar {
    fn close(&self) -> f64 {
        self.close
    }
}
