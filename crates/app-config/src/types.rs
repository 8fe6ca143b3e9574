// In crates/app-config/src/types.rs

use crate::{Error, Result};
use core_types::{Symbol, Timeframe, TradeDirection};
use risk::SimpleRiskSettings;
use serde::Deserialize;
use std::time::Duration;
use strategies::SuperTrendSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// What to trade and how often to evaluate it.
    pub trading: TradingSettings,
    #[serde(default)]
    pub supertrend: SuperTrendSettings,
    /// Lot size and protective distances.
    pub risk: SimpleRiskSettings,
    /// Settings for the exchange connection.
    pub broker: BrokerSettings,
    /// Paper-trading account used when live trading is disabled.
    #[serde(default)]
    pub simulation: SimulationSettings,
}

impl Settings {
    /// Rejects parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.trading;
        if t.symbol.trim().is_empty() {
            return Err(Error::Invalid("trading.symbol must not be empty".into()));
        }
        // One closed bar with a defined direction needs at least three bars.
        if t.candle_count < 3 {
            return Err(Error::Invalid(format!(
                "trading.candle_count must be >= 3, got {}",
                t.candle_count
            )));
        }
        if t.cadence_secs == 0 || t.call_timeout_secs == 0 {
            return Err(Error::Invalid(
                "trading.cadence_secs and trading.call_timeout_secs must be positive".into(),
            ));
        }
        if t.max_consecutive_failures == 0 {
            return Err(Error::Invalid(
                "trading.max_consecutive_failures must be >= 1".into(),
            ));
        }
        if self.supertrend.period == 0 || self.supertrend.atr_period == Some(0) {
            return Err(Error::Invalid("supertrend periods must be >= 1".into()));
        }
        if self.supertrend.multiplier.is_nan() || self.supertrend.multiplier <= 0.0 {
            return Err(Error::Invalid(format!(
                "supertrend.multiplier must be positive, got {}",
                self.supertrend.multiplier
            )));
        }
        if self.risk.lot_size.is_nan() || self.risk.lot_size <= 0.0 {
            return Err(Error::Invalid(format!(
                "risk.lot_size must be positive, got {}",
                self.risk.lot_size
            )));
        }
        if self.broker.live_trading_enabled
            && (self.broker.api_key.is_empty() || self.broker.secret_key.is_empty())
        {
            return Err(Error::Invalid(
                "broker.api_key and broker.secret_key are required for live trading".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
    /// Print each cycle's rows and the account summary to the console.
    #[serde(default)]
    pub render: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TradingSettings {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// The number of bars requested from the feed each cycle.
    #[serde(default = "default_candle_count")]
    pub candle_count: usize,
    #[serde(default)]
    pub trade_direction: TradeDirection,
    /// Pause between the end of one cycle and the start of the next.
    #[serde(default = "default_cadence_secs")]
    pub cadence_secs: u64,
    /// Upper bound for a single feed or gateway call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Consecutive failed cycles before the operator is alerted.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl TradingSettings {
    pub fn symbol(&self) -> Symbol {
        Symbol(self.symbol.clone())
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct BrokerSettings {
    /// Send real orders. When false, orders go to the paper gateway.
    #[serde(default)]
    pub live_trading_enabled: bool,
    /// The API key for Binance.
    #[serde(default)]
    pub api_key: String,
    /// The secret key for Binance.
    #[serde(default)]
    pub secret_key: String,
    /// The REST API base URL for Binance futures.
    pub rest_base_url: String,
    #[serde(default = "default_call_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SimulationSettings {
    /// The starting cash balance of the paper account.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    /// Units of the instrument per 1.0 lot.
    #[serde(default = "default_contract_size")]
    pub contract_size: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            contract_size: default_contract_size(),
        }
    }
}

/// Helper functions for serde defaults
fn default_candle_count() -> usize { 200 }
fn default_cadence_secs() -> u64 { 1 }
fn default_call_timeout_secs() -> u64 { 10 }
fn default_max_consecutive_failures() -> u32 { 5 }
fn default_initial_balance() -> f64 { 10_000.0 }
fn default_contract_size() -> f64 { 1.0 }
