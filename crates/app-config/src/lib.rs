// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, BrokerSettings, Settings, SimulationSettings, TradingSettings};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    load_settings_from("config")
}

/// Same as [`load_settings`], reading the TOML files from `dir`.
pub fn load_settings_from(dir: &str) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name(&format!("{}/base", dir)))
        // 2. Load the environment-specific configuration file.
        .add_source(File::with_name(&format!("{}/{}", dir, environment)).required(false))
        // 3. Load settings from environment variables (e.g., `APP__TRADING__SYMBOL=...`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    finish(settings)
}

/// Parses settings from a single TOML document. Used by tests and tooling.
pub fn parse_settings(toml: &str) -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;
    finish(settings)
}

fn finish(config: Config) -> Result<Settings> {
    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Timeframe, TradeDirection};

    const MINIMAL: &str = r#"
        [app]
        environment = "test"
        log_level = "debug"

        [trading]
        symbol = "BTCUSDT"
        timeframe = "M15"

        [risk]
        lot_size = 0.01

        [broker]
        rest_base_url = "https://testnet.binancefuture.com"
    "#;

    #[test]
    fn defaults_fill_in_the_parameter_bundle() {
        let settings = parse_settings(MINIMAL).unwrap();
        assert_eq!(settings.trading.timeframe, Timeframe::M15);
        assert_eq!(settings.trading.candle_count, 200);
        assert_eq!(settings.trading.trade_direction, TradeDirection::Both);
        assert_eq!(settings.trading.cadence_secs, 1);
        assert_eq!(settings.supertrend.period, 10);
        assert_eq!(settings.supertrend.multiplier, 3.0);
        assert_eq!(settings.supertrend.atr_period, None);
        assert_eq!(settings.risk.point_scale, 0.01);
        assert!(!settings.broker.live_trading_enabled);
        assert!(!settings.app.render);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let toml = format!(
            "{MINIMAL}\n[supertrend]\nperiod = 7\nmultiplier = 2.5\natr_period = 14\n"
        )
        .replace("timeframe = \"M15\"", "timeframe = \"H4\"\ntrade_direction = \"sell_only\"");
        let settings = parse_settings(&toml).unwrap();
        assert_eq!(settings.trading.timeframe, Timeframe::H4);
        assert_eq!(settings.trading.trade_direction, TradeDirection::SellOnly);
        assert_eq!(settings.supertrend.period, 7);
        assert_eq!(settings.supertrend.effective_atr_period(), 14);
    }

    #[test]
    fn too_few_candles_is_rejected() {
        let toml = MINIMAL.replace("timeframe = \"M15\"", "timeframe = \"M15\"\ncandle_count = 2");
        assert!(matches!(parse_settings(&toml), Err(Error::Invalid(_))));
    }

    #[test]
    fn live_trading_requires_credentials() {
        let toml = MINIMAL.replace(
            "[broker]",
            "[broker]\nlive_trading_enabled = true",
        );
        assert!(matches!(parse_settings(&toml), Err(Error::Invalid(_))));
    }

    #[test]
    fn unknown_timeframe_fails_to_load() {
        let toml = MINIMAL.replace("\"M15\"", "\"W1\"");
        assert!(matches!(parse_settings(&toml), Err(Error::LoadError(_))));
    }
}
