// In crates/strategies/src/supertrend.rs

//! SuperTrend: a single trailing line that follows price from below in an
//! uptrend and from above in a downtrend.
//!
//! For bar `i >= 1`, with `prev = super_trend[i-1]`:
//! - `close[i-1] > prev`: direction Up, `super_trend[i] = max(lower_band[i], prev)`
//! - otherwise: direction Down, `super_trend[i] = min(upper_band[i], prev)`
//!
//! Seed: bar 0 has direction `Undefined` and `super_trend[0] = lower_band[0]`,
//! so the first comparison at bar 1 is against a concrete value.

use crate::atr::AtrEngine;
use crate::signal;
use crate::types::{PriceBar, SuperTrendSettings};
use crate::{Error, Result, Strategy};
use core_types::{Bar, Direction, IndicatorRow};

/// The SuperTrend engine. Stateless between `assess` calls: every call
/// recomputes the whole window.
#[derive(Debug, Clone)]
pub struct SuperTrend {
    settings: SuperTrendSettings,
    atr: AtrEngine,
}

impl SuperTrend {
    /// Creates a new `SuperTrend` instance from its settings.
    pub fn new(settings: SuperTrendSettings) -> Result<Self> {
        if settings.period < 1 {
            return Err(Error::InvalidParameter(
                "SuperTrend period must be >= 1".to_string(),
            ));
        }
        if !settings.multiplier.is_finite() || settings.multiplier <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "SuperTrend multiplier must be positive, got {}",
                settings.multiplier
            )));
        }

        Ok(Self {
            atr: AtrEngine::new(settings.effective_atr_period() as usize)?,
            settings,
        })
    }

    /// Computes the indicator columns for an already projected series,
    /// signals included.
    pub fn compute(&self, bars: &[PriceBar]) -> Vec<IndicatorRow> {
        let atr = self.atr.compute(bars);
        let multiplier = self.settings.multiplier;

        let mut rows: Vec<IndicatorRow> = bars
            .iter()
            .zip(&atr)
            .map(|(bar, point)| {
                let hl2 = (bar.high + bar.low) / 2.0;
                IndicatorRow {
                    true_range: point.true_range,
                    atr: point.atr,
                    hl2,
                    upper_band: hl2 + multiplier * point.atr,
                    lower_band: hl2 - multiplier * point.atr,
                    ..IndicatorRow::default()
                }
            })
            .collect();

        if let Some(seed) = rows.first_mut() {
            seed.super_trend = seed.lower_band;
            seed.direction = Direction::Undefined;
        }

        for i in 1..rows.len() {
            let prev_close = bars[i - 1].close;
            let prev = rows[i - 1].super_trend;
            let row = &mut rows[i];

            if prev_close > prev {
                row.direction = Direction::Up;
                row.super_trend = row.lower_band.max(prev);
            } else {
                row.direction = Direction::Down;
                row.super_trend = row.upper_band.min(prev);
            }
        }

        signal::annotate(&mut rows, bars);
        rows
    }
}

impl Strategy for SuperTrend {
    fn name(&self) -> &'static str {
        "SuperTrend"
    }

    fn assess(&self, bars: &[Bar]) -> Vec<IndicatorRow> {
        let projected: Vec<PriceBar> = bars.iter().map(PriceBar::from).collect();
        self.compute(&projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Signal;

    fn settings(period: u32, multiplier: f64) -> SuperTrendSettings {
        SuperTrendSettings {
            period,
            multiplier,
            atr_period: None,
        }
    }

    fn bars_from_closes(closes: &[f64], spread: f64) -> Vec<PriceBar> {
        closes
            .iter()
            .map(|&close| PriceBar {
                high: close + spread,
                low: close - spread,
                close,
            })
            .collect()
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn seed_bar_uses_lower_band_and_undefined_direction() {
        let st = SuperTrend::new(settings(2, 1.0)).unwrap();
        let rows = st.compute(&bars_from_closes(&[100.0, 102.0], 1.0));
        assert_eq!(rows[0].direction, Direction::Undefined);
        assert_approx(rows[0].super_trend, rows[0].lower_band);
        assert_eq!(rows[0].signal, Signal::None);
        assert_eq!(rows[1].direction, Direction::Up);
    }

    #[test]
    fn bands_straddle_hl2_by_multiplier_atrs() {
        let st = SuperTrend::new(settings(3, 2.5)).unwrap();
        let rows = st.compute(&bars_from_closes(&[10.0, 11.0, 9.0, 12.0], 0.5));
        for row in &rows {
            assert_approx(row.upper_band - row.hl2, 2.5 * row.atr);
            assert_approx(row.hl2 - row.lower_band, 2.5 * row.atr);
        }
    }

    #[test]
    fn up_line_never_decreases_while_trend_holds() {
        let st = SuperTrend::new(settings(3, 2.0)).unwrap();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() + i as f64).collect();
        let rows = st.compute(&bars_from_closes(&closes, 1.5));
        for pair in rows.windows(2) {
            if pair[0].direction == Direction::Up && pair[1].direction == Direction::Up {
                assert!(pair[1].super_trend >= pair[0].super_trend);
            }
        }
    }

    #[test]
    fn empty_and_single_bar_windows() {
        let st = SuperTrend::new(settings(10, 3.0)).unwrap();
        assert!(st.compute(&[]).is_empty());
        let rows = st.compute(&bars_from_closes(&[50.0], 1.0));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].direction, Direction::Undefined);
    }

    #[test]
    fn atr_period_override_changes_band_width_only() {
        let closes = [100.0, 103.0, 99.0, 104.0, 101.0, 106.0];
        let bars = bars_from_closes(&closes, 1.0);
        let plain = SuperTrend::new(settings(2, 1.0)).unwrap().compute(&bars);
        let overridden = SuperTrend::new(SuperTrendSettings {
            atr_period: Some(4),
            ..settings(2, 1.0)
        })
        .unwrap()
        .compute(&bars);

        assert_approx(plain[0].atr, overridden[0].atr);
        assert!((plain[5].atr - overridden[5].atr).abs() > 1e-9);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(SuperTrend::new(settings(0, 3.0)).is_err());
        assert!(SuperTrend::new(settings(10, 0.0)).is_err());
        assert!(SuperTrend::new(settings(10, f64::NAN)).is_err());
        assert!(
            SuperTrend::new(SuperTrendSettings {
                atr_period: Some(0),
                ..settings(10, 3.0)
            })
            .is_err()
        );
    }
}
