// In crates/strategies/src/atr.rs

//! Average True Range over a simple rolling mean.
//!
//! True Range: `max(high-low, |high-prev_close|, |low-prev_close|)`, and just
//! `high-low` on the first bar. The average is a plain mean over the last
//! `period` true ranges; before `period` samples exist it averages whatever
//! has been seen so far. This is not Wilder's smoothing.

use crate::types::PriceBar;
use crate::{Error, Result};
use ta::indicators::{SimpleMovingAverage as Sma, TrueRange};
use ta::Next;

/// True range and its rolling average for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AtrPoint {
    pub true_range: f64,
    pub atr: f64,
}

#[derive(Debug, Clone)]
pub struct AtrEngine {
    true_range: TrueRange,
    average: Sma,
}

impl AtrEngine {
    pub fn new(period: usize) -> Result<Self> {
        let average = Sma::new(period)
            .map_err(|_| Error::InvalidParameter(format!("ATR period must be >= 1, got {period}")))?;
        Ok(Self {
            true_range: TrueRange::new(),
            average,
        })
    }

    /// Computes one `AtrPoint` per input bar. Never fails; an empty input
    /// yields an empty output.
    pub fn compute(&self, bars: &[PriceBar]) -> Vec<AtrPoint> {
        // Fresh indicator state per call keeps the engine a pure function.
        let mut true_range = self.true_range.clone();
        let mut average = self.average.clone();

        bars.iter()
            .map(|bar| {
                let tr = true_range.next(bar);
                AtrPoint {
                    true_range: tr,
                    atr: average.next(tr),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar { high, low, close }
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn true_range_uses_previous_close() {
        let engine = AtrEngine::new(3).unwrap();
        let points = engine.compute(&[
            bar(105.0, 95.0, 102.0),  // TR = 10
            bar(108.0, 100.0, 106.0), // TR = max(8, 6, 2) = 8
            bar(107.0, 98.0, 99.0),   // TR = max(9, 1, 8) = 9
            bar(115.0, 108.0, 112.0), // gap up: TR = max(7, 16, 9) = 16
        ]);
        assert_approx(points[0].true_range, 10.0);
        assert_approx(points[1].true_range, 8.0);
        assert_approx(points[2].true_range, 9.0);
        assert_approx(points[3].true_range, 16.0);
    }

    #[test]
    fn average_warms_up_over_a_shrinking_window() {
        let engine = AtrEngine::new(3).unwrap();
        let points = engine.compute(&[
            bar(105.0, 95.0, 102.0),
            bar(108.0, 100.0, 106.0),
            bar(107.0, 98.0, 99.0),
            bar(103.0, 97.0, 101.0), // TR = 6
            bar(106.0, 100.0, 105.0), // TR = 6
        ]);
        assert_approx(points[0].atr, 10.0);
        assert_approx(points[1].atr, 9.0);
        assert_approx(points[2].atr, 9.0);
        // Full window from here on: mean(8, 9, 6) and mean(9, 6, 6).
        assert_approx(points[3].atr, 23.0 / 3.0);
        assert_approx(points[4].atr, 7.0);
    }

    #[test]
    fn degenerate_inputs_are_defined() {
        let engine = AtrEngine::new(14).unwrap();
        assert!(engine.compute(&[]).is_empty());

        let single = engine.compute(&[bar(11.0, 9.0, 10.0)]);
        assert_eq!(single.len(), 1);
        assert_approx(single[0].true_range, 2.0);
        assert_approx(single[0].atr, 2.0);
    }

    #[test]
    fn engine_is_reusable_across_calls() {
        let engine = AtrEngine::new(2).unwrap();
        let bars = [bar(11.0, 9.0, 10.0), bar(13.0, 10.0, 12.0)];
        assert_eq!(engine.compute(&bars), engine.compute(&bars));
    }

    #[test]
    fn zero_period_is_rejected() {
        assert!(matches!(AtrEngine::new(0), Err(Error::InvalidParameter(_))));
    }
}
