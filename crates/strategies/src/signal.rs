// In crates/strategies/src/signal.rs

//! Signal extraction from SuperTrend rows.
//!
//! Signals are level-based: a bar whose close sits on the wrong side of the
//! line for its direction emits the signal every time the window is
//! recomputed. De-duplication is the reconciler's job.

use crate::types::PriceBar;
use core_types::{Direction, IndicatorRow, Signal};

/// The signal for one bar given its row and close.
pub fn extract(row: &IndicatorRow, close: f64) -> Signal {
    match row.direction {
        Direction::Up if close < row.super_trend => Signal::Sell,
        Direction::Down if close > row.super_trend => Signal::Buy,
        _ => Signal::None,
    }
}

/// Fills in `signal` on every row from the matching bar's close.
pub fn annotate(rows: &mut [IndicatorRow], bars: &[PriceBar]) {
    for (row, bar) in rows.iter_mut().zip(bars) {
        row.signal = extract(row, bar.close);
    }
}

/// The signal on the last fully closed bar, i.e. the second to last row.
///
/// The newest bar is still forming and is never acted on. Returns `None`
/// when the window holds fewer than two bars.
pub fn last_closed(rows: &[IndicatorRow]) -> Option<Signal> {
    rows.len().checked_sub(2).map(|i| rows[i].signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(direction: Direction, super_trend: f64) -> IndicatorRow {
        IndicatorRow {
            direction,
            super_trend,
            ..IndicatorRow::default()
        }
    }

    #[test]
    fn close_below_uptrend_line_sells() {
        assert_eq!(extract(&row(Direction::Up, 100.0), 99.0), Signal::Sell);
        assert_eq!(extract(&row(Direction::Up, 100.0), 101.0), Signal::None);
        assert_eq!(extract(&row(Direction::Up, 100.0), 100.0), Signal::None);
    }

    #[test]
    fn close_above_downtrend_line_buys() {
        assert_eq!(extract(&row(Direction::Down, 100.0), 101.0), Signal::Buy);
        assert_eq!(extract(&row(Direction::Down, 100.0), 99.0), Signal::None);
        assert_eq!(extract(&row(Direction::Down, 100.0), 100.0), Signal::None);
    }

    #[test]
    fn undefined_direction_never_signals() {
        assert_eq!(extract(&row(Direction::Undefined, 100.0), 50.0), Signal::None);
        assert_eq!(extract(&row(Direction::Undefined, 100.0), 150.0), Signal::None);
    }

    #[test]
    fn last_closed_skips_the_forming_bar() {
        let mut rows = vec![row(Direction::Undefined, 0.0); 3];
        rows[1].signal = Signal::Buy;
        rows[2].signal = Signal::Sell;
        assert_eq!(last_closed(&rows), Some(Signal::Buy));
        assert_eq!(last_closed(&rows[..1]), None);
        assert_eq!(last_closed(&[]), None);
    }
}
