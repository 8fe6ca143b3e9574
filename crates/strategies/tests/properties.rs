//! Property tests for the ATR and SuperTrend engines.

use chrono::{Duration, TimeZone, Utc};
use core_types::{Bar, Direction, Signal};
use proptest::prelude::*;
use rust_decimal::Decimal;
use strategies::{Strategy, SuperTrend, SuperTrendSettings};

/// Builds bars from integer cent prices so the decimal values are exact.
fn bars_from_cents(points: &[(i64, i64, i64)]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    points
        .iter()
        .enumerate()
        .map(|(i, &(close, up, down))| Bar {
            time: start + Duration::minutes(i as i64),
            open: Decimal::new(close, 2),
            high: Decimal::new(close + up, 2),
            low: Decimal::new(close - down, 2),
            close: Decimal::new(close, 2),
            volume: Decimal::ZERO,
        })
        .collect()
}

fn trend(start: i64, step: i64, half_spread: i64, n: usize) -> Vec<Bar> {
    let points: Vec<(i64, i64, i64)> = (0..n as i64)
        .map(|i| (start + i * step, half_spread, half_spread))
        .collect();
    bars_from_cents(&points)
}

fn engine(period: u32, multiplier: f64) -> SuperTrend {
    SuperTrend::new(SuperTrendSettings {
        period,
        multiplier,
        atr_period: None,
    })
    .unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bar() -> impl proptest::strategy::Strategy<Value = (i64, i64, i64)> {
    (10_000i64..1_000_000, 0i64..5_000, 0i64..5_000)
}

proptest! {
    #[test]
    fn true_range_and_atr_are_non_negative(
        points in prop::collection::vec(arb_bar(), 0..120),
        period in 1u32..30,
        multiplier in 0.5f64..5.0,
    ) {
        let rows = engine(period, multiplier).assess(&bars_from_cents(&points));
        prop_assert_eq!(rows.len(), points.len());
        for row in &rows {
            prop_assert!(row.true_range >= 0.0);
            prop_assert!(row.atr >= 0.0);
            prop_assert!(row.upper_band >= row.lower_band);
        }
    }

    #[test]
    fn rising_series_trends_up_and_never_sells(
        start in 1_000i64..100_000,
        step in 1i64..500,
        half_spread in 1i64..300,
        n in 3usize..80,
        period in 1u32..20,
        multiplier in 0.5f64..5.0,
    ) {
        let rows = engine(period, multiplier).assess(&trend(start, step, half_spread, n));
        prop_assert_eq!(rows[0].direction, Direction::Undefined);
        for row in &rows[1..] {
            prop_assert_eq!(row.direction, Direction::Up);
        }
        prop_assert!(rows.iter().all(|r| r.signal != Signal::Sell));
    }

    #[test]
    fn falling_series_settles_down_and_never_buys(
        start in 50_000i64..200_000,
        step in 50i64..500,
        half_spread in 1i64..300,
        period in 1u32..20,
        multiplier in 0.5f64..3.0,
    ) {
        let rows = engine(period, multiplier).assess(&trend(start, -step, half_spread, 60));

        prop_assert!(rows.iter().all(|r| r.signal != Signal::Buy));
        prop_assert_eq!(rows.last().map(|r| r.direction), Some(Direction::Down));

        // Once the line turns down on a falling series it stays down.
        let first_down = rows.iter().position(|r| r.direction == Direction::Down).unwrap();
        for row in &rows[first_down..] {
            prop_assert_eq!(row.direction, Direction::Down);
        }
    }

    #[test]
    fn assess_is_a_pure_function_of_the_window(
        points in prop::collection::vec(arb_bar(), 0..60),
        period in 1u32..15,
        multiplier in 0.5f64..5.0,
    ) {
        let engine = engine(period, multiplier);
        let window = bars_from_cents(&points);
        let first = engine.assess(&window);
        let second = engine.assess(&window);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn signals_only_appear_on_bars_with_a_direction(
        points in prop::collection::vec(arb_bar(), 0..80),
        period in 1u32..15,
    ) {
        let rows = engine(period, 2.0).assess(&bars_from_cents(&points));
        for row in &rows {
            if row.direction == Direction::Undefined {
                prop_assert_eq!(row.signal, Signal::None);
            }
        }
    }
}
