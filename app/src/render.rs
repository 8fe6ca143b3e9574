// In app/src/render.rs

//! Console presentation of cycle snapshots and engine events.

use core_types::{Direction, Fill, IndicatorRow, OrderAction, OrderIntent, Position, Signal};
use engine::{CycleSnapshot, SnapshotReceiver};
use events::EngineEvent;
use execution::{AccountSnapshot, Gateway};
use std::fmt::Write;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// How many of the newest rows are printed per cycle.
pub const ROWS_SHOWN: usize = 10;

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Undefined => "-",
    }
}

fn signal_label(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "BUY",
        Signal::Sell => "SELL",
        Signal::None => "",
    }
}

fn format_level(level: Option<rust_decimal::Decimal>) -> String {
    level.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_intent(intent: &OrderIntent) -> String {
    match intent.action {
        OrderAction::Open => format!(
            "Open {:?} {} @ {} SL {} TP {}",
            intent.side,
            intent.volume,
            intent.price,
            format_level(intent.stop_loss),
            format_level(intent.take_profit)
        ),
        OrderAction::Close => format!(
            "Close {:?} {} ({})",
            intent.side,
            intent.volume,
            intent.position.as_ref().map(|p| p.0.as_str()).unwrap_or("?")
        ),
    }
}

fn format_position(position: &Position) -> String {
    format!(
        "{} {:?} {} @ {}",
        position.id, position.side, position.volume, position.open_price
    )
}

pub fn format_fill(fill: &Fill) -> String {
    format!(
        "{:?} {:?} {} {} @ {} at {}",
        fill.action,
        fill.side,
        fill.volume,
        fill.symbol,
        fill.price,
        fill.time.format("%H:%M:%S")
    )
}

pub fn format_account(account: &AccountSnapshot) -> String {
    format!(
        "Balance: {:.2} | Profit: {:.2} | Equity: {:.2}",
        account.balance,
        account.profit,
        account.equity()
    )
}

/// The newest `rows_shown` rows of a snapshot plus its positions, intents
/// and issues. The last row is the forming bar; signals are acted on one
/// row above it.
pub fn format_snapshot(snapshot: &CycleSnapshot, rows_shown: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n--- {} {} | {} | last {} | signal {:?} ---",
        snapshot.symbol,
        snapshot.timeframe,
        snapshot.completed_at.format("%Y-%m-%d %H:%M:%S"),
        snapshot.last_price,
        snapshot.signal
    );
    let _ = writeln!(
        out,
        "{:<17} {:>12} {:>10} {:>12} {:>12} {:>12} {:>5} {:>5}",
        "time", "close", "ATR", "upper", "lower", "SuperTrend", "dir", "sig"
    );

    let start = snapshot.rows.len().saturating_sub(rows_shown);
    for (bar, row) in snapshot.bars.iter().zip(&snapshot.rows).skip(start) {
        let IndicatorRow {
            atr,
            upper_band,
            lower_band,
            super_trend,
            direction,
            signal,
            ..
        } = *row;
        let _ = writeln!(
            out,
            "{:<17} {:>12} {:>10.4} {:>12.4} {:>12.4} {:>12.4} {:>5} {:>5}",
            bar.time.format("%Y-%m-%d %H:%M"),
            bar.close,
            atr,
            upper_band,
            lower_band,
            super_trend,
            direction_label(direction),
            signal_label(signal)
        );
    }

    if snapshot.positions.is_empty() {
        let _ = writeln!(out, "Positions: none");
    }
    for position in &snapshot.positions {
        let _ = writeln!(out, "Position: {}", format_position(position));
    }
    for intent in &snapshot.intents {
        let _ = writeln!(out, "Intent: {}", format_intent(intent));
    }
    for fill in &snapshot.fills {
        let _ = writeln!(out, "Filled: {}", format_fill(fill));
    }
    for issue in &snapshot.issues {
        let _ = writeln!(out, "Issue: {}", issue);
    }
    out
}

/// Prints every new snapshot with the account figures, and order and alert
/// events as they arrive. Runs until both channels close.
pub async fn run(
    mut snapshots: SnapshotReceiver,
    mut events: broadcast::Receiver<EngineEvent>,
    gateway: Arc<dyn Gateway>,
) {
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    print!("{}", format_snapshot(&snapshot, ROWS_SHOWN));
                    match gateway.account().await {
                        Ok(account) => println!("{}", format_account(&account)),
                        Err(e) => tracing::warn!(error = %e, "Failed to fetch account info."),
                    }
                }
            }
            event = events.recv() => match event {
                Ok(EngineEvent::OrderFilled(fill)) => println!(">> Filled: {}", format_fill(&fill)),
                Ok(EngineEvent::OrderRejected(rejection)) => {
                    println!(">> Rejected: {} ({})", format_intent(&rejection.intent), rejection.reason)
                }
                Ok(EngineEvent::Alert(alert)) => println!("!! ALERT: {}", alert.message),
                Ok(EngineEvent::CycleCompleted(_)) => {}
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Renderer fell behind on events."),
                Err(RecvError::Closed) => break,
            },
        }
    }
}
