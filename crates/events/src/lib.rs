// In crates/events/src/lib.rs

use chrono::{DateTime, Utc};
use core_types::{Fill, OrderIntent, Signal, Symbol};
use rust_decimal::Decimal;
use serde::Serialize;

/// The outcome of one evaluation cycle, without the row array.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub symbol: Symbol,
    pub completed_at: DateTime<Utc>,
    pub bars: usize,
    /// The signal on the last closed bar.
    pub signal: Signal,
    pub last_price: Decimal,
    pub intents: usize,
    pub issues: Vec<String>,
}

/// An order the gateway refused. It is tried again on the next cycle if
/// the signal still calls for it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRejection {
    pub intent: OrderIntent,
    pub reason: String,
}

/// Raised after repeated failed cycles.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub time: DateTime<Utc>,
    pub consecutive_failures: u32,
    pub message: String,
}

/// Engine → presentation messages.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    CycleCompleted(CycleSummary),
    OrderFilled(Fill),
    OrderRejected(OrderRejection),
    Alert(Alert),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = EngineEvent::Alert(Alert {
            time: DateTime::UNIX_EPOCH,
            consecutive_failures: 5,
            message: "feed down".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Alert");
        assert_eq!(json["payload"]["consecutive_failures"], 5);
    }
}
