// In crates/engine/src/lib.rs

pub mod cycle;
pub mod error;
pub mod failure;
pub mod reconciler;
pub mod task;

pub use cycle::{CycleDriver, CycleParams, CycleSnapshot};
pub use error::{Error, Result};
pub use task::{SnapshotReceiver, TradingTask};
