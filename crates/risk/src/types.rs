// In crates/risk/src/types.rs

use serde::{Deserialize, Serialize};

/// Fixed lot sizing with fixed-distance protective levels.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimpleRiskSettings {
    /// The volume of every new position.
    pub lot_size: f64,
    /// Stop-loss distance in points. Zero attaches no stop-loss.
    #[serde(default)]
    pub stop_loss_points: f64,
    /// Take-profit distance in points. Zero attaches no take-profit.
    #[serde(default)]
    pub take_profit_points: f64,
    /// The price value of one point.
    #[serde(default = "default_point_scale")]
    pub point_scale: f64,
}

fn default_point_scale() -> f64 {
    0.01
}
