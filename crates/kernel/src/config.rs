use serde::{Deserialize, Serialize};

/// Simulation tuning. Periods are in world ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks between each one-level drop of a falling actor.
    pub fall_period: u64,
    /// Ticks between checks of whether an open door can close.
    pub door_close_period: u64,
    /// Square rings searched when looking for a free tile.
    pub landing_rings: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fall_period: 1,
            door_close_period: 5,
            landing_rings: 50,
        }
    }
}
