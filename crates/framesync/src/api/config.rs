use serde::{Deserialize, Serialize};

use crate::core::variance::DEFAULT_VARIANCE_STEPS;

/// Timing configuration supplied by the host.
/// Can be loaded from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Fixed simulation steps per second (default: 60).
    pub physics_ticks_per_second: u32,
    /// Allowed deviation from measured time, in steps, before the learned
    /// rhythm is overridden (default: 0.5). 0 disables spike filtering and
    /// rhythm smoothing.
    pub physics_jitter_fix: f32,
    /// Positive values force every frame to last `1 / fixed_fps` seconds
    /// (default: -1, disabled).
    pub fixed_fps: i32,
    /// Frames the jitter estimate looks back over (default: 12).
    pub variance_steps: usize,
    /// Upper bound on the jitter estimate, in seconds (default: 0.1).
    pub max_variance: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            physics_ticks_per_second: 60,
            physics_jitter_fix: 0.5,
            fixed_fps: -1,
            variance_steps: DEFAULT_VARIANCE_STEPS,
            max_variance: 0.1,
        }
    }
}

impl SyncConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Steps per second, never zero.
    pub fn step_rate(&self) -> u32 {
        self.physics_ticks_per_second.max(1)
    }

    /// Duration of one fixed step in seconds.
    pub fn step_size(&self) -> f32 {
        1.0 / self.step_rate() as f32
    }
}
