pub mod api;
pub mod core;

// Re-export key types at crate root for convenience
pub use crate::api::config::SyncConfig;
pub use crate::api::types::{FrameTiming, TimingRecord};
pub use crate::core::clock::TickClock;
pub use crate::core::rhythm::{Rhythm, RhythmEntry, StepBand};
pub use crate::core::spike_filter::SpikeFilter;
pub use crate::core::stepper::{PlannedStep, Stepper, CONTROL_STEPS};
pub use crate::core::sync::Synchronizer;
pub use crate::core::variance::VarianceTracker;
