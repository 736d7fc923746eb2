use bytemuck::{Pod, Zeroable};

/// What the main loop should do this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    /// Time to advance variable-rate (idle) processing by, in seconds.
    pub idle_step: f32,
    /// Number of fixed simulation steps to run.
    pub steps: u32,
    /// Progress into the next, not yet simulated step, in `[0.0, 1.0]`.
    /// Exactly 1.0 when the accumulator is saturated at a full step.
    pub interpolation_fraction: f32,
}

/// Frame timing laid out for a JS host reading WASM memory.
/// 4 floats = 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TimingRecord {
    pub idle_step: f32,
    pub steps: f32,
    pub interpolation_fraction: f32,
    /// Wall clock time not yet reported through `idle_step`.
    pub time_deficit: f32,
}

impl TimingRecord {
    pub const FLOATS: usize = 4;

    pub fn new(timing: &FrameTiming, time_deficit: f32) -> Self {
        Self {
            idle_step: timing.idle_step,
            steps: timing.steps as f32,
            interpolation_fraction: timing.interpolation_fraction,
            time_deficit,
        }
    }

    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(std::slice::from_ref(self))
    }
}
