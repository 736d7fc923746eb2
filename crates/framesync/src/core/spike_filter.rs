/// Number of past raw deltas the filter compares against.
pub const FILTER_STEPS: usize = 4;

/// Value every history slot starts with, so nothing gets filtered until
/// `FILTER_STEPS` real samples have been seen.
const PRIMED_DELTA: f32 = 1e8;

/// Smooths out single-frame spikes in the wall clock delta.
///
/// A delta larger than anything in the recent history is clipped and the
/// remainder carried into the next frame, so the sum of outputs tracks the
/// sum of inputs without drift.
#[derive(Debug, Clone)]
pub struct SpikeFilter {
    /// Ring buffer of raw input deltas.
    deltas: [f32; FILTER_STEPS],
    /// Slot the next sample is written to.
    next: usize,
    /// Input time not yet returned.
    deficit: f32,
}

impl SpikeFilter {
    pub fn new() -> Self {
        Self {
            deltas: [PRIMED_DELTA; FILTER_STEPS],
            next: 0,
            deficit: 0.0,
        }
    }

    /// Take one raw frame delta, return the filtered delta.
    pub fn filter(&mut self, delta: f32) -> f32 {
        let max_delta = self.deltas.iter().copied().fold(0.0f32, f32::max);

        self.deltas[self.next] = delta;
        self.next = (self.next + 1) % FILTER_STEPS;

        let adjusted = delta + self.deficit;

        if adjusted <= max_delta {
            self.deficit = 0.0;
            return adjusted;
        }

        // Moderately large: return the recent maximum, keep the rest.
        if adjusted <= 2.0 * max_delta {
            self.deficit = adjusted - max_delta;
            return max_delta;
        }

        // Exceptionally large: half now, half later.
        self.deficit = adjusted * 0.5;
        self.deficit
    }

    /// Time taken in but not yet returned.
    pub fn deficit(&self) -> f32 {
        self.deficit
    }
}

impl Default for SpikeFilter {
    fn default() -> Self {
        Self::new()
    }
}
