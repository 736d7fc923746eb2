/// Default number of frames the jitter estimate looks back over.
pub const DEFAULT_VARIANCE_STEPS: usize = 12;

/// Lower bound on the raw estimate.
const MIN_RAW_VARIANCE: f32 = 1e-6;

/// Running estimate of frame timing jitter.
///
/// Rises immediately when frame durations or deficits spread out and decays
/// slowly afterwards, never below what the recent deficits still show. Not
/// used by the synchronizer itself; hosts can read it to tune the jitter fix.
#[derive(Debug, Clone)]
pub struct VarianceTracker {
    raw_steps: Vec<f32>,
    deficits: Vec<f32>,
    cursor: usize,
    variance: f32,
}

impl VarianceTracker {
    /// Track the last `window` frames. A zero window is treated as one.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            raw_steps: vec![0.0; window],
            deficits: vec![0.0; window],
            cursor: 0,
            variance: 0.0,
        }
    }

    pub fn window(&self) -> usize {
        self.raw_steps.len()
    }

    /// Current estimate, in seconds.
    pub fn variance(&self) -> f32 {
        self.variance
    }

    /// Record one frame's raw delta and deficit, then refresh the estimate,
    /// capped at `max_variance`.
    pub fn collect(&mut self, step: f32, deficit: f32, max_variance: f32) {
        self.raw_steps[self.cursor] = step;
        self.deficits[self.cursor] = deficit;
        self.cursor = (self.cursor + 1) % self.raw_steps.len();

        self.variance = self.estimate().min(max_variance);
    }

    fn estimate(&self) -> f32 {
        let (min_step, max_step) = min_max(&self.raw_steps);
        let (min_deficit, max_deficit) = min_max(&self.deficits);

        // Both spreads overstate the jitter: frame durations vary by about twice
        // the end time jitter, and deficits already include corrections. That
        // is fine for an upper bound.
        let raw_variance = (max_step - min_step)
            .max(max_deficit - min_deficit)
            .max(MIN_RAW_VARIANCE);

        let n = self.raw_steps.len() as f32;
        let decayed = self.variance * n / (n + 0.2);
        let reduced = self.variance - min_step / 13.0;
        let observed = max_deficit.max(-min_deficit);
        let floor = observed.min(decayed.max(reduced));

        raw_variance.max(floor)
    }
}

impl Default for VarianceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_VARIANCE_STEPS)
    }
}

fn min_max(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .fold((values[0], values[0]), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
