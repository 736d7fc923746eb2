use crate::core::stepper::{Stepper, CONTROL_STEPS};

/// Typical step count for one window length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RhythmEntry {
    /// Steps accumulated over the window are this or this plus one.
    pub typical_steps: i32,
}

/// Range of plausible average steps per frame, see [`Rhythm::average_band`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBand {
    pub min: f32,
    pub max: f32,
    /// Number of window lengths that agree on `[min, max]`.
    pub consistent_windows: usize,
}

/// Learned expectation of how many steps each window length takes.
#[derive(Debug, Clone, Default)]
pub struct Rhythm {
    entries: [RhythmEntry; CONTROL_STEPS],
}

impl Rhythm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typical steps over the last `window + 1` frames.
    pub fn typical_steps(&self, window: usize) -> i32 {
        self.entries[window].typical_steps
    }

    /// Pull each typical count just far enough that the stepper's actual count
    /// is the typical value or one more.
    pub fn update(&mut self, stepper: &Stepper) {
        for (i, entry) in self.entries.iter_mut().enumerate().rev() {
            let actual = stepper.accumulated_steps(i);
            if actual < entry.typical_steps {
                entry.typical_steps = actual;
            } else if actual - 1 > entry.typical_steps {
                entry.typical_steps = actual - 1;
            }
        }
    }

    /// Best guess for the average steps per frame.
    ///
    /// Intersects the per-frame ranges implied by each window length, starting
    /// with the shortest, and stops before a window would empty the range.
    pub fn average_band(&self) -> StepBand {
        let mut min = self.entries[0].typical_steps as f32;
        let mut max = min + 1.0;

        for i in 1..CONTROL_STEPS {
            let typical = self.entries[i].typical_steps as f32;
            let frames = (i + 1) as f32;

            let current_min = typical / frames;
            if current_min > max {
                return StepBand { min, max, consistent_windows: i };
            } else if current_min > min {
                min = current_min;
            }

            let current_max = (typical + 1.0) / frames;
            if current_max < min {
                return StepBand { min, max, consistent_windows: i };
            } else if current_max < max {
                max = current_max;
            }
        }

        StepBand { min, max, consistent_windows: CONTROL_STEPS }
    }
}
