use crate::api::config::SyncConfig;
use crate::api::types::FrameTiming;
use crate::core::clock::TickClock;
use crate::core::diag::warn_once;
use crate::core::rhythm::Rhythm;
use crate::core::spike_filter::SpikeFilter;
use crate::core::stepper::Stepper;

/// Jitter fix for the canonical stepper. The largest value that never bounces
/// between two outcomes, so a stable rhythm is found as often as possible.
const CANONICAL_JITTER_FIX: f32 = 0.5;

/// Rhythm smoothing only applies once this many windows agree.
const MIN_CONSISTENT_WINDOWS: usize = 4;

/// Reconciles the variable-rate main loop with a fixed simulation timestep.
///
/// Once per frame, decides how much idle time to report, how many fixed steps
/// to run and how far into the next step the simulation is. Wall clock noise
/// is absorbed without drift: whatever is not reported in one frame is carried
/// as a deficit into the next.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    clock: TickClock,
    /// Wall clock time minus reported idle time.
    time_deficit: f32,
    fixed_fps: Option<u32>,
    jitter_fix: f32,
    /// Rate used to prime the canonical stepper on `init`.
    init_rate: u32,
    last_frame_delta: f32,
    rhythm: Rhythm,
    /// Advanced with maximal jitter fix to learn the rhythm.
    canonical: Stepper,
    /// Produces the reported steps.
    stepper: Stepper,
    spike_filter: SpikeFilter,
}

impl Synchronizer {
    pub fn new(config: &SyncConfig) -> Self {
        let mut sync = Self {
            clock: TickClock::default(),
            time_deficit: 0.0,
            fixed_fps: None,
            jitter_fix: 0.0,
            init_rate: config.step_rate(),
            last_frame_delta: 0.0,
            rhythm: Rhythm::new(),
            canonical: Stepper::new(),
            stepper: Stepper::new(),
            spike_filter: SpikeFilter::new(),
        };
        sync.set_jitter_fix(config.physics_jitter_fix);
        sync.set_fixed_fps(config.fixed_fps);
        sync
    }

    /// Start the clock. Clears all timing history and puts the canonical
    /// stepper half a step ahead.
    pub fn init(&mut self, start_ticks_usec: u64) {
        self.clock.reset(start_ticks_usec);
        self.time_deficit = 0.0;
        self.last_frame_delta = 0.0;
        self.rhythm = Rhythm::new();
        self.stepper = Stepper::new();
        self.spike_filter = SpikeFilter::new();

        let rate = self.init_rate;
        let step_size = 1.0 / rate as f32;
        self.canonical = Stepper::new();
        self.canonical
            .advance_unclamped(0.5 / rate as f32, step_size, rate, 0.0, &self.rhythm);

        log::debug!(
            "frame sync started at {}us, {} steps/s, jitter fix {}",
            start_ticks_usec,
            rate,
            self.jitter_fix
        );
    }

    /// Report the wall clock. Must not decrease.
    pub fn set_ticks_usec(&mut self, ticks_usec: u64) {
        self.clock.set_ticks_usec(ticks_usec);
    }

    /// Positive values force every frame to last `1 / fps` seconds; anything
    /// else goes back to the wall clock.
    pub fn set_fixed_fps(&mut self, fps: i32) {
        self.fixed_fps = u32::try_from(fps).ok().filter(|&fps| fps > 0);
    }

    /// Set the jitter fix, in steps. Negative values count as 0.
    pub fn set_jitter_fix(&mut self, jitter_fix: f32) {
        self.jitter_fix = jitter_fix.max(0.0);
    }

    pub fn fixed_fps(&self) -> Option<u32> {
        self.fixed_fps
    }

    pub fn jitter_fix(&self) -> f32 {
        self.jitter_fix
    }

    pub fn time_deficit(&self) -> f32 {
        self.time_deficit
    }

    /// Raw wall clock delta consumed by the latest `advance`.
    pub fn last_frame_delta(&self) -> f32 {
        self.last_frame_delta
    }

    pub fn rhythm(&self) -> &Rhythm {
        &self.rhythm
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    /// Advance one frame using the time elapsed since the previous call.
    /// `step_size` must be `1 / step_rate`.
    pub fn advance(&mut self, step_size: f32, step_rate: u32) -> FrameTiming {
        let delta = self.clock.take_delta();
        self.advance_with_delta(step_size, step_rate, delta)
    }

    /// Advance one frame by an explicit wall clock delta.
    pub fn advance_with_delta(&mut self, step_size: f32, step_rate: u32, delta: f32) -> FrameTiming {
        if delta <= 0.0 {
            warn_once!("frame delta not positive: {}", delta);
        }
        self.last_frame_delta = delta;

        let jitter_fix = self.jitter_fix;
        let delta = match self.fixed_fps {
            Some(fps) => 1.0 / fps as f32,
            None if jitter_fix > 0.0 => self.spike_filter.filter(delta),
            None => delta,
        };

        self.canonical
            .advance_unclamped(delta, step_size, step_rate, CANONICAL_JITTER_FIX, &self.rhythm);
        self.rhythm.update(&self.canonical);

        let min_output_delta = (delta * 0.25).max(1e-6);

        // Pay back what earlier frames held back.
        let delta = delta + self.time_deficit;

        let mut step = self
            .stepper
            .plan(delta, step_size, step_rate, jitter_fix, &self.rhythm);

        // Keep the idle step in line with the typical step count. Culls small
        // but quick variations.
        let band = self.rhythm.average_band();
        if band.consistent_windows >= MIN_CONSISTENT_WINDOWS {
            step.clamp_delta(band.min * step_size, band.max * step_size);
        }

        // Keep the deficit below jitter_fix steps.
        let max_clock_deviation = jitter_fix * step_size;
        step.clamp_delta(delta - max_clock_deviation, delta + max_clock_deviation);

        self.stepper.execute_clamped(&mut step, step_size, min_output_delta);

        // Half a step apart; a zero offset gets the main stepper stuck on
        // rounding thresholds more often.
        self.canonical.sync_from(&self.stepper, step_size, step_size * 0.5);

        self.time_deficit = delta - step.delta;

        FrameTiming {
            idle_step: step.delta,
            steps: step.steps.max(0) as u32,
            interpolation_fraction: self.stepper.time_accum() * step_rate as f32,
        }
    }
}
