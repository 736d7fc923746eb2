use crate::core::diag::{sync_invariant, warn_once};
use crate::core::rhythm::Rhythm;

/// Number of frames back over which accumulated step counts are kept
/// roughly constant. 12 makes 144 Hz displays behave with a 60 Hz step;
/// 85 Hz would need 17.
pub const CONTROL_STEPS: usize = 12;

/// A frame's step decision before it is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedStep {
    /// Time to report to variable-rate consumers.
    pub delta: f32,
    /// Fixed steps to run. May be negative until executed.
    pub steps: i32,
}

impl PlannedStep {
    /// Clamp `delta` into `[min_delta, max_delta]`. `min_delta` wins if the range is empty.
    pub fn clamp_delta(&mut self, min_delta: f32, max_delta: f32) {
        if self.delta < min_delta {
            self.delta = min_delta;
        } else if self.delta > max_delta {
            self.delta = max_delta;
        }
    }
}

/// Advances a fixed-timestep process by variable frame deltas.
#[derive(Debug, Clone)]
pub struct Stepper {
    /// Steps taken over the last `i + 1` frames.
    accumulated: [i32; CONTROL_STEPS],
    /// Simulation time since the last full step.
    time_accum: f32,
}

impl Stepper {
    /// Start with a one-step-per-frame history so early frames look consistent.
    pub fn new() -> Self {
        Self {
            accumulated: std::array::from_fn(|i| i as i32),
            time_accum: 0.0,
        }
    }

    /// Steps taken over the last `window + 1` frames.
    pub fn accumulated_steps(&self, window: usize) -> i32 {
        self.accumulated[window]
    }

    pub fn time_accum(&self) -> f32 {
        self.time_accum
    }

    /// Decide how many steps advancing by `delta` should take.
    ///
    /// Starts from the naive count and nudges it towards what `rhythm` says is
    /// typical, unless that would stray more than `jitter_fix` steps from the
    /// measured time.
    pub fn plan(
        &self,
        delta: f32,
        step_size: f32,
        step_rate: u32,
        jitter_fix: f32,
        rhythm: &Rhythm,
    ) -> PlannedStep {
        sync_invariant!(
            (step_size * step_rate as f32 - 1.0).abs() <= 1e-6,
            "step size {} does not match step rate {}",
            step_size,
            step_rate
        );

        let rate = step_rate as f32;
        let next_time_accum = self.time_accum + delta;
        let mut step = PlannedStep {
            delta,
            steps: (next_time_accum * rate).floor() as i32,
        };

        let mut min_typical = rhythm.typical_steps(0);
        let mut max_typical = min_typical + 1;

        // Narrow the range this frame may take so that every window stays typical.
        for i in 0..CONTROL_STEPS - 1 {
            let steps_left = rhythm.typical_steps(i + 1) - self.accumulated[i];
            if steps_left > max_typical || steps_left + 1 < min_typical {
                // Inconsistent history, nothing to match.
                return step;
            }
            min_typical = min_typical.max(steps_left);
            max_typical = max_typical.min(steps_left + 1);
        }

        if max_typical < 0 {
            warn_once!("max typical step count is negative: {}", max_typical);
        }
        if min_typical < 0 {
            warn_once!("min typical step count is negative: {}", min_typical);
        }

        if step.steps < min_typical {
            let max_possible = (next_time_accum * rate + jitter_fix).floor() as i32;
            step.steps = max_possible.min(min_typical);
        } else if step.steps > max_typical {
            let min_possible = (next_time_accum * rate - jitter_fix).floor() as i32;
            step.steps = min_possible.max(max_typical);
        }

        step
    }

    /// Apply `step`, keeping `time_accum` within `[0, step_size]`.
    ///
    /// Time moved out of the accumulator is moved into `step.delta` and vice
    /// versa, so `delta` reported plus time stepped stays equal. A delta that
    /// ends up below `min_delta` is raised and the difference pushed back into
    /// the accumulator, which may cost extra steps.
    pub fn execute_clamped(&mut self, step: &mut PlannedStep, step_size: f32, min_delta: f32) {
        if step.steps < 0 {
            // Only reachable when the rate or jitter fix changes under us.
            warn_once!("negative step count planned: {}", step.steps);
            step.steps = 0;
        }

        self.time_accum += step.delta - step.steps as f32 * step_size;

        if self.time_accum < 0.0 {
            step.delta -= self.time_accum;
            self.time_accum = 0.0;
        } else if self.time_accum > step_size {
            step.delta -= self.time_accum - step_size;
            self.time_accum = step_size;
        }

        if step.delta < min_delta {
            warn_once!("output delta {} below minimum {}", step.delta, min_delta);

            self.time_accum += min_delta - step.delta;
            step.delta = min_delta;

            if self.time_accum > step_size {
                let extra = (self.time_accum / step_size).floor() as i32;
                self.time_accum -= extra as f32 * step_size;
                step.steps += extra;
            }
        }

        self.record(step.steps);
    }

    /// Apply `step` as is. `time_accum` may leave `[0, step_size]` afterwards.
    pub fn execute_unclamped(&mut self, step: &PlannedStep, step_size: f32) {
        self.time_accum += step.delta - step.steps as f32 * step_size;
        self.record(step.steps);
    }

    /// Plan and execute unclamped in one go.
    pub fn advance_unclamped(
        &mut self,
        delta: f32,
        step_size: f32,
        step_rate: u32,
        jitter_fix: f32,
        rhythm: &Rhythm,
    ) {
        let step = self.plan(delta, step_size, step_rate, jitter_fix, rhythm);
        self.execute_unclamped(&step, step_size);
    }

    /// Move `time_accum` to sit `offset` ahead of `other`'s, modulo `step_size`,
    /// picking the representative closest to where it is now.
    /// Does nothing while `other` is saturated at either end.
    pub fn sync_from(&mut self, other: &Stepper, step_size: f32, offset: f32) {
        if other.time_accum <= 0.0 || other.time_accum >= step_size {
            return;
        }

        let raw = other.time_accum + offset;
        let wraps = ((self.time_accum - raw) / step_size + 0.5).floor();
        let synced = raw + wraps * step_size;

        if (synced - self.time_accum).abs() > 1e-4 * step_size {
            // Expected after a step rate change.
            warn_once!(
                "steppers drifted apart: {} -> {}",
                self.time_accum,
                synced
            );
        }

        self.time_accum = synced;
    }

    fn record(&mut self, steps: i32) {
        for i in (0..CONTROL_STEPS - 1).rev() {
            self.accumulated[i + 1] = self.accumulated[i] + steps;
        }
        self.accumulated[0] = steps;
    }
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 60;
    const STEP: f32 = 1.0 / 60.0;

    #[test]
    fn clamp_delta_bounds() {
        let mut step = PlannedStep { delta: 0.5, steps: 0 };
        step.clamp_delta(0.0, 0.25);
        assert_eq!(step.delta, 0.25);
        step.clamp_delta(0.3, 1.0);
        assert_eq!(step.delta, 0.3);
        step.clamp_delta(0.4, 0.2);
        assert_eq!(step.delta, 0.4);
    }

    #[test]
    fn new_seeds_one_step_per_frame() {
        let stepper = Stepper::new();
        for i in 0..CONTROL_STEPS {
            assert_eq!(stepper.accumulated_steps(i), i as i32);
        }
        assert_eq!(stepper.time_accum(), 0.0);
    }

    #[test]
    fn record_shifts_windows() {
        let mut stepper = Stepper::new();
        let step = PlannedStep { delta: 2.0 * STEP, steps: 2 };
        stepper.execute_unclamped(&step, STEP);
        assert_eq!(stepper.accumulated_steps(0), 2);
        for i in 1..CONTROL_STEPS {
            assert_eq!(stepper.accumulated_steps(i), (i - 1) as i32 + 2);
        }
    }

    #[test]
    fn plan_with_inconsistent_history_is_naive() {
        // A fresh rhythm says "zero steps" while the seeded history says one per frame.
        let stepper = Stepper::new();
        let rhythm = Rhythm::new();
        let step = stepper.plan(3.5 * STEP, STEP, RATE, 0.5, &rhythm);
        assert_eq!(step.steps, 3);
        assert_eq!(step.delta, 3.5 * STEP);
    }

    /// Feed whole-step frames so `time_accum` stays at zero.
    fn with_history(steps: &[i32]) -> (Stepper, Rhythm) {
        let mut stepper = Stepper::new();
        let mut rhythm = Rhythm::new();
        for &n in steps {
            stepper.execute_unclamped(&PlannedStep { delta: n as f32 * STEP, steps: n }, STEP);
            rhythm.update(&stepper);
        }
        (stepper, rhythm)
    }

    fn ones_then(last: i32) -> Vec<i32> {
        let mut steps = vec![1; CONTROL_STEPS * 2];
        steps.push(last);
        steps
    }

    #[test]
    fn plan_raises_short_frame_to_rhythm() {
        let (stepper, rhythm) = with_history(&ones_then(0));
        let step = stepper.plan(0.9 * STEP, STEP, RATE, 0.2, &rhythm);
        assert_eq!(step.steps, 1);
    }

    #[test]
    fn plan_lowers_long_frame_to_rhythm() {
        let (stepper, rhythm) = with_history(&ones_then(2));
        let step = stepper.plan(2.1 * STEP, STEP, RATE, 0.2, &rhythm);
        assert_eq!(step.steps, 1);
    }

    #[test]
    fn plan_lets_large_deviation_through() {
        let (stepper, rhythm) = with_history(&ones_then(0));
        let stall = stepper.plan(0.2 * STEP, STEP, RATE, 0.2, &rhythm);
        assert_eq!(stall.steps, 0);

        let (stepper, rhythm) = with_history(&ones_then(2));
        let burst = stepper.plan(4.5 * STEP, STEP, RATE, 0.2, &rhythm);
        assert_eq!(burst.steps, 4);
    }

    #[test]
    fn plan_without_jitter_fix_is_naive() {
        let (stepper, rhythm) = with_history(&ones_then(0));
        let step = stepper.plan(0.9 * STEP, STEP, RATE, 0.0, &rhythm);
        assert_eq!(step.steps, 0);
    }

    #[test]
    #[cfg(any(debug_assertions, feature = "strict-invariants"))]
    #[should_panic(expected = "does not match step rate")]
    fn plan_rejects_mismatched_rate() {
        let stepper = Stepper::new();
        stepper.plan(STEP, STEP, 30, 0.5, &Rhythm::new());
    }

    #[test]
    fn execute_clamped_keeps_accum_in_range() {
        let mut stepper = Stepper::new();

        let mut over = PlannedStep { delta: 1.5 * STEP, steps: 0 };
        stepper.execute_clamped(&mut over, STEP, 0.0);
        assert_eq!(stepper.time_accum(), STEP);
        assert!((over.delta - STEP).abs() < 1e-7);

        let mut under = PlannedStep { delta: 0.1 * STEP, steps: 2 };
        stepper.execute_clamped(&mut under, STEP, 0.0);
        assert_eq!(stepper.time_accum(), 0.0);
        assert!((under.delta - STEP).abs() < 1e-7);
    }

    #[test]
    fn execute_clamped_saturates_at_one_full_step() {
        let mut stepper = Stepper::new();
        let mut step = PlannedStep { delta: 0.05, steps: 1 };
        stepper.execute_clamped(&mut step, STEP, 1e-6);
        assert_eq!(step.steps, 1);
        assert_eq!(stepper.time_accum(), STEP);
        assert_eq!(stepper.time_accum() * RATE as f32, 1.0);
        assert!((step.delta - 2.0 * STEP).abs() < 1e-7);
    }

    #[test]
    fn execute_clamped_clears_negative_steps() {
        let mut stepper = Stepper::new();
        let mut step = PlannedStep { delta: 0.5 * STEP, steps: -3 };
        stepper.execute_clamped(&mut step, STEP, 0.0);
        assert_eq!(step.steps, 0);
        assert_eq!(stepper.accumulated_steps(0), 0);
        assert!((stepper.time_accum() - 0.5 * STEP).abs() < 1e-7);
    }

    #[test]
    fn execute_clamped_enforces_min_delta() {
        let mut stepper = Stepper::new();
        let min_delta = 0.3 * STEP;
        let mut step = PlannedStep { delta: 0.1 * STEP, steps: 0 };
        stepper.execute_clamped(&mut step, STEP, min_delta);

        assert_eq!(step.delta, min_delta);
        assert_eq!(step.steps, 0);
        // The raised delta is backed by accumulated time.
        assert!((stepper.time_accum() - min_delta).abs() < 1e-7);
    }

    #[test]
    fn execute_clamped_min_delta_can_add_steps() {
        let mut stepper = Stepper::new();
        let mut prime = PlannedStep { delta: 0.9 * STEP, steps: 0 };
        stepper.execute_clamped(&mut prime, STEP, 0.0);

        // Overflow trims the delta to 0.1 steps, the floor puts it back up.
        let min_delta = 0.5 * STEP;
        let mut step = PlannedStep { delta: 0.5 * STEP, steps: 0 };
        stepper.execute_clamped(&mut step, STEP, min_delta);

        assert_eq!(step.delta, min_delta);
        assert_eq!(step.steps, 1);
        assert_eq!(stepper.accumulated_steps(0), 1);
        assert!((stepper.time_accum() - 0.4 * STEP).abs() < 1e-6);

        let reported = prime.delta + step.delta;
        let stepped = step.steps as f32 * STEP + stepper.time_accum();
        assert!((reported - stepped).abs() < 1e-6);
    }

    #[test]
    fn execute_unclamped_allows_drift() {
        let mut stepper = Stepper::new();
        stepper.execute_unclamped(&PlannedStep { delta: 0.5 * STEP, steps: 3 }, STEP);
        assert!(stepper.time_accum() < 0.0);
        stepper.execute_unclamped(&PlannedStep { delta: 5.0 * STEP, steps: 0 }, STEP);
        assert!(stepper.time_accum() > STEP);
    }

    #[test]
    fn sync_from_wraps_to_nearest() {
        let mut main = Stepper::new();
        let mut prime = PlannedStep { delta: 0.2 * STEP, steps: 0 };
        main.execute_clamped(&mut prime, STEP, 0.0);

        let mut canonical = Stepper::new();
        canonical.execute_unclamped(&PlannedStep { delta: 1.6 * STEP, steps: 0 }, STEP);

        canonical.sync_from(&main, STEP, 0.5 * STEP);
        assert!((canonical.time_accum() - 1.7 * STEP).abs() < 1e-6);

        canonical.execute_unclamped(&PlannedStep { delta: 0.0, steps: 2 }, STEP);
        canonical.sync_from(&main, STEP, 0.5 * STEP);
        assert!((canonical.time_accum() + 0.3 * STEP).abs() < 1e-6);
    }

    #[test]
    fn sync_from_skips_saturated_source() {
        let main = Stepper::new();
        let mut canonical = Stepper::new();
        canonical.execute_unclamped(&PlannedStep { delta: 0.3 * STEP, steps: 0 }, STEP);
        canonical.sync_from(&main, STEP, 0.5 * STEP);
        assert!((canonical.time_accum() - 0.3 * STEP).abs() < 1e-7);
    }
}
