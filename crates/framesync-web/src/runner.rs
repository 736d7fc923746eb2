use framesync::{FrameTiming, SyncConfig, Synchronizer, TimingRecord, VarianceTracker};

/// Drives a `Synchronizer` from a host main loop.
///
/// The browser side owns the clock and the simulation; each frame it reports
/// the time, calls `tick`, then reads the latest `TimingRecord`.
pub struct SyncRunner {
    sync: Synchronizer,
    config: SyncConfig,
    /// Jitter estimate fed from every tick, for hosts tuning the jitter fix.
    variance: VarianceTracker,
    record: TimingRecord,
    initialized: bool,
}

impl SyncRunner {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            sync: Synchronizer::new(&config),
            variance: VarianceTracker::new(config.variance_steps),
            record: TimingRecord::default(),
            config,
            initialized: false,
        }
    }

    /// Start the clock. Call once after construction, and again to restart.
    pub fn init(&mut self, start_ticks_usec: u64) {
        self.sync.init(start_ticks_usec);
        self.variance = VarianceTracker::new(self.config.variance_steps);
        self.record = TimingRecord::default();
        self.initialized = true;
    }

    pub fn set_ticks_usec(&mut self, ticks_usec: u64) {
        self.sync.set_ticks_usec(ticks_usec);
    }

    pub fn set_fixed_fps(&mut self, fps: i32) {
        self.config.fixed_fps = fps;
        self.sync.set_fixed_fps(fps);
    }

    pub fn set_jitter_fix(&mut self, jitter_fix: f32) {
        self.config.physics_jitter_fix = jitter_fix;
        self.sync.set_jitter_fix(jitter_fix);
    }

    /// Run one frame. Does nothing before `init`.
    pub fn tick(&mut self) -> FrameTiming {
        if !self.initialized {
            return FrameTiming::default();
        }

        let timing = self
            .sync
            .advance(self.config.step_size(), self.config.step_rate());

        self.variance.collect(
            self.sync.last_frame_delta(),
            self.sync.time_deficit(),
            self.config.max_variance,
        );
        self.record = TimingRecord::new(&timing, self.sync.time_deficit());

        timing
    }

    pub fn record(&self) -> &TimingRecord {
        &self.record
    }

    /// Raw pointer to the latest record for direct memory reads.
    pub fn record_ptr(&self) -> *const f32 {
        self.record.as_floats().as_ptr()
    }

    pub fn jitter_variance(&self) -> f32 {
        self.variance.variance()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
