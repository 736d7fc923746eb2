/// Wall clock sampled by the owning loop.
/// Turns a monotonic microsecond counter into per-frame deltas in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickClock {
    /// Ticks at the end of the previous frame.
    last_usec: u64,
    /// Most recently reported ticks.
    current_usec: u64,
}

impl TickClock {
    pub fn new(start_usec: u64) -> Self {
        Self {
            last_usec: start_usec,
            current_usec: start_usec,
        }
    }

    /// Restart the clock at the given tick count.
    pub fn reset(&mut self, start_usec: u64) {
        self.last_usec = start_usec;
        self.current_usec = start_usec;
    }

    /// Record the current tick count. Does not consume any time.
    pub fn set_ticks_usec(&mut self, ticks_usec: u64) {
        self.current_usec = ticks_usec;
    }

    /// Seconds elapsed since the previous call, then start a new interval.
    /// A counter that runs backwards yields 0.
    pub fn take_delta(&mut self) -> f32 {
        let elapsed = self.current_usec.saturating_sub(self.last_usec);
        self.last_usec = self.current_usec;
        elapsed as f32 / 1_000_000.0
    }

    pub fn current_usec(&self) -> u64 {
        self.current_usec
    }
}
