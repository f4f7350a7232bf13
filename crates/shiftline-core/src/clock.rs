//! Monotonic sample clock.

/// Count of samples processed since the stream started.
///
/// Absolute stream time is derived from the count rather than from wall-clock
/// deltas between callbacks, so block-size jitter cannot make it drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleClock {
    position: u64,
    sample_rate: f64,
}

impl SampleClock {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            position: 0,
            sample_rate,
        }
    }

    /// Samples processed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Absolute time in seconds of the sample `offset` samples past the current position.
    #[inline]
    pub fn time_at(&self, offset: usize) -> f64 {
        (self.position + offset as u64) as f64 / self.sample_rate
    }

    /// Absolute time of the next sample to be processed.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.time_at(0)
    }

    #[inline]
    pub fn advance(&mut self, samples: usize) {
        self.position += samples as u64;
    }

    /// Back to zero. Only valid on a full stream restart.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}
