//! Pipeline health counters.

use crate::AtomicFloat;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub blocks_processed: u64,
    pub underruns: u64,
    pub dropped_blocks: u64,
    /// Blocks whose transform took longer than the block duration.
    pub late_blocks: u64,
    /// Processing time of the last block relative to its budget (1.0 = 100%).
    pub current_load: f32,
    pub peak_load: f32,
    pub average_load: f32,
}

/// Counters written by the audio thread, readable from any thread.
#[derive(Debug)]
pub struct PipelineMetrics {
    blocks_processed: AtomicU64,
    underruns: AtomicU64,
    dropped_blocks: AtomicU64,
    late_blocks: AtomicU64,
    current_load: AtomicFloat,
    peak_load: AtomicFloat,
    average_load: AtomicFloat,
    load_samples: AtomicU32,
    block_duration: Duration,
}

impl PipelineMetrics {
    pub fn new(block_duration: Duration) -> Self {
        Self {
            blocks_processed: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
            dropped_blocks: AtomicU64::new(0),
            late_blocks: AtomicU64::new(0),
            current_load: AtomicFloat::new(0.0),
            peak_load: AtomicFloat::new(0.0),
            average_load: AtomicFloat::new(0.0),
            load_samples: AtomicU32::new(0),
            block_duration,
        }
    }

    /// Record one transformed block and how long the transform took.
    ///
    /// Returns `true` if the block missed its deadline.
    pub fn record_block(&self, elapsed: Duration) -> bool {
        self.blocks_processed.fetch_add(1, Ordering::Relaxed);

        let budget = self.block_duration.as_secs_f64();
        let load = if budget > 0.0 {
            (elapsed.as_secs_f64() / budget) as f32
        } else {
            0.0
        };

        self.current_load.set(load);
        self.peak_load.raise(load);

        // Exponential moving average, settling after ~100 blocks
        let count = self.load_samples.fetch_add(1, Ordering::Relaxed);
        let alpha = 1.0 / (count.min(100) + 1) as f32;
        let avg = self.average_load.get();
        self.average_load.set(avg * (1.0 - alpha) + load * alpha);

        let late = elapsed > self.block_duration;
        if late {
            self.late_blocks.fetch_add(1, Ordering::Relaxed);
        }
        late
    }

    pub fn record_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed.load(Ordering::Relaxed)
    }

    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.load(Ordering::Relaxed)
    }

    pub fn block_duration(&self) -> Duration {
        self.block_duration
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_processed: self.blocks_processed.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            dropped_blocks: self.dropped_blocks.load(Ordering::Relaxed),
            late_blocks: self.late_blocks.load(Ordering::Relaxed),
            current_load: self.current_load.get(),
            peak_load: self.peak_load.get(),
            average_load: self.average_load.get(),
        }
    }

    pub fn reset(&self) {
        self.blocks_processed.store(0, Ordering::Relaxed);
        self.underruns.store(0, Ordering::Relaxed);
        self.dropped_blocks.store(0, Ordering::Relaxed);
        self.late_blocks.store(0, Ordering::Relaxed);
        self.current_load.set(0.0);
        self.peak_load.set(0.0);
        self.average_load.set(0.0);
        self.load_samples.store(0, Ordering::Relaxed);
    }
}
