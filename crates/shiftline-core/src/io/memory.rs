//! In-memory capture and playback.

use super::{Capture, CaptureSource, PlaybackSink, Submit};
use crate::{AudioBlock, Result};
use std::time::Duration;

/// Capture source backed by a pre-recorded signal.
///
/// Calls listed with [`stall_at`](Self::stall_at) time out without consuming
/// audio, simulating a capture device that missed its deadline. Once the
/// signal is exhausted every call times out. A short final block is padded
/// with silence.
#[derive(Debug, Clone)]
pub struct MemorySource {
    signal: Vec<f32>,
    cursor: usize,
    calls: usize,
    stalls: Vec<usize>,
}

impl MemorySource {
    pub fn new(signal: Vec<f32>) -> Self {
        Self {
            signal,
            cursor: 0,
            calls: 0,
            stalls: Vec::new(),
        }
    }

    /// Make the `call`-th request (0-based) time out.
    pub fn stall_at(mut self, call: usize) -> Self {
        self.stalls.push(call);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.signal.len()
    }

    /// Samples not yet delivered.
    pub fn remaining(&self) -> usize {
        self.signal.len().saturating_sub(self.cursor)
    }
}

impl CaptureSource for MemorySource {
    fn next_block(&mut self, block: &mut AudioBlock, _timeout: Duration) -> Result<Capture> {
        let call = self.calls;
        self.calls += 1;

        if self.stalls.contains(&call) || self.is_exhausted() {
            return Ok(Capture::Timeout);
        }

        let available = (self.signal.len() - self.cursor).min(block.len());
        block[..available].copy_from_slice(&self.signal[self.cursor..self.cursor + available]);
        block[available..].fill(0.0);
        self.cursor += available;

        Ok(Capture::Ready)
    }
}

/// Playback sink that records everything it accepts.
///
/// With a capacity, blocks beyond it are refused with [`Submit::Backpressure`]
/// until [`drain`](Self::drain) is called.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    samples: Vec<f32>,
    blocks: usize,
    pending: usize,
    capacity_blocks: Option<usize>,
    flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_blocks(capacity: usize) -> Self {
        Self {
            capacity_blocks: Some(capacity),
            ..Self::default()
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Blocks accepted so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Number of `flush` calls seen.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Mark everything accepted so far as played, freeing capacity.
    pub fn drain(&mut self) {
        self.pending = 0;
    }
}

impl PlaybackSink for MemorySink {
    fn submit_block(&mut self, block: &AudioBlock) -> Result<Submit> {
        if self
            .capacity_blocks
            .is_some_and(|capacity| self.pending >= capacity)
        {
            return Ok(Submit::Backpressure);
        }

        self.samples.extend_from_slice(block);
        self.blocks += 1;
        self.pending += 1;
        Ok(Submit::Accepted)
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        self.pending = 0;
        Ok(())
    }
}
