//! Block I/O seams between the pipeline and the outside world.
//!
//! The pipeline pulls blocks from a [`CaptureSource`] and pushes results to a
//! [`PlaybackSink`]. Implementations:
//!
//! - [`MemorySource`] / [`MemorySink`]: in-memory signals with scripted stalls
//!   and bounded capacity, for tests and deterministic runs
//! - [`RingCapture`] / [`RingPlayback`]: SPSC ring-buffer endpoints fed by
//!   device callbacks (see `device` module)

use crate::{AudioBlock, Result};
use std::time::Duration;

mod memory;
mod ring;

pub use memory::{MemorySink, MemorySource};
pub use ring::{capture_ring, playback_ring, RingCapture, RingPlayback};

/// Result of asking a source for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The block was filled.
    Ready,
    /// Nothing arrived before the deadline.
    Timeout,
}

/// Result of handing one block to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Accepted,
    /// The sink is full; the block was not taken.
    Backpressure,
}

/// Producer of fixed-length mono blocks at the stream rate.
pub trait CaptureSource {
    /// Fill `block` with the next `block.len()` samples, waiting at most `timeout`.
    ///
    /// Errors are device failures.
    fn next_block(&mut self, block: &mut AudioBlock, timeout: Duration) -> Result<Capture>;
}

/// Consumer of fixed-length mono blocks.
pub trait PlaybackSink {
    /// Hand over one block without blocking.
    ///
    /// Errors are device failures.
    fn submit_block(&mut self, block: &AudioBlock) -> Result<Submit>;

    /// Let queued audio play out. Called once when the pipeline stops.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: CaptureSource + ?Sized> CaptureSource for &mut T {
    fn next_block(&mut self, block: &mut AudioBlock, timeout: Duration) -> Result<Capture> {
        (**self).next_block(block, timeout)
    }
}

impl<T: PlaybackSink + ?Sized> PlaybackSink for &mut T {
    fn submit_block(&mut self, block: &AudioBlock) -> Result<Submit> {
        (**self).submit_block(block)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
