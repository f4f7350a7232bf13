//! Ring-buffer endpoints between device callbacks and the pipeline thread.
//!
//! The device callback owns the other half of each SPSC ring. Device errors
//! reported by the backend raise a shared fault flag that the pipeline side
//! turns into [`Error::Device`](crate::Error::Device) on its next call.

use super::{Capture, CaptureSource, PlaybackSink, Submit};
use crate::{AtomicFlag, AudioBlock, Error, Result};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Create a capture ring holding `capacity` samples.
///
/// The producer goes to the input device callback.
pub fn capture_ring(capacity: usize) -> (HeapProd<f32>, RingCapture) {
    let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
    (producer, RingCapture::new(consumer))
}

/// Create a playback ring holding `capacity` samples.
///
/// The consumer goes to the output device callback.
pub fn playback_ring(capacity: usize) -> (RingPlayback, HeapCons<f32>) {
    let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
    (RingPlayback::new(producer), consumer)
}

/// Pipeline-side reader of captured samples.
pub struct RingCapture {
    consumer: HeapCons<f32>,
    fault: Arc<AtomicFlag>,
}

impl RingCapture {
    pub fn new(consumer: HeapCons<f32>) -> Self {
        Self {
            consumer,
            fault: Arc::new(AtomicFlag::default()),
        }
    }

    /// Flag the device error callback raises.
    pub fn fault_flag(&self) -> Arc<AtomicFlag> {
        Arc::clone(&self.fault)
    }

    /// Samples waiting in the ring.
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }
}

impl CaptureSource for RingCapture {
    fn next_block(&mut self, block: &mut AudioBlock, timeout: Duration) -> Result<Capture> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.fault.take() {
                return Err(Error::Device("capture stream failed".into()));
            }

            if self.consumer.occupied_len() >= block.len() {
                let read = self.consumer.pop_slice(block);
                debug_assert_eq!(read, block.len());
                return Ok(Capture::Ready);
            }

            if Instant::now() >= deadline {
                return Ok(Capture::Timeout);
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Pipeline-side writer of processed samples.
pub struct RingPlayback {
    producer: HeapProd<f32>,
    fault: Arc<AtomicFlag>,
    drain_timeout: Duration,
}

impl RingPlayback {
    pub fn new(producer: HeapProd<f32>) -> Self {
        Self {
            producer,
            fault: Arc::new(AtomicFlag::default()),
            drain_timeout: Duration::from_secs(1),
        }
    }

    /// Upper bound on how long [`flush`](PlaybackSink::flush) waits.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn fault_flag(&self) -> Arc<AtomicFlag> {
        Arc::clone(&self.fault)
    }

    /// Samples queued but not yet consumed by the device.
    pub fn queued(&self) -> usize {
        self.producer.occupied_len()
    }
}

impl PlaybackSink for RingPlayback {
    fn submit_block(&mut self, block: &AudioBlock) -> Result<Submit> {
        if self.fault.take() {
            return Err(Error::Device("playback stream failed".into()));
        }

        if self.producer.vacant_len() < block.len() {
            return Ok(Submit::Backpressure);
        }

        self.producer.push_slice(block);
        Ok(Submit::Accepted)
    }

    fn flush(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.drain_timeout;
        while !self.producer.is_empty() {
            if self.fault.take() {
                return Err(Error::Device("playback stream failed during drain".into()));
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    queued = self.producer.occupied_len(),
                    "playback drain timed out"
                );
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_waits_for_full_block() {
        let (mut producer, mut capture) = capture_ring(64);
        let mut block = AudioBlock::silent(8);

        producer.push_slice(&[0.5; 4]);
        let result = capture
            .next_block(&mut block, Duration::from_millis(5))
            .unwrap();
        assert_eq!(result, Capture::Timeout);
        assert_eq!(capture.available(), 4);

        producer.push_slice(&[0.25; 4]);
        let result = capture
            .next_block(&mut block, Duration::from_millis(5))
            .unwrap();
        assert_eq!(result, Capture::Ready);
        assert_eq!(&block[..4], &[0.5; 4]);
        assert_eq!(&block[4..], &[0.25; 4]);
    }

    #[test]
    fn test_capture_fault_surfaces_as_error() {
        let (_producer, mut capture) = capture_ring(16);
        capture.fault_flag().set(true);

        let mut block = AudioBlock::silent(4);
        let err = capture
            .next_block(&mut block, Duration::from_millis(1))
            .unwrap_err();
        assert!(err.is_device_error());
    }

    #[test]
    fn test_playback_backpressure() {
        let (mut playback, mut consumer) = playback_ring(8);
        let block = AudioBlock::from_samples(vec![1.0; 6]);

        assert_eq!(playback.submit_block(&block).unwrap(), Submit::Accepted);
        assert_eq!(playback.submit_block(&block).unwrap(), Submit::Backpressure);

        let mut out = [0.0; 6];
        assert_eq!(consumer.pop_slice(&mut out), 6);
        assert_eq!(playback.submit_block(&block).unwrap(), Submit::Accepted);
    }

    #[test]
    fn test_flush_gives_up_after_timeout() {
        let (playback, _consumer) = playback_ring(8);
        let mut playback = playback.with_drain_timeout(Duration::from_millis(5));
        playback
            .submit_block(&AudioBlock::from_samples(vec![0.1; 4]))
            .unwrap();

        playback.flush().unwrap();
        assert_eq!(playback.queued(), 4);
    }
}
