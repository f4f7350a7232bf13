//! Fixed-length mono audio block.

use std::ops::{Deref, DerefMut};

/// One real-time quantum of mono audio.
///
/// The length is fixed at creation (the configured block size). Blocks are
/// allocated once per stream and rewritten every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    samples: Vec<f32>,
}

impl AudioBlock {
    /// Zero-filled block of `len` samples.
    pub fn silent(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn fill_silence(&mut self) {
        self.samples.fill(0.0);
    }

    /// Copy another block of the same length into this one.
    ///
    /// # Panics
    /// If the lengths differ.
    pub fn copy_from(&mut self, other: &AudioBlock) {
        self.samples.copy_from_slice(&other.samples);
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl Deref for AudioBlock {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.samples
    }
}

impl DerefMut for AudioBlock {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }
}
