//! Whole-bin spectrum rotation.

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::sync::Arc;

/// Shifts a block by rolling its spectrum a whole number of bins.
///
/// The shift is quantized to `fs / N` and each block is treated on its own,
/// so there is no continuity between blocks. Negative-frequency bins wrap
/// around like the positive ones.
pub(crate) struct FftBinRotator {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    spectrum: Vec<Complex64>,
    rolled: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl FftBinRotator {
    pub(crate) fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            forward,
            inverse,
            spectrum: vec![Complex64::new(0.0, 0.0); len],
            rolled: vec![Complex64::new(0.0, 0.0); len],
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.spectrum.len()
    }

    /// Bin offset for a shift, truncated toward zero.
    pub(crate) fn bins_for(&self, shift_hz: f64, sample_rate: f64) -> i64 {
        (shift_hz * self.len() as f64 / sample_rate).trunc() as i64
    }

    /// `input` and `output` must both be `len()` long.
    pub(crate) fn process(&mut self, shift_hz: f64, sample_rate: f64, input: &[f32], output: &mut [f32]) {
        let len = self.len();
        let bins = self.bins_for(shift_hz, sample_rate);

        for (bin, &x) in self.spectrum.iter_mut().zip(input) {
            *bin = Complex64::new(x as f64, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        for (i, &value) in self.spectrum.iter().enumerate() {
            let target = (i as i64 + bins).rem_euclid(len as i64) as usize;
            self.rolled[target] = value;
        }
        self.inverse
            .process_with_scratch(&mut self.rolled, &mut self.scratch);

        let scale = 1.0 / len as f64;
        for (y, value) in output.iter_mut().zip(&self.rolled) {
            *y = (value.re * scale) as f32;
        }
    }
}
