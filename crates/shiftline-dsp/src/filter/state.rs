use super::coefficients::section_count;
use super::{Biquad, DelayLine, FilterCoefficients};
use crate::{Error, Result};

/// Causal filter with history carried across blocks.
///
/// Cascaded coefficients run section by section in transposed direct form
/// II, each section with its own two-sample state; anything else runs in
/// direct form I over the input and output delay lines. Filtering a signal
/// block by block gives the same output as filtering it in one pass, for any
/// split.
#[derive(Debug, Clone)]
pub struct FilterState {
    order: usize,
    inputs: DelayLine,
    outputs: DelayLine,
    sections: Vec<[f64; 2]>,
}

impl FilterState {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            inputs: DelayLine::new(order),
            outputs: DelayLine::new(order),
            sections: vec![[0.0; 2]; section_count(order)],
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Filter `input` into `output` (same length).
    pub fn apply(
        &mut self,
        coeffs: &FilterCoefficients,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<()> {
        self.check_order(coeffs)?;
        if input.len() != output.len() {
            return Err(Error::InvalidParameter(format!(
                "input length {} does not match output length {}",
                input.len(),
                output.len()
            )));
        }

        if coeffs.is_cascade() {
            for (x, y) in input.iter().zip(output.iter_mut()) {
                *y = self.step_cascade(coeffs.sections(), *x as f64) as f32;
            }
        } else {
            let feedforward = coeffs.is_feedforward();
            for (x, y) in input.iter().zip(output.iter_mut()) {
                *y = self.step(coeffs, feedforward, *x as f64) as f32;
            }
        }
        Ok(())
    }

    /// Filter `block` in place.
    pub fn process_in_place(
        &mut self,
        coeffs: &FilterCoefficients,
        block: &mut [f32],
    ) -> Result<()> {
        self.check_order(coeffs)?;

        if coeffs.is_cascade() {
            for sample in block.iter_mut() {
                *sample = self.step_cascade(coeffs.sections(), *sample as f64) as f32;
            }
        } else {
            let feedforward = coeffs.is_feedforward();
            for sample in block.iter_mut() {
                *sample = self.step(coeffs, feedforward, *sample as f64) as f32;
            }
        }
        Ok(())
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.inputs.reset();
        self.outputs.reset();
        self.sections.fill([0.0; 2]);
    }

    #[inline]
    fn step_cascade(&mut self, sections: &[Biquad], x: f64) -> f64 {
        let mut x = x;
        for (c, z) in sections.iter().zip(self.sections.iter_mut()) {
            let y = c.b0 * x + z[0];
            z[0] = c.b1 * x + z[1] - c.a1 * y;
            z[1] = c.b2 * x - c.a2 * y;
            x = y;
        }
        x
    }

    #[inline]
    fn step(&mut self, coeffs: &FilterCoefficients, feedforward: bool, x: f64) -> f64 {
        let b = coeffs.b();
        let mut acc = b[0] * x;
        for (j, &bj) in b.iter().enumerate().skip(1) {
            acc += bj * self.inputs.get(j);
        }

        if !feedforward {
            let a = coeffs.a();
            for (k, &ak) in a.iter().enumerate().skip(1) {
                acc -= ak * self.outputs.get(k);
            }
        }

        self.inputs.push(x);
        self.outputs.push(acc);
        acc
    }

    fn check_order(&self, coeffs: &FilterCoefficients) -> Result<()> {
        if coeffs.order() != self.order {
            return Err(Error::InvalidParameter(format!(
                "coefficient order {} does not match filter order {}",
                coeffs.order(),
                self.order
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design_lowpass;
    use approx::assert_relative_eq;
    use shiftline_core::FilterFamily;

    #[test]
    fn test_passthrough_copies_input() {
        let coeffs = FilterCoefficients::passthrough(FilterFamily::Fir, 3);
        let mut filter = FilterState::new(3);
        let input = [0.1, -0.2, 0.3, -0.4, 0.5];
        let mut output = [0.0; 5];
        filter.apply(&coeffs, &input, &mut output).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_fir_impulse_response_is_taps() {
        let coeffs = design_lowpass(2_000.0, 16_000.0, 8, FilterFamily::Fir).unwrap();
        let mut filter = FilterState::new(8);
        let mut block = [0.0f32; 12];
        block[0] = 1.0;
        filter.process_in_place(&coeffs, &mut block).unwrap();

        for (i, &tap) in coeffs.b().iter().enumerate() {
            assert_relative_eq!(block[i], tap as f32, epsilon = 1e-7);
        }
        assert!(block[9..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_history_spans_blocks() {
        // y[n] = x[n] + 0.5 y[n-1]
        let coeffs =
            FilterCoefficients::from_parts(FilterFamily::Iir, vec![1.0, 0.0], vec![1.0, -0.5])
                .unwrap();
        let mut filter = FilterState::new(1);

        let mut first = [1.0f32, 0.0];
        let mut second = [0.0f32, 0.0];
        filter.process_in_place(&coeffs, &mut first).unwrap();
        filter.process_in_place(&coeffs, &mut second).unwrap();
        assert_eq!(first, [1.0, 0.5]);
        assert_eq!(second, [0.25, 0.125]);

        filter.reset();
        let mut after_reset = [0.0f32; 2];
        filter.process_in_place(&coeffs, &mut after_reset).unwrap();
        assert_eq!(after_reset, [0.0, 0.0]);
    }

    #[test]
    fn test_rejects_mismatches() {
        let coeffs = FilterCoefficients::passthrough(FilterFamily::Fir, 2);
        let mut filter = FilterState::new(3);
        let mut block = [0.0f32; 4];
        assert!(filter.process_in_place(&coeffs, &mut block).is_err());

        let mut filter = FilterState::new(2);
        let mut short = [0.0f32; 3];
        assert!(filter.apply(&coeffs, &block, &mut short).is_err());
    }

    /// Step through a Butterworth; every sample must stay finite and the
    /// output must settle on the input level.
    fn assert_step_settles(cutoff_hz: f64, fs: f64, order: usize, seconds: f64) {
        let coeffs = design_lowpass(cutoff_hz, fs, order, FilterFamily::Iir).unwrap();
        let mut filter = FilterState::new(order);
        let mut block = vec![1.0f32; 44_100];
        let blocks = (seconds * fs / block.len() as f64).ceil() as usize;

        for _ in 0..blocks {
            block.fill(1.0);
            filter.process_in_place(&coeffs, &mut block).unwrap();
            assert!(
                block.iter().all(|s| s.is_finite() && s.abs() < 2.0),
                "order {order} at {cutoff_hz} Hz diverged"
            );
        }
        assert_relative_eq!(block[block.len() - 1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_max_order_stable_at_min_cutoff() {
        // Slowest pole pair decays with a ~1.2 s time constant at 1 Hz
        assert_step_settles(
            shiftline_core::MIN_CUTOFF_HZ as f64,
            44_100.0,
            shiftline_core::MAX_IIR_ORDER,
            20.0,
        );
    }

    #[test]
    fn test_max_order_stable_at_one_percent_of_nyquist() {
        assert_step_settles(220.5, 44_100.0, shiftline_core::MAX_IIR_ORDER, 1.0);
    }

    #[test]
    fn test_low_cutoffs_stay_finite() {
        for (order, cutoff_hz) in [(6, 5.0), (6, 20.0), (8, 100.0), (10, 100.0), (12, 200.0)] {
            assert_step_settles(cutoff_hz, 44_100.0, order, 4.0);
        }
    }

    #[test]
    fn test_iir_settles_to_dc() {
        let coeffs = design_lowpass(500.0, 8_000.0, 4, FilterFamily::Iir).unwrap();
        let mut filter = FilterState::new(4);
        let mut block = vec![1.0f32; 2_000];
        filter.process_in_place(&coeffs, &mut block).unwrap();
        assert_relative_eq!(block[1_999], 1.0, epsilon = 1e-4);
    }
}
