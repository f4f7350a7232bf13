use std::f64::consts::TAU;

/// Accumulated shift phase in radians, kept in `[0, 2π)`.
///
/// The value stored after a block is the phase of the first sample of the
/// next block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseState {
    radians: f64,
}

impl PhaseState {
    pub fn new(radians: f64) -> Self {
        let mut state = Self::default();
        state.store(radians);
        state
    }

    #[inline]
    pub fn radians(&self) -> f64 {
        self.radians
    }

    /// Wrap `radians` into `[0, 2π)` and keep it.
    #[inline]
    pub fn store(&mut self, radians: f64) {
        let wrapped = radians.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        self.radians = if wrapped >= TAU { 0.0 } else { wrapped };
    }

    pub fn reset(&mut self) {
        self.radians = 0.0;
    }
}
