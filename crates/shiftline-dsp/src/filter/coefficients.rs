use crate::{Error, Result};
use rustfft::num_complex::Complex64;
use shiftline_core::FilterFamily;
use std::f64::consts::{FRAC_1_SQRT_2, TAU};

/// One second-order section, `(b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
///
/// A first-order section keeps `b2 == a2 == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    pub const IDENTITY: Biquad = Biquad {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn response(&self, omega: f64) -> Complex64 {
        let num = eval_poly(&[self.b0, self.b1, self.b2], omega);
        let den = eval_poly(&[1.0, self.a1, self.a2], omega);
        num / den
    }

    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// Transfer function `H(z) = B(z) / A(z)` of one lowpass.
///
/// `b` and `a` both hold `order + 1` values with `a[0] == 1`. FIR
/// coefficients keep an all-zero feedback tail.
///
/// Butterworth designs are also held as a cascade of second-order
/// sections, and that cascade is what [`FilterState`](super::FilterState)
/// runs: the expanded polynomial of a high-order lowpass near DC has poles
/// too close to the unit circle to survive direct-form rounding. `b`/`a`
/// stay available as the equivalent transfer function.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    family: FilterFamily,
    b: Vec<f64>,
    a: Vec<f64>,
    sections: Vec<Biquad>,
    cascade: bool,
}

impl FilterCoefficients {
    /// Identity filter of the given order (`b = a = [1, 0, ..]`).
    pub fn passthrough(family: FilterFamily, order: usize) -> Self {
        let mut coeffs = Self {
            family,
            b: vec![0.0; order + 1],
            a: vec![0.0; order + 1],
            sections: vec![Biquad::IDENTITY; section_count(order)],
            cascade: false,
        };
        coeffs.set_passthrough();
        coeffs
    }

    /// Build from explicit polynomials, normalizing so `a[0] == 1`.
    ///
    /// The result runs in direct form.
    pub fn from_parts(family: FilterFamily, b: Vec<f64>, a: Vec<f64>) -> Result<Self> {
        if b.is_empty() || b.len() != a.len() {
            return Err(Error::InvalidParameter(format!(
                "coefficient lengths must match and be non-empty (b: {}, a: {})",
                b.len(),
                a.len()
            )));
        }
        let a0 = a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(Error::InvalidParameter(format!("a[0] must be non-zero, got {a0}")));
        }

        let order = b.len() - 1;
        Ok(Self {
            family,
            b: b.into_iter().map(|v| v / a0).collect(),
            a: a.into_iter().map(|v| v / a0).collect(),
            sections: vec![Biquad::IDENTITY; section_count(order)],
            cascade: false,
        })
    }

    pub fn family(&self) -> FilterFamily {
        self.family
    }

    pub fn order(&self) -> usize {
        self.b.len() - 1
    }

    /// Feed-forward coefficients.
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Feedback coefficients, `a[0] == 1`.
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// True when the filter runs as cascaded second-order sections.
    #[inline]
    pub fn is_cascade(&self) -> bool {
        self.cascade
    }

    /// Second-order sections, first applied first. Empty unless cascaded.
    pub fn sections(&self) -> &[Biquad] {
        if self.cascade {
            &self.sections
        } else {
            &[]
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.b[0] == 1.0
            && self.b[1..].iter().all(|&v| v == 0.0)
            && self.a[1..].iter().all(|&v| v == 0.0)
    }

    /// True when the feedback path is all zero.
    #[inline]
    pub fn is_feedforward(&self) -> bool {
        !self.cascade && self.a[1..].iter().all(|&v| v == 0.0)
    }

    pub fn set_passthrough(&mut self) {
        self.b.fill(0.0);
        self.a.fill(0.0);
        self.b[0] = 1.0;
        self.a[0] = 1.0;
        self.sections.fill(Biquad::IDENTITY);
        self.cascade = false;
    }

    /// Overwrite with `other` without reallocating.
    ///
    /// # Panics
    /// If the orders differ.
    pub fn copy_from(&mut self, other: &FilterCoefficients) {
        self.family = other.family;
        self.b.copy_from_slice(&other.b);
        self.a.copy_from_slice(&other.a);
        self.sections.copy_from_slice(&other.sections);
        self.cascade = other.cascade;
    }

    pub(crate) fn set_family(&mut self, family: FilterFamily) {
        self.family = family;
    }

    pub(crate) fn b_mut(&mut self) -> &mut [f64] {
        &mut self.b
    }

    pub(crate) fn a_mut(&mut self) -> &mut [f64] {
        &mut self.a
    }

    /// Direct-form coefficients; leaves the cascade unused.
    pub(crate) fn set_direct_form(&mut self) {
        self.cascade = false;
    }

    /// Install `sections` as the cascade and expand them into `b`/`a`.
    ///
    /// # Panics
    /// If `sections` does not have one entry per pole pair.
    pub(crate) fn set_sections(&mut self, sections: impl IntoIterator<Item = Biquad>) {
        for (dst, src) in self.sections.iter_mut().zip(sections) {
            *dst = src;
        }
        self.cascade = true;

        self.b.fill(0.0);
        self.a.fill(0.0);
        self.b[0] = 1.0;
        self.a[0] = 1.0;
        for section in &self.sections {
            convolve_in_place(&mut self.b, [section.b0, section.b1, section.b2]);
            convolve_in_place(&mut self.a, [1.0, section.a1, section.a2]);
        }
    }

    /// `|H(e^{jω})|` at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate_hz: f64) -> f64 {
        let omega = TAU * freq_hz / sample_rate_hz;
        if self.cascade {
            return self
                .sections
                .iter()
                .map(|s| s.response(omega))
                .product::<Complex64>()
                .norm();
        }
        let num = eval_poly(&self.b, omega);
        let den = eval_poly(&self.a, omega);
        (num / den).norm()
    }

    /// Magnitude the design targets at its cutoff: 0.5 for windowed-sinc,
    /// 1/√2 for Butterworth.
    ///
    /// A windowed sinc only reaches it once the order clears
    /// [`min_fir_order`](super::min_fir_order).
    pub fn nominal_cutoff_gain(&self) -> f64 {
        match self.family {
            FilterFamily::Fir => 0.5,
            FilterFamily::Iir => FRAC_1_SQRT_2,
        }
    }

    pub fn dc_gain(&self) -> f64 {
        if self.cascade {
            return self.sections.iter().map(Biquad::dc_gain).product();
        }
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }
}

/// Sections needed for `order` poles.
#[inline]
pub(crate) fn section_count(order: usize) -> usize {
    order.div_ceil(2)
}

/// `poly *= c0 + c1 z^-1 + c2 z^-2`, truncated to `poly.len()`.
fn convolve_in_place(poly: &mut [f64], c: [f64; 3]) {
    for i in (0..poly.len()).rev() {
        let mut acc = c[0] * poly[i];
        if i >= 1 {
            acc += c[1] * poly[i - 1];
        }
        if i >= 2 {
            acc += c[2] * poly[i - 2];
        }
        poly[i] = acc;
    }
}

/// `Σ c_k e^{-jωk}`
fn eval_poly(coeffs: &[f64], omega: f64) -> Complex64 {
    coeffs
        .iter()
        .enumerate()
        .map(|(k, &c)| Complex64::from_polar(c, -omega * k as f64))
        .sum()
}
