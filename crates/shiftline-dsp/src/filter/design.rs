//! Lowpass coefficient design.
//!
//! Two families are supported:
//!
//! - **FIR**: windowed sinc with `order + 1` taps and a Hamming window, scaled
//!   to unity DC gain. Linear phase, -6 dB at the cutoff.
//! - **IIR**: digital Butterworth with `order` poles, obtained from the analog
//!   prototype by the bilinear transform with pre-warping. All zeros sit at
//!   z = -1, DC gain is one and the cutoff is at -3 dB. Each conjugate pole
//!   pair becomes one second-order section (plus a first-order section for an
//!   odd order), so low cutoffs at high order stay stable.
//!
//! A windowed sinc needs enough taps to resolve its cutoff; below
//! [`min_fir_order`] the gain at the cutoff drifts away from -6 dB (toward
//! unity for low cutoffs).
//!
//! [`FilterDesigner`] keeps a workspace and a small cache so re-designing on
//! the audio thread does not allocate.

use super::coefficients::{section_count, Biquad};
use super::FilterCoefficients;
use crate::{Error, Result};
use rustfft::num_complex::Complex64;
use shiftline_core::FilterFamily;
use std::f64::consts::{PI, TAU};

/// Coefficient sets remembered per designer.
const CACHE_SLOTS: usize = 8;

/// Design a lowpass for `cutoff_hz` at `sample_rate_hz`.
///
/// Requires `0 < cutoff_hz < sample_rate_hz / 2` and `order >= 1`.
pub fn design_lowpass(
    cutoff_hz: f64,
    sample_rate_hz: f64,
    order: usize,
    family: FilterFamily,
) -> Result<FilterCoefficients> {
    FilterDesigner::new(sample_rate_hz, order, family)?.design(cutoff_hz)
}

/// Smallest FIR order whose windowed sinc lands within 3 dB of -6 dB at
/// `cutoff_hz`.
///
/// Grows as the cutoff nears DC or Nyquist: `ceil(2 / min(c, 1 - c))` with
/// `c = cutoff / Nyquist`. Returns `usize::MAX` outside `(0, Nyquist)`.
pub fn min_fir_order(cutoff_hz: f64, sample_rate_hz: f64) -> usize {
    let normalized = cutoff_hz / (sample_rate_hz * 0.5);
    let margin = normalized.min(1.0 - normalized);
    if !margin.is_finite() || margin <= 0.0 {
        return usize::MAX;
    }
    (2.0 / margin).ceil() as usize
}

struct CacheSlot {
    cutoff_bits: Option<u64>,
    last_used: u64,
    coeffs: FilterCoefficients,
}

/// Lowpass designer bound to one sample rate, order and family.
///
/// All buffers are sized at construction; [`design_into`](Self::design_into)
/// and [`passthrough_into`](Self::passthrough_into) never allocate. Recently
/// designed cutoffs are served from a least-recently-used cache.
pub struct FilterDesigner {
    sample_rate_hz: f64,
    order: usize,
    family: FilterFamily,
    cache: Vec<CacheSlot>,
    tick: u64,
}

impl FilterDesigner {
    pub fn new(sample_rate_hz: f64, order: usize, family: FilterFamily) -> Result<Self> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "sample rate must be positive, got {sample_rate_hz}"
            )));
        }
        if order == 0 {
            return Err(Error::InvalidParameter("filter order must be at least 1".into()));
        }

        let cache = (0..CACHE_SLOTS)
            .map(|_| CacheSlot {
                cutoff_bits: None,
                last_used: 0,
                coeffs: FilterCoefficients::passthrough(family, order),
            })
            .collect();

        Ok(Self {
            sample_rate_hz,
            order,
            family,
            cache,
            tick: 0,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn family(&self) -> FilterFamily {
        self.family
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz * 0.5
    }

    /// Design into a freshly allocated coefficient set.
    pub fn design(&mut self, cutoff_hz: f64) -> Result<FilterCoefficients> {
        let mut coeffs = FilterCoefficients::passthrough(self.family, self.order);
        self.design_into(cutoff_hz, &mut coeffs)?;
        Ok(coeffs)
    }

    /// Identity coefficients of this designer's order and family.
    pub fn passthrough(&self) -> FilterCoefficients {
        FilterCoefficients::passthrough(self.family, self.order)
    }

    /// Design for `cutoff_hz`, overwriting `out` in place.
    pub fn design_into(&mut self, cutoff_hz: f64, out: &mut FilterCoefficients) -> Result<()> {
        self.check_order(out)?;

        let nyquist = self.nyquist_hz();
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
            return Err(Error::InvalidParameter(format!(
                "cutoff {cutoff_hz} Hz must lie strictly between 0 and Nyquist ({nyquist} Hz)"
            )));
        }

        self.tick += 1;
        let key = cutoff_hz.to_bits();

        if let Some(slot) = self.cache.iter_mut().find(|s| s.cutoff_bits == Some(key)) {
            slot.last_used = self.tick;
            out.copy_from(&slot.coeffs);
            tracing::debug!(cutoff_hz, "lowpass coefficients served from cache");
            return Ok(());
        }

        let normalized = cutoff_hz / nyquist;
        out.set_family(self.family);
        match self.family {
            FilterFamily::Fir => {
                windowed_sinc(normalized, out)?;
                if self.order < min_fir_order(cutoff_hz, self.sample_rate_hz) {
                    tracing::warn!(
                        cutoff_hz,
                        order = self.order,
                        needed = min_fir_order(cutoff_hz, self.sample_rate_hz),
                        "FIR order too low to reach -6 dB at the cutoff"
                    );
                }
            }
            FilterFamily::Iir => butterworth(normalized, out),
        }

        // Evict an empty or the least recently used slot
        if let Some(slot) = self.cache.iter_mut().min_by_key(|s| match s.cutoff_bits {
            None => 0,
            Some(_) => s.last_used,
        }) {
            slot.coeffs.copy_from(out);
            slot.cutoff_bits = Some(key);
            slot.last_used = self.tick;
        }

        tracing::debug!(
            cutoff_hz,
            order = self.order,
            family = ?self.family,
            "designed lowpass coefficients"
        );
        Ok(())
    }

    /// Overwrite `out` with the identity filter (anti-aliasing disabled).
    pub fn passthrough_into(&self, out: &mut FilterCoefficients) -> Result<()> {
        self.check_order(out)?;
        out.set_family(self.family);
        out.set_passthrough();
        Ok(())
    }

    /// Number of cutoffs currently cached.
    pub fn cached(&self) -> usize {
        self.cache.iter().filter(|s| s.cutoff_bits.is_some()).count()
    }

    pub fn clear_cache(&mut self) {
        for slot in &mut self.cache {
            slot.cutoff_bits = None;
            slot.last_used = 0;
        }
    }

    fn check_order(&self, coeffs: &FilterCoefficients) -> Result<()> {
        if coeffs.order() != self.order {
            return Err(Error::InvalidParameter(format!(
                "coefficient order {} does not match designer order {}",
                coeffs.order(),
                self.order
            )));
        }
        Ok(())
    }
}

/// Hamming-windowed sinc, `normalized` = cutoff / Nyquist in (0, 1).
fn windowed_sinc(normalized: f64, out: &mut FilterCoefficients) -> Result<()> {
    let taps = out.order() + 1;
    let center = (taps - 1) as f64 / 2.0;
    let span = (taps - 1) as f64;

    let b = out.b_mut();
    for (i, tap) in b.iter_mut().enumerate() {
        let x = normalized * (i as f64 - center);
        let sinc = if x == 0.0 { 1.0 } else { (PI * x).sin() / (PI * x) };
        let window = 0.54 - 0.46 * (TAU * i as f64 / span).cos();
        *tap = normalized * sinc * window;
    }

    let sum: f64 = b.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "degenerate windowed-sinc design (tap sum {sum})"
        )));
    }
    for tap in b.iter_mut() {
        *tap /= sum;
    }

    let a = out.a_mut();
    a.fill(0.0);
    a[0] = 1.0;
    out.set_direct_form();
    Ok(())
}

/// Bilinear-transformed Butterworth as cascaded sections, `normalized` =
/// cutoff / Nyquist in (0, 1).
fn butterworth(normalized: f64, out: &mut FilterCoefficients) {
    let order = out.order();
    let warped = (PI * normalized / 2.0).tan();

    // Analog poles s_k = Ωc e^{jθ_k}; pair k with its conjugate N-1-k
    let pairs = (0..order / 2).map(|k| {
        let angle = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        let s = Complex64::from_polar(warped, angle);
        let pole = (1.0 + s) / (1.0 - s);

        let a1 = -2.0 * pole.re;
        let a2 = pole.norm_sqr();
        // Zeros at z = -1, unity gain at DC
        let gain = (1.0 + a1 + a2) / 4.0;
        Biquad {
            b0: gain,
            b1: 2.0 * gain,
            b2: gain,
            a1,
            a2,
        }
    });

    // Odd order: the real pole at s = -Ωc
    let real = (order % 2 == 1).then(|| {
        let pole = (1.0 - warped) / (1.0 + warped);
        let gain = (1.0 - pole) / 2.0;
        Biquad {
            b0: gain,
            b1: gain,
            b2: 0.0,
            a1: -pole,
            a2: 0.0,
        }
    });

    debug_assert_eq!(order / 2 + usize::from(real.is_some()), section_count(order));
    out.set_sections(pairs.chain(real));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn test_rejects_invalid_parameters() {
        for cutoff in [0.0, -5.0, 22_050.0, 30_000.0, f64::NAN] {
            assert!(matches!(
                design_lowpass(cutoff, 44_100.0, 4, FilterFamily::Iir),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert!(design_lowpass(1_000.0, 44_100.0, 0, FilterFamily::Fir).is_err());
        assert!(design_lowpass(1_000.0, 0.0, 4, FilterFamily::Fir).is_err());
    }

    #[test]
    fn test_first_order_butterworth_closed_form() {
        // Cutoff at fs/4: warped = tan(π/4) = 1, pole at z = 0
        let coeffs = design_lowpass(250.0, 1_000.0, 1, FilterFamily::Iir).unwrap();
        assert_relative_eq!(coeffs.a()[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(coeffs.a()[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(coeffs.b()[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(coeffs.b()[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_second_order_butterworth_matches_reference() {
        // Reference values for a 2nd-order Butterworth at 0.2 x Nyquist
        let coeffs = design_lowpass(1_000.0, 10_000.0, 2, FilterFamily::Iir).unwrap();
        let expected_b = [0.067_455_273_889_071_9, 0.134_910_547_778_143_8, 0.067_455_273_889_071_9];
        let expected_a = [1.0, -1.142_980_502_539_901, 0.412_801_598_096_188_8];
        for (got, want) in coeffs.b().iter().zip(expected_b) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
        for (got, want) in coeffs.a().iter().zip(expected_a) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_butterworth_unity_dc_and_cutoff_gain() {
        let coeffs = design_lowpass(1_000.0, 44_100.0, 6, FilterFamily::Iir).unwrap();
        assert_relative_eq!(coeffs.dc_gain(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(
            coeffs.magnitude_at(1_000.0, 44_100.0),
            FRAC_1_SQRT_2,
            epsilon = 1e-6
        );
        assert!(coeffs.magnitude_at(5_000.0, 44_100.0) < 1e-3);
    }

    #[test]
    fn test_butterworth_runs_as_sections() {
        let coeffs = design_lowpass(1_000.0, 44_100.0, 5, FilterFamily::Iir).unwrap();
        assert!(coeffs.is_cascade());
        assert_eq!(coeffs.sections().len(), 3);
        for section in coeffs.sections() {
            // Stable: both poles inside the unit circle
            assert!(section.a2.abs() < 1.0);
            assert!(section.a1.abs() < 1.0 + section.a2);
        }

        let fir = design_lowpass(1_000.0, 44_100.0, 64, FilterFamily::Fir).unwrap();
        assert!(!fir.is_cascade());
    }

    #[test]
    fn test_min_fir_order() {
        // 1 kHz at 44.1 kHz is 0.0454 of Nyquist
        assert_eq!(min_fir_order(1_000.0, 44_100.0), 45);
        assert_eq!(min_fir_order(5_000.0, 10_000.0), usize::MAX);
        assert_eq!(min_fir_order(0.0, 10_000.0), usize::MAX);
        assert_eq!(min_fir_order(2_500.0, 10_000.0), 4);
        // Symmetric around half of Nyquist
        assert_eq!(min_fir_order(3_750.0, 10_000.0), 4 * 2);
        assert_eq!(min_fir_order(1_250.0, 10_000.0), 4 * 2);
    }

    #[test]
    fn test_low_order_fir_barely_attenuates_cutoff() {
        // The default stream (order 3, 1 kHz, 44.1 kHz) sits far below
        // min_fir_order: the taps are almost flat and the cutoff passes
        // at close to unity gain instead of -6 dB.
        let low = design_lowpass(1_000.0, 44_100.0, 3, FilterFamily::Fir).unwrap();
        let gain = low.magnitude_at(1_000.0, 44_100.0);
        assert!(gain > 0.95, "gain at cutoff was {gain}");

        let order = min_fir_order(1_000.0, 44_100.0);
        let enough = design_lowpass(1_000.0, 44_100.0, order, FilterFamily::Fir).unwrap();
        let error_db = 20.0 * (enough.magnitude_at(1_000.0, 44_100.0) / 0.5).log10();
        assert!(error_db.abs() < 3.0, "error {error_db} dB");
    }

    #[test]
    fn test_fir_symmetric_unity_dc() {
        let coeffs = design_lowpass(1_000.0, 44_100.0, 64, FilterFamily::Fir).unwrap();
        let b = coeffs.b();
        assert_eq!(b.len(), 65);
        for i in 0..b.len() / 2 {
            assert_relative_eq!(b[i], b[b.len() - 1 - i], epsilon = 1e-15);
        }
        assert_relative_eq!(b.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(coeffs.is_feedforward());
    }

    #[test]
    fn test_fir_cutoff_near_half_gain() {
        let coeffs = design_lowpass(5_000.0, 44_100.0, 128, FilterFamily::Fir).unwrap();
        let gain = coeffs.magnitude_at(5_000.0, 44_100.0);
        assert!((gain - 0.5).abs() < 0.02, "gain at cutoff was {gain}");
    }

    #[test]
    fn test_cache_hits_and_eviction() {
        let mut designer = FilterDesigner::new(44_100.0, 4, FilterFamily::Iir).unwrap();
        let first = designer.design(1_000.0).unwrap();
        assert_eq!(designer.cached(), 1);

        let again = designer.design(1_000.0).unwrap();
        assert_eq!(first, again);
        assert_eq!(designer.cached(), 1);

        for i in 0..CACHE_SLOTS + 2 {
            designer.design(2_000.0 + i as f64 * 100.0).unwrap();
        }
        assert_eq!(designer.cached(), CACHE_SLOTS);

        designer.clear_cache();
        assert_eq!(designer.cached(), 0);
        assert_eq!(designer.design(1_000.0).unwrap(), first);
    }

    #[test]
    fn test_design_into_checks_order() {
        let mut designer = FilterDesigner::new(44_100.0, 4, FilterFamily::Fir).unwrap();
        let mut wrong = FilterCoefficients::passthrough(FilterFamily::Fir, 3);
        assert!(designer.design_into(1_000.0, &mut wrong).is_err());
        assert!(designer.passthrough_into(&mut wrong).is_err());

        let mut coeffs = designer.design(1_000.0).unwrap();
        designer.passthrough_into(&mut coeffs).unwrap();
        assert!(coeffs.is_passthrough());
    }
}
