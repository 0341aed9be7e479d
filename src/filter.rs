//! Frequency-domain filters.
//!
//! A [`FilterKind`] maps a signed frequency to a real coefficient in `[0, 1]`
//! that scales both components of the spectrum sample. Every kind is
//! non-increasing in `|f|`.

use core::fmt;
use core::str::FromStr;

use crate::freq::{inverted_frequency, signed_frequency};
use crate::num::Complex64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Identity.
    #[default]
    None,
    /// Pass `|f| <= N/4`.
    CutLarge,
    /// Pass `|f| <= N/8`.
    CutMedium,
    /// Pass `|f| <= N/16`.
    CutShort,
    /// `exp(-0.01 |f|)`.
    Exponential,
    /// `exp(-0.005 f²)`.
    Gaussian,
    /// `min(1, 4 / (1 + |f|))`.
    Inverse,
}

impl FilterKind {
    pub const ALL: [FilterKind; 7] = [
        FilterKind::None,
        FilterKind::CutLarge,
        FilterKind::CutMedium,
        FilterKind::CutShort,
        FilterKind::Exponential,
        FilterKind::Gaussian,
        FilterKind::Inverse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::CutLarge => "cut-large",
            FilterKind::CutMedium => "cut-medium",
            FilterKind::CutShort => "cut-short",
            FilterKind::Exponential => "exp",
            FilterKind::Gaussian => "gaussian",
            FilterKind::Inverse => "inverse",
        }
    }

    /// Largest `|f|` a hard cutoff passes for an `n`-point axis.
    pub fn cutoff(self, n: usize) -> Option<usize> {
        match self {
            FilterKind::CutLarge => Some(n / 4),
            FilterKind::CutMedium => Some(n / 8),
            FilterKind::CutShort => Some(n / 16),
            _ => None,
        }
    }

    /// Coefficient at signed frequency `f` of an `n`-point axis.
    ///
    /// The coefficient does not depend on where in the buffer the sample sits,
    /// only on its frequency.
    pub fn coefficient(self, f: i64, n: usize) -> f64 {
        let mag = f.unsigned_abs() as f64;
        match self {
            FilterKind::None => 1.0,
            FilterKind::CutLarge | FilterKind::CutMedium | FilterKind::CutShort => {
                match self.cutoff(n) {
                    Some(c) if f.unsigned_abs() as usize > c => 0.0,
                    _ => 1.0,
                }
            }
            FilterKind::Exponential => (-0.01 * mag).exp(),
            FilterKind::Gaussian => (-0.005 * mag * mag).exp(),
            FilterKind::Inverse => (4.0 / (1.0 + mag)).min(1.0),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown filter `{s}`"))
    }
}

#[inline]
fn frequency(i: usize, n: usize, inverted: bool) -> i64 {
    if inverted {
        inverted_frequency(i, n)
    } else {
        signed_frequency(i, n)
    }
}

/// Filter a 1-D spectrum in place.
pub fn apply(spectrum: &mut [Complex64], kind: FilterKind, inverted: bool) {
    if kind == FilterKind::None {
        return;
    }
    let n = spectrum.len();
    for (i, c) in spectrum.iter_mut().enumerate() {
        *c *= kind.coefficient(frequency(i, n, inverted), n);
    }
}

/// Filter a row-major `side`×`side` spectrum in place with the separable
/// product of the per-axis coefficients.
///
/// # Panics
/// Panics if `spectrum.len() != side * side`.
pub fn apply_grid(spectrum: &mut [Complex64], side: usize, kind: FilterKind, inverted: bool) {
    assert_eq!(spectrum.len(), side * side, "grid spectrum length mismatch");
    if kind == FilterKind::None {
        return;
    }
    let axis: Vec<f64> = (0..side)
        .map(|i| kind.coefficient(frequency(i, side, inverted), side))
        .collect();
    for (row, &cy) in spectrum.chunks_exact_mut(side).zip(&axis) {
        for (c, &cx) in row.iter_mut().zip(&axis) {
            *c *= cy * cx;
        }
    }
}

/// Copy `src` into `dst` and filter it; `grid_side` selects the 1-D or the
/// `side`×`side` grid rule.
///
/// # Panics
/// Panics if `src` and `dst` differ in length.
pub fn apply_into(
    src: &[Complex64],
    dst: &mut [Complex64],
    grid_side: Option<usize>,
    kind: FilterKind,
    inverted: bool,
) {
    assert_eq!(src.len(), dst.len(), "filter buffer length mismatch");
    dst.copy_from_slice(src);
    match grid_side {
        None => apply(dst, kind, inverted),
        Some(side) => apply_grid(dst, side, kind, inverted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 1024;

    #[test]
    fn cutoffs_for_1024() {
        assert_eq!(FilterKind::CutLarge.cutoff(N), Some(256));
        assert_eq!(FilterKind::CutMedium.cutoff(N), Some(128));
        assert_eq!(FilterKind::CutShort.cutoff(N), Some(64));
        assert_eq!(FilterKind::Gaussian.cutoff(N), None);
        assert_eq!(FilterKind::CutShort.coefficient(64, N), 1.0);
        assert_eq!(FilterKind::CutShort.coefficient(-65, N), 0.0);
    }

    #[test]
    fn tapers_are_monotone_and_bounded() {
        for kind in FilterKind::ALL {
            let mut prev = kind.coefficient(0, N);
            assert!(prev <= 1.0, "{kind}");
            for f in 1..(N as i64 / 2) {
                let c = kind.coefficient(f, N);
                assert!(c <= prev && c >= 0.0, "{kind} at {f}");
                assert_eq!(c, kind.coefficient(-f, N));
                prev = c;
            }
        }
    }

    #[test]
    fn inverse_taper_constants() {
        assert_eq!(FilterKind::Inverse.coefficient(3, N), 1.0);
        assert_eq!(FilterKind::Inverse.coefficient(7, N), 0.5);
        assert!((FilterKind::Exponential.coefficient(100, N) - (-1.0f64).exp()).abs() < 1e-15);
        assert!((FilterKind::Gaussian.coefficient(10, N) - (-0.5f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn inverted_convention_differs_at_dc_index() {
        let mut forward = vec![Complex64::new(1.0, 1.0); N];
        let mut inverted = forward.clone();
        apply(&mut forward, FilterKind::CutShort, false);
        apply(&mut inverted, FilterKind::CutShort, true);
        // index 0 is DC in the forward convention and -N/2 when inverted
        assert_eq!(forward[0], Complex64::new(1.0, 1.0));
        assert_eq!(inverted[0], Complex64::zero());
        assert_eq!(inverted[N / 2], Complex64::new(1.0, 1.0));
    }

    #[test]
    fn grid_is_separable() {
        let side = 16;
        let mut spectrum = vec![Complex64::new(1.0, 0.0); side * side];
        apply_grid(&mut spectrum, side, FilterKind::Gaussian, false);
        let g = |i: usize| FilterKind::Gaussian.coefficient(signed_frequency(i, side), side);
        assert_eq!(spectrum[3 * side + 5].re, g(3) * g(5));
        assert_eq!(spectrum[0].re, 1.0);
    }

    #[test]
    #[should_panic(expected = "filter buffer length mismatch")]
    fn mismatched_lengths_panic() {
        let src = vec![Complex64::zero(); 4];
        let mut dst = vec![Complex64::zero(); 8];
        apply_into(&src, &mut dst, None, FilterKind::None, false);
    }

    #[test]
    fn parse_names() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.name().parse::<FilterKind>(), Ok(kind));
        }
    }
}
