//! Sequential reference FFT.
//!
//! Power-of-two lengths use a Stockham auto-sort radix-2 FFT with twiddle
//! tables cached in an [`FftPlanner`]; other lengths fall back to a direct
//! O(N²) DFT. The butterfly pass ([`stockham_pass`]) is shared with the
//! accelerated backend, which runs the same pass as a device kernel.
//!
//! [`ReferenceFft::fft`] is unscaled and [`ReferenceFft::ifft`] scales by
//! `1/N`, so `ifft(fft(x)) == x`.

use core::cell::RefCell;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::num::{Complex, Float};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    EmptyInput,
    MismatchedLengths,
    /// The backend only supports power-of-two lengths.
    NonPowerOfTwo(usize),
    /// A grid transform was given a buffer that is not `rows * cols` long.
    InvalidShape,
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::EmptyInput => write!(f, "input buffer is empty"),
            FftError::MismatchedLengths => write!(f, "input and output lengths differ"),
            FftError::NonPowerOfTwo(n) => write!(f, "length {n} is not a power of two"),
            FftError::InvalidShape => write!(f, "buffer length does not match grid shape"),
        }
    }
}

impl std::error::Error for FftError {}

/// Caches twiddle tables and a reusable scratch buffer.
pub struct FftPlanner<T: Float> {
    /// Twiddle table per transform length `n`: `n/2` entries holding
    /// `exp(-2πi k / n)` for `k = 0..n/2`.
    cache: HashMap<usize, Arc<[Complex<T>]>>,
    scratch: Vec<Complex<T>>,
}

impl<T: Float> Default for FftPlanner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> FftPlanner<T> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            scratch: Vec::new(),
        }
    }

    /// Twiddle table for length `n` (see [`twiddle_table`]).
    pub fn get_twiddles(&mut self, n: usize) -> Arc<[Complex<T>]> {
        Arc::clone(
            self.cache
                .entry(n)
                .or_insert_with(|| Arc::from(twiddle_table::<T>(n))),
        )
    }
}

/// Forward twiddle factors `exp(-2πi k / n)` for `k = 0..n/2`.
///
/// Angles are evaluated in `f64` and narrowed, so the `f32` table carries no
/// accumulated recurrence error.
pub fn twiddle_table<T: Float>(n: usize) -> Vec<Complex<T>> {
    let step = -2.0 * core::f64::consts::PI / n as f64;
    (0..n / 2)
        .map(|k| {
            let (sin, cos) = (step * k as f64).sin_cos();
            Complex::new(T::from_f64(cos), T::from_f64(sin))
        })
        .collect()
}

/// Radix-2 butterflies for one group: `lo = a + w·b`, `hi = a - w·b`.
#[inline]
pub(crate) fn butterfly<T: Float>(
    a: &[Complex<T>],
    b: &[Complex<T>],
    lo: &mut [Complex<T>],
    hi: &mut [Complex<T>],
    w: Complex<T>,
) {
    for (((x0, x1), &u), &v) in lo.iter_mut().zip(hi.iter_mut()).zip(a).zip(b) {
        let v = v.mul(w);
        *x0 = u.add(v);
        *x1 = u.sub(v);
    }
}

/// One radix-2 Stockham pass over `n = src.len()` samples with `n1` groups
/// of half-size `n2` (`n1 * n2 * 2 == n`).
pub fn stockham_pass<T: Float>(
    src: &[Complex<T>],
    dst: &mut [Complex<T>],
    twiddles: &[Complex<T>],
    n1: usize,
    n2: usize,
) {
    debug_assert_eq!(n1 * n2 * 2, src.len());
    let (lo, hi) = dst.split_at_mut(n1 * n2);
    for (k, ((lo, hi), src)) in lo
        .chunks_exact_mut(n2)
        .zip(hi.chunks_exact_mut(n2))
        .zip(src.chunks_exact(2 * n2))
        .enumerate()
    {
        let (a, b) = src.split_at(n2);
        butterfly(a, b, lo, hi, twiddles[k * n2]);
    }
}

/// Direct O(N²) DFT of `input` into `output`, unscaled.
///
/// `sign` is `-1.0` for the forward transform and `+1.0` for the inverse.
pub fn dft<T: Float>(
    input: &[Complex<T>],
    output: &mut [Complex<T>],
    sign: f64,
) -> Result<(), FftError> {
    let n = input.len();
    if n == 0 {
        return Err(FftError::EmptyInput);
    }
    if output.len() != n {
        return Err(FftError::MismatchedLengths);
    }
    let step = sign * 2.0 * core::f64::consts::PI / n as f64;
    for (k, out) in output.iter_mut().enumerate() {
        let mut acc = Complex::<T>::zero();
        for (m, &x) in input.iter().enumerate() {
            // reduce k*m mod n first to keep the angle small
            let w = Complex::expi(T::from_f64(step * ((k * m) % n) as f64));
            acc = acc.add(x.mul(w));
        }
        *out = acc;
    }
    Ok(())
}

/// Sequential FFT used as the reference implementation.
pub struct ReferenceFft<T: Float> {
    planner: RefCell<FftPlanner<T>>,
}

impl<T: Float> Default for ReferenceFft<T> {
    fn default() -> Self {
        Self {
            planner: RefCell::new(FftPlanner::new()),
        }
    }
}

impl<T: Float> ReferenceFft<T> {
    pub fn with_planner(planner: FftPlanner<T>) -> Self {
        Self {
            planner: RefCell::new(planner),
        }
    }

    /// In-place forward transform, unscaled.
    pub fn fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        if n == 1 {
            return Ok(());
        }
        if n.is_power_of_two() {
            self.stockham_fft(input);
            return Ok(());
        }
        let original: Vec<Complex<T>> = input.to_vec();
        dft(&original, input, -1.0)
    }

    /// In-place inverse transform, scaled by `1/N`.
    pub fn ifft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        for c in input.iter_mut() {
            c.im = -c.im;
        }
        self.fft(input)?;
        let scale = T::one() / T::from_usize(n).unwrap_or_else(|| T::from_f64(n as f64));
        for c in input.iter_mut() {
            c.im = -c.im;
            c.re = c.re * scale;
            c.im = c.im * scale;
        }
        Ok(())
    }

    fn stockham_fft(&self, input: &mut [Complex<T>]) {
        let n = input.len();
        let (twiddles, mut scratch) = {
            let mut planner = self.planner.borrow_mut();
            let twiddles = planner.get_twiddles(n);
            let scratch = core::mem::take(&mut planner.scratch);
            (twiddles, scratch)
        };
        if scratch.len() < n {
            scratch.resize(n, Complex::zero());
        }

        let mut in_scratch = false;
        let mut n1 = 1usize;
        let mut n2 = n;
        while n1 < n {
            n2 >>= 1;
            if in_scratch {
                stockham_pass(&scratch[..n], input, &twiddles, n1, n2);
            } else {
                stockham_pass(input, &mut scratch[..n], &twiddles, n1, n2);
            }
            in_scratch = !in_scratch;
            n1 <<= 1;
        }
        if in_scratch {
            input.copy_from_slice(&scratch[..n]);
        }

        self.planner.borrow_mut().scratch = scratch;
    }
}
