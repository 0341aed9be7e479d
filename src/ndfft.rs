//! Separable 2-D transforms (row-column algorithm) over row-major grids.

use crate::fft::FftError;
use crate::num::{Complex, Float};

/// Apply `line` to every row of a `rows`×`cols` grid, then to every column.
///
/// `column` is caller-provided scratch of length `rows`; columns are gathered
/// into it, transformed and scattered back. Shape errors are reported as
/// [`FftError`] converted into the line transform's error type.
pub fn transform_grid<T, E, F>(
    data: &mut [Complex<T>],
    rows: usize,
    cols: usize,
    column: &mut [Complex<T>],
    mut line: F,
) -> Result<(), E>
where
    T: Float,
    E: From<FftError>,
    F: FnMut(&mut [Complex<T>]) -> Result<(), E>,
{
    if rows == 0 || cols == 0 {
        return Err(FftError::EmptyInput.into());
    }
    if data.len() != rows * cols || column.len() != rows {
        return Err(FftError::InvalidShape.into());
    }
    for row in data.chunks_exact_mut(cols) {
        line(row)?;
    }
    for c in 0..cols {
        for (r, slot) in column.iter_mut().enumerate() {
            *slot = data[r * cols + c];
        }
        line(column)?;
        for (r, &value) in column.iter().enumerate() {
            data[r * cols + c] = value;
        }
    }
    Ok(())
}

/// Out-of-place transpose of a `rows`×`cols` grid into `out` (`cols`×`rows`).
pub fn transpose<T: Copy>(src: &[T], out: &mut [T], rows: usize, cols: usize) {
    debug_assert_eq!(src.len(), rows * cols);
    debug_assert_eq!(out.len(), rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = src[r * cols + c];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::{dft, ReferenceFft};
    use crate::num::Complex64;
    use proptest::prelude::*;

    #[test]
    fn grid_roundtrip_f64() {
        let fft = ReferenceFft::<f64>::default();
        let (rows, cols) = (4, 4);
        let mut data: Vec<Complex64> = (0..rows * cols)
            .map(|i| Complex64::new(i as f64, -(i as f64) / 2.0))
            .collect();
        let orig = data.clone();
        let mut column = vec![Complex64::zero(); rows];
        transform_grid(&mut data, rows, cols, &mut column, |l| fft.fft(l)).unwrap();
        transform_grid(&mut data, rows, cols, &mut column, |l| fft.ifft(l)).unwrap();
        for (a, b) in data.iter().zip(&orig) {
            assert!((*a - *b).norm_sqr() < 1e-20, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn constant_grid_has_single_dc_term() {
        let fft = ReferenceFft::<f64>::default();
        let mut data = vec![Complex64::new(1.0, 0.0); 16];
        let mut column = vec![Complex64::zero(); 4];
        transform_grid(&mut data, 4, 4, &mut column, |l| fft.fft(l)).unwrap();
        assert!((data[0].re - 16.0).abs() < 1e-12);
        assert!(data[1..].iter().all(|c| c.norm_sqr() < 1e-20));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut data = vec![Complex64::zero(); 10];
        let mut column = vec![Complex64::zero(); 4];
        let r = transform_grid(&mut data, 4, 4, &mut column, |_| Ok::<(), FftError>(()));
        assert_eq!(r, Err(FftError::InvalidShape));
    }

    #[test]
    fn transpose_swaps_axes() {
        let src = [1, 2, 3, 4, 5, 6];
        let mut out = [0; 6];
        transpose(&src, &mut out, 2, 3);
        assert_eq!(out, [1, 4, 2, 5, 3, 6]);
    }

    proptest! {
        #[test]
        fn prop_rows_then_columns_matches_direct_2d(values in proptest::collection::vec(-100.0f64..100.0, 16)) {
            let (rows, cols) = (4usize, 4usize);
            let mut data: Vec<Complex64> = values.iter().map(|&v| Complex64::new(v, 0.0)).collect();
            let input = data.clone();
            let fft = ReferenceFft::<f64>::default();
            let mut column = vec![Complex64::zero(); rows];
            transform_grid(&mut data, rows, cols, &mut column, |l| fft.fft(l)).unwrap();

            // direct 2-D DFT via two passes of the O(N²) kernel
            let mut tmp = input.clone();
            for (src, dst) in input.chunks(cols).zip(tmp.chunks_mut(cols)) {
                dft(src, dst, -1.0).unwrap();
            }
            let mut t = vec![Complex64::zero(); rows * cols];
            transpose(&tmp, &mut t, rows, cols);
            let mut t2 = t.clone();
            for (src, dst) in t.chunks(rows).zip(t2.chunks_mut(rows)) {
                dft(src, dst, -1.0).unwrap();
            }
            let mut expected = vec![Complex64::zero(); rows * cols];
            transpose(&t2, &mut expected, cols, rows);
            for (a, b) in data.iter().zip(&expected) {
                prop_assert!((*a - *b).norm_sqr().sqrt() < 1e-8);
            }
        }
    }
}
