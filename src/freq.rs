//! Frequency index mapping.
//!
//! A spectrum of length `N` is stored in the natural transform order. Raw index
//! `i` corresponds to the signed frequency `((i + N/2) mod N) - N/2`. For
//! display the spectrum is rotated by `N/2`, so the DC term sits at the centred
//! position `N/2` and position `p` shows signed frequency `p - N/2`.
//!
//! Every call site (filtering, display, tests) goes through these helpers so
//! the centre reference is computed one way only.

/// Signed frequency of raw spectrum index `i` ("forward" convention).
///
/// `n` must be even and `i < n`.
#[inline]
pub fn signed_frequency(i: usize, n: usize) -> i64 {
    debug_assert!(i < n);
    let half = (n / 2) as i64;
    ((i + n / 2) % n) as i64 - half
}

/// Signed frequency of raw index `i` when the forward/backward roles of the
/// displayed spectra are swapped ("inverted" convention).
///
/// This is `((N - i) mod N) - N/2`. It is not a reflection of
/// [`signed_frequency`]: at `i = 0` it yields `-N/2` rather than `0`, so DC is
/// evaluated as the most negative frequency.
#[inline]
pub fn inverted_frequency(i: usize, n: usize) -> i64 {
    debug_assert!(i < n);
    let half = (n / 2) as i64;
    ((n - i) % n) as i64 - half
}

/// Raw spectrum index shown at centred display position `position`.
#[inline]
pub fn display_index(position: usize, n: usize) -> usize {
    (position + n / 2) % n
}

/// Signed frequency shown at centred display position `position`.
///
/// Position `0` is the most negative frequency, position `N/2` is DC and
/// position `N - 1` is `N/2 - 1`.
#[inline]
pub fn position_frequency(position: usize, n: usize) -> i64 {
    debug_assert!(position < n);
    position as i64 - (n / 2) as i64
}

/// Raw spectrum index holding signed frequency `f` in `[-N/2, N/2)`.
#[inline]
pub fn index_of_frequency(f: i64, n: usize) -> usize {
    let n_i = n as i64;
    f.rem_euclid(n_i) as usize
}

/// Copy `spectrum` into `out` rotated so DC lands at the centre.
///
/// # Panics
/// Panics if the buffers differ in length.
pub fn centered<T: Copy>(spectrum: &[T], out: &mut [T]) {
    assert_eq!(spectrum.len(), out.len(), "centred view length mismatch");
    let n = spectrum.len();
    for (position, slot) in out.iter_mut().enumerate() {
        *slot = spectrum[display_index(position, n)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_convention_matches_fft_order() {
        let n = 8;
        let got: Vec<i64> = (0..n).map(|i| signed_frequency(i, n)).collect();
        assert_eq!(got, vec![0, 1, 2, 3, -4, -3, -2, -1]);
    }

    #[test]
    fn inverted_convention_differs_at_boundaries() {
        let n = 8;
        let got: Vec<i64> = (0..n).map(|i| inverted_frequency(i, n)).collect();
        assert_eq!(got, vec![-4, 3, 2, 1, 0, -1, -2, -3]);
        assert_ne!(inverted_frequency(0, n), signed_frequency(0, n));
    }

    #[test]
    fn display_and_signed_agree() {
        let n = 16;
        for p in 0..n {
            assert_eq!(
                signed_frequency(display_index(p, n), n),
                position_frequency(p, n)
            );
        }
    }

    #[test]
    fn index_of_frequency_inverts_signed_frequency() {
        let n = 32;
        for i in 0..n {
            assert_eq!(index_of_frequency(signed_frequency(i, n), n), i);
        }
    }

    #[test]
    fn centered_puts_dc_in_the_middle() {
        let spectrum = [10, 11, 12, 13];
        let mut out = [0; 4];
        centered(&spectrum, &mut out);
        assert_eq!(out, [12, 13, 10, 11]);
    }
}
