//! Cross-backend comparison.

use core::fmt;

use crate::num::Complex64;

/// Raw sums of squared component differences between two buffers.
///
/// No normalization by length is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Discrepancy {
    pub sum_sq_re: f64,
    pub sum_sq_im: f64,
}

impl Discrepancy {
    pub const ZERO: Discrepancy = Discrepancy {
        sum_sq_re: 0.0,
        sum_sq_im: 0.0,
    };

    pub fn total(&self) -> f64 {
        self.sum_sq_re + self.sum_sq_im
    }

    /// Both sums are at most `eps`.
    pub fn is_within(&self, eps: f64) -> bool {
        self.sum_sq_re <= eps && self.sum_sq_im <= eps
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SqDiff = {} , {}",
            significant(self.sum_sq_re, 3),
            significant(self.sum_sq_im, 3)
        )
    }
}

/// Compare `a` against `b` sample by sample.
///
/// # Panics
/// Panics if the buffers differ in length.
pub fn compare(a: &[Complex64], b: &[Complex64]) -> Discrepancy {
    assert_eq!(a.len(), b.len(), "compared buffers differ in length");
    a.iter()
        .zip(b)
        .fold(Discrepancy::ZERO, |mut acc, (&x, &y)| {
            let d = x - y;
            acc.sum_sq_re += d.re * d.re;
            acc.sum_sq_im += d.im * d.im;
            acc
        })
}

/// Format `x` with `digits` significant digits, switching to exponent
/// notation (`1.23E-07`) for very small or large magnitudes.
fn significant(x: f64, digits: usize) -> String {
    if x == 0.0 || !x.is_finite() {
        return format!("{x}");
    }
    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    if exp < -5 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}E{}{:02}", trim_zeros(mantissa), sign, exp.unsigned_abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{x:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn identical_buffers_have_zero_discrepancy(
            values in proptest::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 0..512),
        ) {
            let a: Vec<Complex64> = values.iter().map(|&(r, i)| Complex64::new(r, i)).collect();
            prop_assert_eq!(compare(&a, &a), Discrepancy::ZERO);
        }
    }

    #[test]
    fn components_are_accumulated_separately() {
        let a = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 2.0)];
        let b = [Complex64::new(0.0, 0.0), Complex64::new(3.0, 0.0)];
        let d = compare(&a, &b);
        assert_eq!(d.sum_sq_re, 1.0 + 9.0);
        assert_eq!(d.sum_sq_im, 4.0);
        assert_eq!(d.total(), 14.0);
        assert!(!d.is_within(5.0));
    }

    #[test]
    #[should_panic(expected = "compared buffers differ in length")]
    fn mismatched_lengths_panic() {
        compare(&[Complex64::zero()], &[]);
    }

    #[test]
    fn label_uses_three_significant_digits() {
        let d = Discrepancy {
            sum_sq_re: 1.23456e-7,
            sum_sq_im: 0.0,
        };
        assert_eq!(d.to_string(), "SqDiff = 1.23E-07 , 0");
        assert_eq!(significant(12.345, 3), "12.3");
        assert_eq!(significant(0.5, 3), "0.5");
        assert_eq!(significant(4567.0, 3), "4.57E+03");
    }
}
