//! Complex samples and the minimal float abstraction shared by every backend.
//!
//! The reference path computes in `f64`, the accelerated path in `f32`; the
//! butterfly code is written once against [`Float`].

use core::f64::consts::PI;

// Minimal float trait for generic FFT kernels
pub trait Float:
    Copy
    + Clone
    + PartialEq
    + PartialOrd
    + core::fmt::Debug
    + core::ops::Add<Output = Self>
    + core::ops::Sub<Output = Self>
    + core::ops::Mul<Output = Self>
    + core::ops::Div<Output = Self>
    + core::ops::Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    fn zero() -> Self;
    fn one() -> Self;
    fn from_f64(x: f64) -> Self;
    fn to_f64(self) -> f64;
    /// Attempt to convert a `usize` into the floating-point type.
    /// Returns `None` if the value cannot be represented exactly.
    fn from_usize(x: usize) -> Option<Self>;
    fn sin_cos(self) -> (Self, Self);
    fn pi() -> Self;
    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }
}

///
/// # Note
/// `#[allow(unconditional_recursion)]` silences a false positive: `f32::sin_cos(self)`
/// resolves to the inherent method, not the trait method of the same name.
#[allow(unconditional_recursion)]
impl Float for f32 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn from_f64(x: f64) -> Self {
        x as f32
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_usize(x: usize) -> Option<Self> {
        const MAX_EXACT: usize = 1usize << 24;
        if x < MAX_EXACT {
            Some(x as f32)
        } else {
            None
        }
    }
    fn sin_cos(self) -> (Self, Self) {
        f32::sin_cos(self)
    }
    fn pi() -> Self {
        core::f32::consts::PI
    }
    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        f32::mul_add(self, a, b)
    }
}

#[allow(unconditional_recursion)]
impl Float for f64 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn from_f64(x: f64) -> Self {
        x
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn from_usize(x: usize) -> Option<Self> {
        const MAX_EXACT: usize = 1usize << 53;
        if x < MAX_EXACT {
            Some(x as f64)
        } else {
            None
        }
    }
    fn sin_cos(self) -> (Self, Self) {
        f64::sin_cos(self)
    }
    fn pi() -> Self {
        PI
    }
    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        f64::mul_add(self, a, b)
    }
}

/// A complex sample: real part `re`, imaginary part `im`.
///
/// Arithmetic is component-wise for `+`/`-`, standard complex multiplication
/// for sample products, and uniform scaling for a real factor. Nothing is
/// normalized behind the caller's back.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex<T: Float> {
    pub re: T,
    pub im: T,
}

impl<T: Float> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
    pub fn zero() -> Self {
        Self {
            re: T::zero(),
            im: T::zero(),
        }
    }
    #[inline(always)]
    pub fn expi(theta: T) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self { re: cos, im: sin }
    }
    #[inline(always)]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }
    /// Multiply both components by the real factor `k`.
    #[inline(always)]
    pub fn scale(self, k: T) -> Self {
        Self {
            re: self.re * k,
            im: self.im * k,
        }
    }
    #[inline(always)]
    pub fn norm_sqr(self) -> T {
        self.re * self.re + self.im * self.im
    }
    #[allow(clippy::should_implement_trait)]
    #[inline(always)]
    pub fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
    #[allow(clippy::should_implement_trait)]
    #[inline(always)]
    pub fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
    #[allow(clippy::should_implement_trait)]
    #[inline(always)]
    pub fn mul(self, other: Self) -> Self {
        Self {
            re: self.re.mul_add(other.re, -(self.im * other.im)),
            im: self.re.mul_add(other.im, self.im * other.re),
        }
    }
}

impl<T: Float> core::ops::Neg for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl<T: Float> core::ops::Add for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Complex::<T>::add(self, other)
    }
}

impl<T: Float> core::ops::Sub for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Complex::<T>::sub(self, other)
    }
}

impl<T: Float> core::ops::Mul for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Complex::<T>::mul(self, other)
    }
}

impl<T: Float> core::ops::Mul<T> for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, k: T) -> Self {
        self.scale(k)
    }
}

impl<T: Float> core::ops::MulAssign<T> for Complex<T> {
    #[inline(always)]
    fn mul_assign(&mut self, k: T) {
        *self = self.scale(k);
    }
}

pub type Complex32 = Complex<f32>;
pub type Complex64 = Complex<f64>;

impl From<Complex32> for Complex64 {
    fn from(c: Complex32) -> Self {
        Self::new(c.re as f64, c.im as f64)
    }
}

impl Complex64 {
    /// Narrow to single precision, as uploaded to an execution context.
    pub fn narrow(self) -> Complex32 {
        Complex32::new(self.re as f32, self.im as f32)
    }
}

/// Multiply every sample of `buf` by the real factor `k`.
pub fn scale_in_place<T: Float>(buf: &mut [Complex<T>], k: T) {
    for c in buf.iter_mut() {
        *c *= k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_product_is_not_componentwise() {
        let a = Complex64::new(1.0, -2.0);
        let b = Complex64::new(3.0, 4.0);
        let c = a * b;
        assert!((c.re - 11.0).abs() < 1e-12);
        assert!((c.im - -2.0).abs() < 1e-12);
    }

    #[test]
    fn scalar_scaling_touches_both_parts() {
        let c = Complex64::new(2.0, -4.0) * 0.5;
        assert_eq!(c, Complex64::new(1.0, -2.0));
        let mut d = Complex32::new(1.0, 1.0);
        d *= 3.0;
        assert_eq!(d, Complex32::new(3.0, 3.0));
    }

    #[test]
    fn add_sub_neg() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(0.5, -1.0);
        assert_eq!(a + b, Complex64::new(1.5, 1.0));
        assert_eq!(a - b, Complex64::new(0.5, 3.0));
        assert_eq!(-a, Complex64::new(-1.0, -2.0));
        assert_eq!(a.conj(), Complex64::new(1.0, -2.0));
        assert_eq!(a.norm_sqr(), 5.0);
    }

    #[test]
    fn precision_round_trip() {
        let c = Complex64::new(0.25, -0.75);
        assert_eq!(Complex64::from(c.narrow()), c);
        let _e = Complex64::expi(<f64 as Float>::pi());
    }
}
