//! The transform-backend capability.
//!
//! A backend computes forward and inverse DFTs over a fixed [`Shape`]. Backends
//! disagree on scaling, so each declares its native [`Normalization`] and the
//! provided [`TransformBackend::forward_canonical`] /
//! [`TransformBackend::inverse_canonical`] methods convert to the crate-wide
//! canonical convention ([`Normalization::CANONICAL`]): forward output scaled
//! by `1/N`, inverse unscaled. Everything the pipeline compares is canonical.

use core::fmt;
use core::str::FromStr;

use crate::device::DeviceError;
use crate::external::LibraryError;
use crate::fft::{FftError, ReferenceFft};
use crate::ndfft::transform_grid;
use crate::num::{scale_in_place, Complex64};

/// Extent of the signals a backend instance transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// 1-D signal of `n` samples.
    Line(usize),
    /// 2-D row-major `n`×`n` grid.
    Grid(usize),
}

impl Shape {
    /// Total sample count.
    pub fn len(self) -> usize {
        match self {
            Shape::Line(n) => n,
            Shape::Grid(n) => n * n,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Length of one axis.
    pub fn side(self) -> usize {
        match self {
            Shape::Line(n) | Shape::Grid(n) => n,
        }
    }

    pub fn dimensions(self) -> u8 {
        match self {
            Shape::Line(_) => 1,
            Shape::Grid(_) => 2,
        }
    }
}

/// Scale factors a backend natively applies, in terms of the total sample
/// count `N` (the product of the dimensions for grids).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Forward unscaled, inverse `1/N`.
    Backward,
    /// Forward `1/N`, inverse unscaled.
    Forward,
    /// Both directions `1/√N`.
    Ortho,
    /// Neither direction scaled: a round trip multiplies by `N`.
    Unnormalized,
}

impl Normalization {
    pub const CANONICAL: Normalization = Normalization::Forward;

    pub fn forward_scale(self, n: usize) -> f64 {
        match self {
            Normalization::Backward | Normalization::Unnormalized => 1.0,
            Normalization::Forward => 1.0 / n as f64,
            Normalization::Ortho => 1.0 / (n as f64).sqrt(),
        }
    }

    pub fn inverse_scale(self, n: usize) -> f64 {
        match self {
            Normalization::Forward | Normalization::Unnormalized => 1.0,
            Normalization::Backward => 1.0 / n as f64,
            Normalization::Ortho => 1.0 / (n as f64).sqrt(),
        }
    }

    /// Factor turning this convention's forward output into canonical output.
    pub fn forward_correction(self, n: usize) -> f64 {
        Self::CANONICAL.forward_scale(n) / self.forward_scale(n)
    }

    /// Factor turning this convention's inverse output into canonical output.
    pub fn inverse_correction(self, n: usize) -> f64 {
        Self::CANONICAL.inverse_scale(n) / self.inverse_scale(n)
    }

    /// Gain of `inverse(forward(x))` under this convention.
    pub fn round_trip_gain(self, n: usize) -> f64 {
        n as f64 * self.forward_scale(n) * self.inverse_scale(n)
    }
}

/// Execution substrate of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    /// Plain sequential arithmetic.
    Reference,
    /// Kernels dispatched on an execution context.
    Accelerated,
    /// Third-party FFT library used as ground truth.
    External,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Reference,
        BackendKind::Accelerated,
        BackendKind::External,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Reference => "reference",
            BackendKind::Accelerated => "accelerated",
            BackendKind::External => "external",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown backend `{s}`"))
    }
}

/// Failure of a single backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    Transform(FftError),
    Device(DeviceError),
    Library(LibraryError),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transform(e) => write!(f, "transform failed: {e}"),
            BackendError::Device(e) => write!(f, "execution context failed: {e}"),
            BackendError::Library(e) => write!(f, "reference library failed: {e}"),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Transform(e) => Some(e),
            BackendError::Device(e) => Some(e),
            BackendError::Library(e) => Some(e),
        }
    }
}

impl From<FftError> for BackendError {
    fn from(e: FftError) -> Self {
        BackendError::Transform(e)
    }
}

impl From<DeviceError> for BackendError {
    fn from(e: DeviceError) -> Self {
        BackendError::Device(e)
    }
}

impl From<LibraryError> for BackendError {
    fn from(e: LibraryError) -> Self {
        BackendError::Library(e)
    }
}

/// Forward/inverse DFT capability over a fixed [`Shape`].
///
/// Implementations write into `output` and never retain `input` or `output`
/// past the call.
pub trait TransformBackend {
    fn kind(&self) -> BackendKind;
    fn shape(&self) -> Shape;
    /// Scaling this backend applies natively.
    fn normalization(&self) -> Normalization;

    /// Forward transform in the native convention.
    fn forward(&mut self, input: &[Complex64], output: &mut [Complex64])
        -> Result<(), BackendError>;

    /// Inverse transform in the native convention.
    fn inverse(&mut self, input: &[Complex64], output: &mut [Complex64])
        -> Result<(), BackendError>;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// One-line description of the backend and what it runs on.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Forward transform rescaled to [`Normalization::CANONICAL`].
    fn forward_canonical(
        &mut self,
        input: &[Complex64],
        output: &mut [Complex64],
    ) -> Result<(), BackendError> {
        self.forward(input, output)?;
        let k = self.normalization().forward_correction(self.shape().len());
        if k != 1.0 {
            scale_in_place(output, k);
        }
        Ok(())
    }

    /// Inverse transform of a canonical spectrum, rescaled to
    /// [`Normalization::CANONICAL`].
    fn inverse_canonical(
        &mut self,
        input: &[Complex64],
        output: &mut [Complex64],
    ) -> Result<(), BackendError> {
        self.inverse(input, output)?;
        let k = self.normalization().inverse_correction(self.shape().len());
        if k != 1.0 {
            scale_in_place(output, k);
        }
        Ok(())
    }
}

/// Check that both buffers match `shape`.
pub(crate) fn check_buffers(
    shape: Shape,
    input: &[Complex64],
    output: &[Complex64],
) -> Result<(), FftError> {
    if shape.is_empty() {
        return Err(FftError::EmptyInput);
    }
    if input.len() != shape.len() || output.len() != shape.len() {
        return Err(FftError::MismatchedLengths);
    }
    Ok(())
}

/// Sequential double-precision backend built on [`ReferenceFft`].
pub struct ReferenceBackend {
    shape: Shape,
    fft: ReferenceFft<f64>,
    column: Vec<Complex64>,
}

impl ReferenceBackend {
    pub fn new(shape: Shape) -> Self {
        let column = match shape {
            Shape::Line(_) => Vec::new(),
            Shape::Grid(n) => vec![Complex64::zero(); n],
        };
        Self {
            shape,
            fft: ReferenceFft::default(),
            column,
        }
    }

    fn run(
        &mut self,
        input: &[Complex64],
        output: &mut [Complex64],
        inverse: bool,
    ) -> Result<(), BackendError> {
        check_buffers(self.shape, input, output)?;
        output.copy_from_slice(input);
        let Self { shape, fft, column } = self;
        let line = |l: &mut [Complex64]| if inverse { fft.ifft(l) } else { fft.fft(l) };
        match *shape {
            Shape::Line(_) => line(output)?,
            Shape::Grid(n) => transform_grid(output, n, n, &mut column[..], line)?,
        }
        Ok(())
    }
}

impl TransformBackend for ReferenceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Reference
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn normalization(&self) -> Normalization {
        Normalization::Backward
    }

    fn forward(
        &mut self,
        input: &[Complex64],
        output: &mut [Complex64],
    ) -> Result<(), BackendError> {
        self.run(input, output, false)
    }

    fn inverse(
        &mut self,
        input: &[Complex64],
        output: &mut [Complex64],
    ) -> Result<(), BackendError> {
        self.run(input, output, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_convention_round_trips() {
        for norm in [
            Normalization::Backward,
            Normalization::Forward,
            Normalization::Ortho,
            Normalization::Unnormalized,
        ] {
            let n = 64;
            let fwd = norm.forward_scale(n) * norm.forward_correction(n);
            let inv = norm.inverse_scale(n) * norm.inverse_correction(n);
            assert!((fwd - 1.0 / 64.0).abs() < 1e-15, "{norm:?}");
            assert!((inv - 1.0).abs() < 1e-15, "{norm:?}");
        }
        assert_eq!(Normalization::Unnormalized.round_trip_gain(8), 8.0);
        assert!((Normalization::Ortho.round_trip_gain(8) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn reference_line_dc_is_mean_in_canonical_form() {
        let mut backend = ReferenceBackend::new(Shape::Line(8));
        let input = vec![Complex64::new(2.0, 0.0); 8];
        let mut spectrum = vec![Complex64::zero(); 8];
        backend.forward_canonical(&input, &mut spectrum).unwrap();
        assert!((spectrum[0].re - 2.0).abs() < 1e-12);
        let mut back = vec![Complex64::zero(); 8];
        backend.inverse_canonical(&spectrum, &mut back).unwrap();
        for c in &back {
            assert!((c.re - 2.0).abs() < 1e-12 && c.im.abs() < 1e-12);
        }
    }

    #[test]
    fn reference_grid_round_trip() {
        let mut backend = ReferenceBackend::new(Shape::Grid(4));
        let input: Vec<Complex64> = (0..16).map(|i| Complex64::new(i as f64, 1.0)).collect();
        let mut spectrum = vec![Complex64::zero(); 16];
        let mut back = vec![Complex64::zero(); 16];
        backend.forward(&input, &mut spectrum).unwrap();
        backend.inverse(&spectrum, &mut back).unwrap();
        for (a, b) in back.iter().zip(&input) {
            assert!((*a - *b).norm_sqr() < 1e-20);
        }
    }

    #[test]
    fn wrong_buffer_length_is_reported() {
        let mut backend = ReferenceBackend::new(Shape::Line(8));
        let input = vec![Complex64::zero(); 4];
        let mut out = vec![Complex64::zero(); 8];
        assert_eq!(
            backend.forward(&input, &mut out),
            Err(BackendError::Transform(FftError::MismatchedLengths))
        );
    }

    #[test]
    fn kind_names_parse() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>(), Ok(kind));
        }
        assert_eq!(Shape::Grid(16).len(), 256);
        assert_eq!(Shape::Line(1024).dimensions(), 1);
    }
}
