//! External reference library used as ground truth.
//!
//! [`ReferenceLibrary`] is the boundary to a third-party FFT: an in-place
//! forward/inverse pair with a declared [`Normalization`]. With the
//! `reference-fft` feature, [`RustFftLibrary`] adapts
//! [`rustfft`](https://crates.io/crates/rustfft).

use core::fmt;

use crate::backend::{check_buffers, BackendError, BackendKind, Normalization, Shape, TransformBackend};
use crate::ndfft::transform_grid;
use crate::num::Complex64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// The library is not linked into this build or failed to initialise.
    Unavailable(String),
    UnsupportedLength(usize),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Unavailable(reason) => write!(f, "reference library unavailable: {reason}"),
            LibraryError::UnsupportedLength(n) => {
                write!(f, "reference library cannot transform length {n}")
            }
        }
    }
}

impl std::error::Error for LibraryError {}

/// Classic 1-D FFT provided by an external library.
pub trait ReferenceLibrary {
    fn name(&self) -> &str;
    fn normalization(&self) -> Normalization;
    fn forward(&mut self, data: &mut [Complex64]) -> Result<(), LibraryError>;
    fn inverse(&mut self, data: &mut [Complex64]) -> Result<(), LibraryError>;
}

/// The default library for this build, if one is compiled in.
pub fn default_library() -> Result<Box<dyn ReferenceLibrary>, LibraryError> {
    #[cfg(feature = "reference-fft")]
    {
        Ok(Box::new(RustFftLibrary::new()))
    }
    #[cfg(not(feature = "reference-fft"))]
    {
        Err(LibraryError::Unavailable(
            "built without the `reference-fft` feature".into(),
        ))
    }
}

#[cfg(feature = "reference-fft")]
pub use self::rustfft_impl::RustFftLibrary;

#[cfg(feature = "reference-fft")]
mod rustfft_impl {
    use super::*;
    use rustfft::num_complex::Complex;
    use rustfft::FftPlanner;

    /// `rustfft` adapter. Neither direction is scaled.
    pub struct RustFftLibrary {
        planner: FftPlanner<f64>,
        buffer: Vec<Complex<f64>>,
    }

    impl Default for RustFftLibrary {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RustFftLibrary {
        pub fn new() -> Self {
            Self {
                planner: FftPlanner::new(),
                buffer: Vec::new(),
            }
        }

        fn process(&mut self, data: &mut [Complex64], inverse: bool) -> Result<(), LibraryError> {
            let n = data.len();
            if n == 0 {
                return Err(LibraryError::UnsupportedLength(0));
            }
            let fft = if inverse {
                self.planner.plan_fft_inverse(n)
            } else {
                self.planner.plan_fft_forward(n)
            };
            self.buffer.clear();
            self.buffer
                .extend(data.iter().map(|c| Complex::new(c.re, c.im)));
            fft.process(&mut self.buffer);
            for (dst, src) in data.iter_mut().zip(&self.buffer) {
                *dst = Complex64::new(src.re, src.im);
            }
            Ok(())
        }
    }

    impl ReferenceLibrary for RustFftLibrary {
        fn name(&self) -> &str {
            "rustfft"
        }

        fn normalization(&self) -> Normalization {
            Normalization::Unnormalized
        }

        fn forward(&mut self, data: &mut [Complex64]) -> Result<(), LibraryError> {
            self.process(data, false)
        }

        fn inverse(&mut self, data: &mut [Complex64]) -> Result<(), LibraryError> {
            self.process(data, true)
        }
    }
}

/// Backend delegating to a [`ReferenceLibrary`]; grids are transformed rows
/// then columns.
pub struct ExternalBackend {
    shape: Shape,
    library: Box<dyn ReferenceLibrary>,
    column: Vec<Complex64>,
}

impl ExternalBackend {
    pub fn new(library: Box<dyn ReferenceLibrary>, shape: Shape) -> Self {
        let column = match shape {
            Shape::Line(_) => Vec::new(),
            Shape::Grid(n) => vec![Complex64::zero(); n],
        };
        log::info!("external backend using {}", library.name());
        Self {
            shape,
            library,
            column,
        }
    }

    pub fn library_name(&self) -> &str {
        self.library.name()
    }

    fn run(&mut self, input: &[Complex64], output: &mut [Complex64], inverse: bool) -> Result<(), BackendError> {
        check_buffers(self.shape, input, output)?;
        output.copy_from_slice(input);
        let Self {
            shape,
            library,
            column,
        } = self;
        let mut line = |l: &mut [Complex64]| -> Result<(), BackendError> {
            if inverse {
                library.inverse(l)?;
            } else {
                library.forward(l)?;
            }
            Ok(())
        };
        match *shape {
            Shape::Line(_) => line(output),
            Shape::Grid(n) => transform_grid(output, n, n, &mut column[..], line),
        }
    }
}

impl TransformBackend for ExternalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::External
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn normalization(&self) -> Normalization {
        self.library.normalization()
    }

    fn describe(&self) -> String {
        format!("external via {}", self.library_name())
    }

    fn forward(&mut self, input: &[Complex64], output: &mut [Complex64]) -> Result<(), BackendError> {
        self.run(input, output, false)
    }

    fn inverse(&mut self, input: &[Complex64], output: &mut [Complex64]) -> Result<(), BackendError> {
        self.run(input, output, true)
    }
}

#[cfg(all(test, feature = "reference-fft"))]
mod tests {
    use super::*;
    use crate::backend::ReferenceBackend;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random(n: usize, seed: u64) -> Vec<Complex64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    #[test]
    fn rustfft_round_trip_gains_n() {
        let mut lib = RustFftLibrary::new();
        let input = random(32, 1);
        let mut data = input.clone();
        lib.forward(&mut data).unwrap();
        lib.inverse(&mut data).unwrap();
        for (a, b) in data.iter().zip(&input) {
            assert!((a.re - 32.0 * b.re).abs() < 1e-9);
            assert!((a.im - 32.0 * b.im).abs() < 1e-9);
        }
    }

    #[test]
    fn canonical_output_matches_reference_on_non_power_of_two_grid() {
        let shape = Shape::Grid(6);
        let input = random(shape.len(), 2);
        let mut ext = ExternalBackend::new(Box::new(RustFftLibrary::new()), shape);
        let mut reference = ReferenceBackend::new(shape);
        let mut a = vec![Complex64::zero(); shape.len()];
        let mut b = vec![Complex64::zero(); shape.len()];
        ext.forward_canonical(&input, &mut a).unwrap();
        reference.forward_canonical(&input, &mut b).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((*x - *y).norm_sqr() < 1e-20);
        }
    }

    #[test]
    fn describes_its_library() {
        let ext = ExternalBackend::new(Box::new(RustFftLibrary::new()), Shape::Line(16));
        assert_eq!(ext.library_name(), "rustfft");
        assert_eq!(ext.describe(), "external via rustfft");
    }

    #[test]
    fn empty_shape_is_rejected() {
        let mut ext = ExternalBackend::new(Box::new(RustFftLibrary::new()), Shape::Line(0));
        let r = ext.forward(&[], &mut []);
        assert!(matches!(r, Err(BackendError::Transform(_))));
    }
}
