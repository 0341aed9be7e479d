//! # fftprobe - FFT backend validation harness
//!
//! Cross-validates discrete Fourier transform implementations through a
//! generate → transform → filter → reconstruct pipeline and reports how far
//! the backends disagree.
//!
//! ## Features
//!
//! - **🔁 Three interchangeable backends**: sequential reference FFT,
//!   kernels dispatched on an execution context, and an external ground-truth
//!   library
//! - **📏 Explicit normalization**: every backend declares its scaling and
//!   results are converted to one canonical convention before comparison
//! - **🎛️ Frequency filters** with hard cutoffs and smooth tapers
//! - **📊 1-D and 2-D** signals (`N` samples or `N`×`N` grids)
//!
//! ## Cargo Features
//!
//! - `parallel` (default): rayon thread-pool execution context for the
//!   accelerated backend
//! - `reference-fft` (default): `rustfft` as the external reference library
//!
//! Without a feature the matching backend is simply absent and reported as a
//! configuration fault.
//!
//! ## Example
//!
//! ```
//! use fftprobe::{FilterKind, Pipeline, PipelineConfig, SignalKind};
//!
//! let mut pipeline = Pipeline::start(PipelineConfig::default()).unwrap();
//! pipeline.set_signal(SignalKind::Sinc);
//! pipeline.set_filter(FilterKind::None, false);
//! let report = pipeline.tick(0.0).unwrap();
//! assert_eq!(report.input[512].re, 1.0);
//! if let Some(d) = report.discrepancy {
//!     assert!(d.is_within(1e-6));
//! }
//! ```
//!
//! Run the demos with:
//! ```bash
//! cargo run --example basic_usage
//! cargo run --example grid_check
//! RUST_LOG=debug cargo run --example verbose_logging
//! ```

/// Complex samples and the float abstraction.
pub mod num;

/// Frequency index mapping shared by filtering and display.
pub mod freq;

pub mod signal;

/// Sequential reference FFT.
pub mod fft;

/// Row-column 2-D transforms.
pub mod ndfft;

/// Transform-backend capability and the reference backend.
pub mod backend;

/// Execution-context capability for accelerated kernels.
pub mod device;

pub mod accel;

/// External reference library.
pub mod external;

pub mod filter;

pub mod validate;

pub mod config;

pub mod pipeline;

pub use accel::AcceleratedBackend;
pub use backend::{BackendError, BackendKind, Normalization, ReferenceBackend, Shape, TransformBackend};
pub use config::{Dimensionality, PipelineConfig};
pub use device::{BufferId, DeviceError, ExecutionContext, Kernel};
#[cfg(feature = "parallel")]
pub use device::ThreadPoolContext;
pub use external::{ExternalBackend, LibraryError, ReferenceLibrary};
#[cfg(feature = "reference-fft")]
pub use external::RustFftLibrary;
pub use fft::FftError;
pub use filter::FilterKind;
pub use num::{Complex, Complex32, Complex64, Float};
pub use pipeline::{Comparison, ConfigFault, Pipeline, PipelineError, PipelineState, Substrates, TickReport};
pub use signal::{SignalGenerator, SignalKind};
pub use validate::{compare, Discrepancy};
