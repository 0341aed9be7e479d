//! The validation pipeline.
//!
//! A [`Pipeline`] owns every buffer and backend for one signal shape. Each
//! [`Pipeline::tick`] is an independent cycle:
//!
//! 1. generate the input signal for the current time,
//! 2. run every active backend's canonical forward transform on it,
//! 3. compare the spectra pairwise,
//! 4. filter the primary spectrum (or, when inverted, the accelerated one),
//! 5. invert the filtered spectrum with the primary backend.
//!
//! Backends are acquired in [`BackendKind::ALL`] order during
//! [`Pipeline::initialize`] and released in reverse order by
//! [`Pipeline::shutdown`] or on drop. A backend whose substrate is missing is
//! left out and recorded as a [`ConfigFault`]; it never fails the pipeline.

use core::fmt;

use crate::accel::AcceleratedBackend;
use crate::backend::{BackendError, BackendKind, ReferenceBackend, Shape, TransformBackend};
use crate::config::PipelineConfig;
use crate::device::{DeviceError, ExecutionContext};
use crate::external::{default_library, ExternalBackend, LibraryError, ReferenceLibrary};
use crate::filter::{self, FilterKind};
use crate::num::Complex64;
use crate::signal::{SignalGenerator, SignalKind};
use crate::validate::{compare, Discrepancy};

/// Lifecycle of a [`Pipeline`].
///
/// A running tick holds `&mut Pipeline` until it returns, so it has no
/// observable state of its own and the pipeline is `Ready` before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    Disposed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    InvalidConfig(String),
    /// `tick` before `initialize`.
    NotReady,
    AlreadyInitialized,
    Disposed,
    /// No backend could be brought up.
    NoBackend,
    Backend {
        kind: BackendKind,
        source: BackendError,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            PipelineError::NotReady => write!(f, "pipeline has not been initialized"),
            PipelineError::AlreadyInitialized => write!(f, "pipeline is already initialized"),
            PipelineError::Disposed => write!(f, "pipeline has been shut down"),
            PipelineError::NoBackend => write!(f, "no transform backend is available"),
            PipelineError::Backend { kind, source } => write!(f, "{kind} backend: {source}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Backend { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A capability that could not be provided at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFault {
    pub backend: BackendKind,
    pub reason: String,
}

impl fmt::Display for ConfigFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} backend: {}", self.backend, self.reason)
    }
}

/// Optional external collaborators handed to [`Pipeline::initialize`].
pub struct Substrates {
    pub context: Result<Box<dyn ExecutionContext>, DeviceError>,
    pub library: Result<Box<dyn ReferenceLibrary>, LibraryError>,
}

impl Substrates {
    /// Whatever this build provides: the rayon thread pool with the
    /// `parallel` feature and `rustfft` with `reference-fft`.
    pub fn detect(config: &PipelineConfig) -> Self {
        Self {
            context: default_context(config),
            library: default_library(),
        }
    }

    /// No execution context and no library; only the reference backend.
    pub fn none() -> Self {
        Self {
            context: Err(DeviceError::Unavailable("not provided".into())),
            library: Err(LibraryError::Unavailable("not provided".into())),
        }
    }
}

#[cfg(feature = "parallel")]
fn default_context(config: &PipelineConfig) -> Result<Box<dyn ExecutionContext>, DeviceError> {
    let ctx = crate::device::ThreadPoolContext::new(config.threads)?.with_block_size(config.block_size);
    Ok(Box::new(ctx))
}

#[cfg(not(feature = "parallel"))]
fn default_context(_config: &PipelineConfig) -> Result<Box<dyn ExecutionContext>, DeviceError> {
    Err(DeviceError::Unavailable(
        "built without the `parallel` feature".into(),
    ))
}

/// Discrepancy between the canonical spectra of two backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub lhs: BackendKind,
    pub rhs: BackendKind,
    pub discrepancy: Discrepancy,
}

/// Everything one tick produced. Spectra are canonical and in natural
/// transform order.
#[derive(Debug)]
pub struct TickReport<'a> {
    pub time: f64,
    pub primary: BackendKind,
    pub input: &'a [Complex64],
    /// Filtered spectrum fed to the inverse transform.
    pub spectrum: &'a [Complex64],
    pub reconstructed: &'a [Complex64],
    /// The headline comparison: accelerated against external on grids,
    /// primary against accelerated on lines, otherwise the first pair.
    pub discrepancy: Option<Discrepancy>,
    pub comparisons: &'a [Comparison],
}

pub struct Pipeline {
    config: PipelineConfig,
    state: PipelineState,
    /// In acquisition order.
    backends: Vec<Box<dyn TransformBackend>>,
    primary: usize,
    faults: Vec<ConfigFault>,
    generator: SignalGenerator,
    input: Vec<Complex64>,
    spectra: Vec<Vec<Complex64>>,
    filtered: Vec<Complex64>,
    reconstructed: Vec<Complex64>,
    comparisons: Vec<Comparison>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::InvalidConfig)?;
        let generator = SignalGenerator::new(config.seed);
        Ok(Self {
            config,
            state: PipelineState::Uninitialized,
            backends: Vec::new(),
            primary: 0,
            faults: Vec::new(),
            generator,
            input: Vec::new(),
            spectra: Vec::new(),
            filtered: Vec::new(),
            reconstructed: Vec::new(),
            comparisons: Vec::new(),
        })
    }

    /// [`Pipeline::new`] followed by [`Pipeline::initialize`] with the
    /// substrates this build provides.
    pub fn start(config: PipelineConfig) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new(config)?;
        let substrates = Substrates::detect(&pipeline.config);
        pipeline.initialize(substrates)?;
        Ok(pipeline)
    }

    /// Acquire backends and allocate buffers.
    ///
    /// Unavailable substrates are recorded in [`Pipeline::faults`] and logged
    /// once; only an empty backend set is an error.
    pub fn initialize(&mut self, substrates: Substrates) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Uninitialized => {}
            PipelineState::Ready => return Err(PipelineError::AlreadyInitialized),
            PipelineState::Disposed => return Err(PipelineError::Disposed),
        }
        let shape = self.config.shape();
        let Substrates { context, library } = substrates;
        let mut context = Some(context);
        let mut library = Some(library);

        for kind in BackendKind::ALL {
            if !self.config.backends.contains(&kind) {
                continue;
            }
            let acquired: Result<Box<dyn TransformBackend>, String> = match kind {
                BackendKind::Reference => Ok(Box::new(ReferenceBackend::new(shape))),
                BackendKind::Accelerated => match context.take() {
                    Some(Ok(ctx)) => AcceleratedBackend::new(ctx, shape)
                        .map(|b| Box::new(b) as Box<dyn TransformBackend>)
                        .map_err(|e| e.to_string()),
                    Some(Err(e)) => Err(e.to_string()),
                    None => Err("execution context already taken".into()),
                },
                BackendKind::External => match library.take() {
                    Some(Ok(lib)) => Ok(Box::new(ExternalBackend::new(lib, shape))),
                    Some(Err(e)) => Err(e.to_string()),
                    None => Err("reference library already taken".into()),
                },
            };
            match acquired {
                Ok(backend) => {
                    log::info!("acquired {kind} backend for {shape:?}");
                    self.backends.push(backend);
                }
                Err(reason) => self.record_fault(kind, reason),
            }
        }

        if self.backends.is_empty() {
            return Err(PipelineError::NoBackend);
        }
        self.primary = match self.position(self.config.primary) {
            Some(i) => i,
            None => {
                let fallback = self.backends[0].kind();
                self.record_fault(
                    self.config.primary,
                    format!("selected as primary but not active; using {fallback}"),
                );
                0
            }
        };

        let len = shape.len();
        self.input = vec![Complex64::zero(); len];
        self.spectra = vec![vec![Complex64::zero(); len]; self.backends.len()];
        self.filtered = vec![Complex64::zero(); len];
        self.reconstructed = vec![Complex64::zero(); len];
        self.comparisons = Vec::with_capacity(3);
        self.state = PipelineState::Ready;
        Ok(())
    }

    fn record_fault(&mut self, backend: BackendKind, reason: String) {
        let fault = ConfigFault { backend, reason };
        log::warn!("configuration fault: {fault}");
        self.faults.push(fault);
    }

    fn position(&self, kind: BackendKind) -> Option<usize> {
        self.backends.iter().position(|b| b.kind() == kind)
    }

    pub fn set_signal(&mut self, signal: SignalKind) {
        self.config.signal = signal;
    }

    pub fn set_filter(&mut self, filter: FilterKind, inverted: bool) {
        self.config.filter = filter;
        self.config.inverted = inverted;
    }

    /// Coordinate stretch for generated grids; ignored for 1-D signals.
    pub fn set_scale(&mut self, u: f64, v: f64) {
        self.config.scale = (u, v);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn shape(&self) -> Shape {
        self.config.shape()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn faults(&self) -> &[ConfigFault] {
        &self.faults
    }

    /// Active backends in acquisition order.
    pub fn backends(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// [`TransformBackend::describe`] of every active backend, in
    /// acquisition order.
    pub fn backend_descriptions(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.describe()).collect()
    }

    pub fn primary(&self) -> Option<BackendKind> {
        self.backends.get(self.primary).map(|b| b.kind())
    }

    /// Unfiltered canonical spectrum `kind` produced in the last tick.
    pub fn spectrum_of(&self, kind: BackendKind) -> Option<&[Complex64]> {
        self.position(kind).map(|i| self.spectra[i].as_slice())
    }

    /// Run one full cycle at time `t`.
    pub fn tick(&mut self, t: f64) -> Result<TickReport<'_>, PipelineError> {
        match self.state {
            PipelineState::Ready => {}
            PipelineState::Uninitialized => return Err(PipelineError::NotReady),
            PipelineState::Disposed => return Err(PipelineError::Disposed),
        }
        let shape = self.config.shape();
        let PipelineConfig {
            signal,
            filter: filter_kind,
            inverted,
            scale,
            ..
        } = self.config;

        match shape {
            Shape::Line(_) => self.generator.fill(signal, t, &mut self.input),
            Shape::Grid(n) => self
                .generator
                .fill_grid(signal, t, n, scale, &mut self.input),
        }
        log::debug!("t={t:.3}: generated {signal} input");

        for (backend, spectrum) in self.backends.iter_mut().zip(&mut self.spectra) {
            backend
                .forward_canonical(&self.input, spectrum)
                .map_err(|source| PipelineError::Backend {
                    kind: backend.kind(),
                    source,
                })?;
        }
        log::debug!("t={t:.3}: forward transforms done on {} backends", self.backends.len());

        self.comparisons.clear();
        for i in 0..self.backends.len() {
            for j in i + 1..self.backends.len() {
                self.comparisons.push(Comparison {
                    lhs: self.backends[i].kind(),
                    rhs: self.backends[j].kind(),
                    discrepancy: compare(&self.spectra[i], &self.spectra[j]),
                });
            }
        }
        let discrepancy = self.headline();

        let source = match self.position(BackendKind::Accelerated) {
            Some(accel) if inverted => accel,
            _ => self.primary,
        };
        let grid_side = match shape {
            Shape::Line(_) => None,
            Shape::Grid(n) => Some(n),
        };
        filter::apply_into(
            &self.spectra[source],
            &mut self.filtered,
            grid_side,
            filter_kind,
            inverted,
        );
        log::debug!(
            "t={t:.3}: applied {filter_kind} filter to the {} spectrum",
            self.backends[source].kind()
        );

        let primary = &mut self.backends[self.primary];
        primary
            .inverse_canonical(&self.filtered, &mut self.reconstructed)
            .map_err(|source| PipelineError::Backend {
                kind: primary.kind(),
                source,
            })?;
        if let Some(d) = discrepancy {
            log::debug!("t={t:.3}: {d}");
        }

        Ok(TickReport {
            time: t,
            primary: primary.kind(),
            input: &self.input,
            spectrum: &self.filtered,
            reconstructed: &self.reconstructed,
            discrepancy,
            comparisons: &self.comparisons,
        })
    }

    fn headline(&self) -> Option<Discrepancy> {
        let primary = self.backends[self.primary].kind();
        let preferred = match self.config.shape() {
            Shape::Grid(_) => (BackendKind::Accelerated, BackendKind::External),
            Shape::Line(_) => (primary, BackendKind::Accelerated),
        };
        self.comparisons
            .iter()
            .find(|c| {
                (c.lhs, c.rhs) == preferred || (c.rhs, c.lhs) == preferred
            })
            .or_else(|| self.comparisons.first())
            .map(|c| c.discrepancy)
    }

    /// Release every backend in reverse acquisition order. Safe to call more
    /// than once.
    pub fn shutdown(&mut self) {
        if self.state == PipelineState::Disposed {
            return;
        }
        while let Some(backend) = self.backends.pop() {
            let kind = backend.kind();
            drop(backend);
            log::info!("released {kind} backend");
        }
        self.spectra.clear();
        self.comparisons.clear();
        self.state = PipelineState::Disposed;
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
