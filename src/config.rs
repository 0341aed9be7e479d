//! Pipeline configuration.
//!
//! [`PipelineConfig::from_env`] applies these overrides on top of the defaults:
//!
//! | variable                 | field           |
//! |--------------------------|-----------------|
//! | `FFTPROBE_DIMENSIONS`    | `dimensions`    |
//! | `FFTPROBE_SIGNAL_LENGTH` | `signal_length` |
//! | `FFTPROBE_THREADS`       | `threads`       |
//! | `FFTPROBE_BLOCK_SIZE`    | `block_size`    |
//! | `FFTPROBE_SEED`          | `seed`          |
//!
//! Unparsable values are ignored with a warning.

use core::fmt;
use core::str::FromStr;

use crate::backend::{BackendKind, Shape};
use crate::filter::FilterKind;
use crate::signal::SignalKind;

/// Default 1-D signal length.
pub const DEFAULT_LINE_LENGTH: usize = 1024;
/// Default side of a 2-D grid.
pub const DEFAULT_GRID_SIDE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimensionality {
    #[default]
    One,
    Two,
}

impl Dimensionality {
    pub fn count(self) -> u8 {
        match self {
            Dimensionality::One => 1,
            Dimensionality::Two => 2,
        }
    }
}

impl TryFrom<u8> for Dimensionality {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Dimensionality::One),
            2 => Ok(Dimensionality::Two),
            other => Err(format!("unsupported dimensionality {other}")),
        }
    }
}

impl FromStr for Dimensionality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid dimensionality `{s}`"))?;
        Dimensionality::try_from(n)
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-D", self.count())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Samples of a 1-D signal, or the side of a 2-D grid. Fixed for the
    /// lifetime of a pipeline.
    pub signal_length: usize,
    pub dimensions: Dimensionality,
    /// Backend whose spectrum is filtered and inverted.
    pub primary: BackendKind,
    /// Backends to bring up; unavailable ones are reported, not fatal.
    pub backends: Vec<BackendKind>,
    pub signal: SignalKind,
    pub filter: FilterKind,
    pub inverted: bool,
    /// 2-D coordinate stretch `(u, v)`.
    pub scale: (f64, f64),
    pub seed: u64,
    /// Worker threads of the execution context, `0` for one per CPU.
    pub threads: usize,
    /// Butterflies per task on the execution context, `0` for its default.
    pub block_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            signal_length: DEFAULT_LINE_LENGTH,
            dimensions: Dimensionality::One,
            primary: BackendKind::Reference,
            backends: BackendKind::ALL.to_vec(),
            signal: SignalKind::default(),
            filter: FilterKind::default(),
            inverted: false,
            scale: (1.0, 1.0),
            seed: 0,
            threads: 0,
            block_size: 0,
        }
    }
}

impl PipelineConfig {
    /// 2-D defaults on a `side`×`side` grid.
    pub fn grid(side: usize) -> Self {
        Self {
            signal_length: side,
            dimensions: Dimensionality::Two,
            ..Self::default()
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let dimensions = env_or("FFTPROBE_DIMENSIONS", Dimensionality::One);
        let mut config = match dimensions {
            Dimensionality::One => Self::default(),
            Dimensionality::Two => Self::grid(DEFAULT_GRID_SIDE),
        };
        config.signal_length = env_or("FFTPROBE_SIGNAL_LENGTH", config.signal_length);
        config.threads = env_or("FFTPROBE_THREADS", config.threads);
        config.block_size = env_or("FFTPROBE_BLOCK_SIZE", config.block_size);
        config.seed = env_or("FFTPROBE_SEED", config.seed);
        config
    }

    pub fn shape(&self) -> Shape {
        match self.dimensions {
            Dimensionality::One => Shape::Line(self.signal_length),
            Dimensionality::Two => Shape::Grid(self.signal_length),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.signal_length < 2 {
            return Err(format!(
                "signal length must be at least 2, got {}",
                self.signal_length
            ));
        }
        if self.signal_length % 2 != 0 {
            return Err(format!(
                "signal length must be even, got {}",
                self.signal_length
            ));
        }
        if self.backends.is_empty() {
            return Err("no backends enabled".into());
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring {key}={raw:?}: not a valid value");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.shape(), Shape::Line(1024));
        assert_eq!(c.primary, BackendKind::Reference);
        assert_eq!(c.backends.len(), 3);
        assert!(c.validate().is_ok());
        assert_eq!(PipelineConfig::grid(16).shape(), Shape::Grid(16));
    }

    #[test]
    fn odd_or_tiny_lengths_are_rejected() {
        let mut c = PipelineConfig::default();
        c.signal_length = 7;
        assert!(c.validate().is_err());
        c.signal_length = 0;
        assert!(c.validate().is_err());
        c.signal_length = 12;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn dimensionality_parsing() {
        assert_eq!("2".parse::<Dimensionality>(), Ok(Dimensionality::Two));
        assert!("3".parse::<Dimensionality>().is_err());
        assert_eq!(Dimensionality::Two.to_string(), "2-D");
    }
}
