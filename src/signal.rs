//! Synthetic test signals.
//!
//! Each [`SignalKind`] is a closed-form waveform of the sample index and a
//! time parameter `t`, except [`SignalKind::Random`] which draws independent
//! samples from `U[0, 1)`. Generated samples are real: the imaginary part of
//! every written sample is zeroed.

use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::num::Complex64;

/// Phase velocity (samples per second) of the square and sawtooth waves.
const SCROLL_RATE: f64 = 50.0;

/// Period, in samples, of the sawtooth wave.
const SAW_PERIOD: f64 = 128.0;

/// Waveform family of a generated signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalKind {
    #[default]
    Square,
    Sine,
    Sawtooth,
    Sinc,
    Random,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::Square,
        SignalKind::Sine,
        SignalKind::Sawtooth,
        SignalKind::Sinc,
        SignalKind::Random,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SignalKind::Square => "square",
            SignalKind::Sine => "sine",
            SignalKind::Sawtooth => "sawtooth",
            SignalKind::Sinc => "sinc",
            SignalKind::Random => "random",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown signal kind `{s}`"))
    }
}

/// Frequency sweep `k(t) = 4(1 + sin t)` shared by the sine and sinc waves.
#[inline]
fn sweep(t: f64) -> f64 {
    4.0 * (1.0 + t.sin())
}

/// Evaluate a deterministic waveform at (possibly fractional) position `x` of
/// an `n`-sample signal.
///
/// Returns `None` for [`SignalKind::Random`], which has no closed form.
pub fn waveform(kind: SignalKind, x: f64, n: usize, t: f64) -> Option<f64> {
    let n = n as f64;
    let value = match kind {
        SignalKind::Square => {
            let phase = (x + SCROLL_RATE * t) % (n / 2.0);
            0.5 * t.sin() + if phase < n / 4.0 { 0.5 } else { -0.5 }
        }
        SignalKind::Sine => (sweep(t) * 2.0 * PI * x / n).cos(),
        SignalKind::Sawtooth => {
            0.5 * t.sin() + ((((x + SCROLL_RATE * t) / SAW_PERIOD) % 1.0) - 0.5)
        }
        SignalKind::Sinc => {
            let a = sweep(t) * 2.0 * PI * (x - n / 2.0) * 2.0 / n;
            // sin(a)/a has limit 1 at the singular point
            if a.abs() > 0.0 {
                a.sin() / a
            } else {
                1.0
            }
        }
        SignalKind::Random => return None,
    };
    Some(value)
}

/// Fills signal buffers in place.
///
/// The only state is the random source used by [`SignalKind::Random`]; it is
/// seeded so runs are reproducible.
pub struct SignalGenerator {
    rng: StdRng,
}

impl SignalGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Overwrite `buf` with `kind` evaluated at time `t`.
    pub fn fill(&mut self, kind: SignalKind, t: f64, buf: &mut [Complex64]) {
        let n = buf.len();
        for (i, sample) in buf.iter_mut().enumerate() {
            let value = match waveform(kind, i as f64, n, t) {
                Some(v) => v,
                None => self.rng.gen::<f64>(),
            };
            *sample = Complex64::new(value, 0.0);
        }
    }

    /// Overwrite a row-major `size`×`size` grid with the separable product of
    /// `kind` along both axes.
    ///
    /// Coordinates are stretched by `scale = (u, v)` before evaluation, so a
    /// scale of `(1, 1)` reproduces the 1-D waveform along each axis.
    ///
    /// # Panics
    /// Panics if `buf.len() != size * size`.
    pub fn fill_grid(
        &mut self,
        kind: SignalKind,
        t: f64,
        size: usize,
        scale: (f64, f64),
        buf: &mut [Complex64],
    ) {
        assert_eq!(buf.len(), size * size, "grid buffer length mismatch");
        for (y, row) in buf.chunks_exact_mut(size).enumerate() {
            let wy = waveform(kind, y as f64 * scale.1, size, t);
            for (x, sample) in row.iter_mut().enumerate() {
                let value = match (wy, waveform(kind, x as f64 * scale.0, size, t)) {
                    (Some(a), Some(b)) => a * b,
                    _ => self.rng.gen::<f64>(),
                };
                *sample = Complex64::new(value, 0.0);
            }
        }
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
