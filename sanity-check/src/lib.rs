//! Helpers for the `sanity-check` binary: per-tick summaries and CSV dumps of
//! a [`TickReport`].

use std::io::{self, Write};

use fftprobe::freq::{display_index, position_frequency};
use fftprobe::{Complex64, Shape, TickReport};

/// One summary line for a tick.
pub fn tick_line(report: &TickReport<'_>) -> String {
    match report.discrepancy {
        Some(d) => format!("t={:.3} {d}", report.time),
        None => format!("t={:.3} SqDiff = n/a (single backend)", report.time),
    }
}

/// Write a tick as CSV.
///
/// The spectrum column is centred: row `p` of a line holds the input and
/// reconstruction at sample `p` and the spectrum at signed frequency
/// `p - N/2`. Grids get one row per cell with both axis frequencies.
pub fn write_csv<W: Write>(mut out: W, shape: Shape, report: &TickReport<'_>) -> io::Result<()> {
    match shape {
        Shape::Line(n) => {
            writeln!(
                out,
                "index,frequency,input_re,input_im,spectrum_re,spectrum_im,reconstructed_re,reconstructed_im"
            )?;
            for p in 0..n {
                let s = report.spectrum[display_index(p, n)];
                write!(out, "{p},{},", position_frequency(p, n))?;
                write_row(&mut out, report.input[p], s, report.reconstructed[p])?;
            }
        }
        Shape::Grid(n) => {
            writeln!(
                out,
                "x,y,fx,fy,input_re,input_im,spectrum_re,spectrum_im,reconstructed_re,reconstructed_im"
            )?;
            for y in 0..n {
                for x in 0..n {
                    let cell = y * n + x;
                    let s = report.spectrum[display_index(y, n) * n + display_index(x, n)];
                    write!(
                        out,
                        "{x},{y},{},{},",
                        position_frequency(x, n),
                        position_frequency(y, n)
                    )?;
                    write_row(&mut out, report.input[cell], s, report.reconstructed[cell])?;
                }
            }
        }
    }
    out.flush()
}

fn write_row<W: Write>(out: &mut W, input: Complex64, spectrum: Complex64, rec: Complex64) -> io::Result<()> {
    writeln!(
        out,
        "{},{},{},{},{},{}",
        input.re, input.im, spectrum.re, spectrum.im, rec.re, rec.im
    )
}
