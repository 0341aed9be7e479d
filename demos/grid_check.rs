//! 2-D check: the accelerated backend against rustfft on a 16x16 grid while
//! the generator's coordinate scale sweeps.

use fftprobe::{FilterKind, Pipeline, PipelineConfig, SignalKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut pipeline = Pipeline::start(PipelineConfig::grid(16))?;
    pipeline.set_signal(SignalKind::Sinc);
    pipeline.set_filter(FilterKind::Exponential, false);

    for step in 0..8 {
        let u = 0.5 + step as f64 * 0.25;
        pipeline.set_scale(u, 1.0);
        let report = pipeline.tick(step as f64 * 0.1)?;
        for c in report.comparisons {
            println!("u={u:.2} {} vs {}: {}", c.lhs, c.rhs, c.discrepancy);
        }
    }
    Ok(())
}
