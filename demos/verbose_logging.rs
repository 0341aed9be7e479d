//! Demonstrates enabling verbose logging for fftprobe.
use fftprobe::{FilterKind, Pipeline, PipelineConfig, SignalKind};

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let mut pipeline = Pipeline::start(PipelineConfig {
        signal_length: 64,
        ..PipelineConfig::default()
    })
    .unwrap();
    pipeline.set_signal(SignalKind::Sine);
    pipeline.set_filter(FilterKind::Gaussian, false);

    pipeline.tick(0.0).unwrap();
    pipeline.shutdown();
}
