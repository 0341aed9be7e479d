//! Basic usage example for fftprobe
//!
//! Runs a few pipeline ticks over every signal kind and prints how far the
//! backends disagree, then transforms a small buffer by hand.

use fftprobe::freq::{display_index, position_frequency};
use fftprobe::{
    BackendKind, Complex64, FilterKind, Pipeline, PipelineConfig, ReferenceBackend, Shape,
    SignalKind, TransformBackend,
};

fn main() {
    println!("=== fftprobe Basic Usage Example ===\n");

    // 1. The pipeline with whatever backends this build provides
    println!("1. Pipeline ticks");
    let mut pipeline = Pipeline::start(PipelineConfig::default()).unwrap();
    println!("   Active backends: {:?}", pipeline.backends());
    for fault in pipeline.faults() {
        println!("   Unavailable: {fault}");
    }
    for kind in SignalKind::ALL {
        pipeline.set_signal(kind);
        let report = pipeline.tick(0.5).unwrap();
        match report.discrepancy {
            Some(d) => println!("   {kind:>8}: {d}"),
            None => println!("   {kind:>8}: single backend, nothing to compare"),
        }
    }
    println!();

    // 2. Filtering
    println!("2. Filtering a square wave");
    pipeline.set_signal(SignalKind::Square);
    for filter in [FilterKind::None, FilterKind::CutShort, FilterKind::Gaussian] {
        pipeline.set_filter(filter, false);
        let report = pipeline.tick(0.0).unwrap();
        let err: f64 = report
            .reconstructed
            .iter()
            .zip(report.input)
            .map(|(a, b)| (*a - *b).norm_sqr())
            .sum();
        println!("   {filter:>10}: squared reconstruction error {err:.3e}");
    }
    if let Some(spectrum) = pipeline.spectrum_of(BackendKind::Reference) {
        let n = spectrum.len();
        let peak = (0..n)
            .max_by(|&a, &b| {
                let (x, y) = (spectrum[display_index(a, n)], spectrum[display_index(b, n)]);
                x.norm_sqr().total_cmp(&y.norm_sqr())
            })
            .unwrap_or(0);
        println!("   Strongest component at f = {}", position_frequency(peak, n));
    }
    pipeline.shutdown();
    println!();

    // 3. A backend on its own
    println!("3. Reference backend");
    let mut backend = ReferenceBackend::new(Shape::Line(4));
    let input: Vec<Complex64> = (1..=4).map(|v| Complex64::new(v as f64, 0.0)).collect();
    let mut spectrum = vec![Complex64::zero(); 4];
    backend.forward_canonical(&input, &mut spectrum).unwrap();
    println!(
        "   Canonical spectrum: {:?}",
        spectrum
            .iter()
            .map(|c| format!("{:.2}{:+.2}i", c.re, c.im))
            .collect::<Vec<_>>()
    );
    let mut back = vec![Complex64::zero(); 4];
    backend.inverse_canonical(&spectrum, &mut back).unwrap();
    println!("   Reconstructed: {:?}", back.iter().map(|c| c.re).collect::<Vec<_>>());
}
