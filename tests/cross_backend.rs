// Test intent: canonical spectra of all backends agree on the same input.
#![cfg(all(feature = "parallel", feature = "reference-fft"))]

use fftprobe::signal::SignalGenerator;
use fftprobe::{
    compare, AcceleratedBackend, Complex64, ExternalBackend, ReferenceBackend, RustFftLibrary,
    Shape, SignalKind, ThreadPoolContext, TransformBackend,
};

fn backends(shape: Shape) -> Vec<Box<dyn TransformBackend>> {
    let ctx = ThreadPoolContext::new(0).unwrap();
    vec![
        Box::new(ReferenceBackend::new(shape)),
        Box::new(AcceleratedBackend::new(Box::new(ctx), shape).unwrap()),
        Box::new(ExternalBackend::new(Box::new(RustFftLibrary::new()), shape)),
    ]
}

fn spectra(shape: Shape, input: &[Complex64]) -> Vec<Vec<Complex64>> {
    backends(shape)
        .iter_mut()
        .map(|b| {
            let mut out = vec![Complex64::zero(); shape.len()];
            b.forward_canonical(input, &mut out).unwrap();
            out
        })
        .collect()
}

#[test]
fn every_signal_agrees_on_lines() {
    let mut gen = SignalGenerator::new(9);
    let mut input = vec![Complex64::zero(); 1024];
    for kind in SignalKind::ALL {
        for t in [0.0, 0.4, 2.5] {
            gen.fill(kind, t, &mut input);
            let s = spectra(Shape::Line(1024), &input);
            for other in &s[1..] {
                let d = compare(&s[0], other);
                assert!(d.is_within(1e-9), "{kind} t={t}: {d}");
            }
        }
    }
}

#[test]
fn grids_agree_including_scaled_coordinates() {
    let side = 16;
    let mut gen = SignalGenerator::default();
    let mut input = vec![Complex64::zero(); side * side];
    for scale in [(1.0, 1.0), (0.5, 2.0)] {
        gen.fill_grid(SignalKind::Sine, 1.0, side, scale, &mut input);
        let s = spectra(Shape::Grid(side), &input);
        let accel_vs_external = compare(&s[1], &s[2]);
        assert!(accel_vs_external.is_within(1e-9), "{accel_vs_external}");
        assert!(compare(&s[0], &s[2]).is_within(1e-20));
    }
}

#[test]
fn reference_and_external_agree_at_double_precision() {
    let mut gen = SignalGenerator::new(1);
    let mut input = vec![Complex64::zero(); 96];
    gen.fill(SignalKind::Random, 0.0, &mut input);
    let shape = Shape::Line(96);
    let mut reference = ReferenceBackend::new(shape);
    let mut external = ExternalBackend::new(Box::new(RustFftLibrary::new()), shape);
    let mut a = vec![Complex64::zero(); 96];
    let mut b = vec![Complex64::zero(); 96];
    reference.forward_canonical(&input, &mut a).unwrap();
    external.forward_canonical(&input, &mut b).unwrap();
    assert!(compare(&a, &b).is_within(1e-24));
}
