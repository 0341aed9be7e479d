// Test intent: verifies filter cutoffs and identity on full 1024-point spectra.

use fftprobe::filter::{apply, apply_into};
use fftprobe::freq::{index_of_frequency, signed_frequency};
use fftprobe::{Complex64, FilterKind};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N: usize = 1024;

fn impulse_at(f: i64) -> Vec<Complex64> {
    let mut spectrum = vec![Complex64::zero(); N];
    spectrum[index_of_frequency(f, N)] = Complex64::new(1.0, 0.0);
    spectrum
}

#[test]
fn cut_short_passes_dc_impulse() {
    let mut spectrum = impulse_at(0);
    let expected = spectrum.clone();
    apply(&mut spectrum, FilterKind::CutShort, false);
    assert_eq!(spectrum, expected);
}

#[test]
fn cut_short_removes_impulse_at_200() {
    let mut spectrum = impulse_at(200);
    apply(&mut spectrum, FilterKind::CutShort, false);
    assert!(spectrum.iter().all(|c| *c == Complex64::zero()));
}

#[test]
fn hard_cutoffs_zero_exactly_above_threshold() {
    let mut rng = StdRng::seed_from_u64(5);
    let input: Vec<Complex64> = (0..N)
        .map(|_| Complex64::new(rng.gen_range(0.5..1.5), rng.gen_range(0.5..1.5)))
        .collect();
    for (kind, cutoff) in [
        (FilterKind::CutLarge, 256),
        (FilterKind::CutMedium, 128),
        (FilterKind::CutShort, 64),
    ] {
        let mut spectrum = input.clone();
        apply(&mut spectrum, kind, false);
        for (i, (out, inp)) in spectrum.iter().zip(&input).enumerate() {
            let f = signed_frequency(i, N);
            if f.abs() > cutoff {
                assert_eq!(*out, Complex64::zero(), "{kind} f={f}");
            } else {
                assert_eq!(out, inp, "{kind} f={f}");
            }
        }
    }
}

proptest! {
    #[test]
    fn none_is_identity(
        values in proptest::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..256),
        inverted in any::<bool>(),
    ) {
        let src: Vec<Complex64> = values.iter().map(|&(r, i)| Complex64::new(r, i)).collect();
        let mut dst = vec![Complex64::zero(); src.len()];
        apply_into(&src, &mut dst, None, FilterKind::None, inverted);
        prop_assert_eq!(dst, src);
    }
}
