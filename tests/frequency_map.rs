use fftprobe::freq::{
    centered, display_index, index_of_frequency, inverted_frequency, position_frequency,
    signed_frequency,
};

const N: usize = 1024;

#[test]
fn display_positions_span_negative_to_positive() {
    assert_eq!(position_frequency(0, N), -512);
    assert_eq!(position_frequency(512, N), 0);
    assert_eq!(position_frequency(1023, N), 511);
}

#[test]
fn display_position_shows_the_matching_raw_index() {
    for p in 0..N {
        let raw = display_index(p, N);
        assert_eq!(signed_frequency(raw, N), position_frequency(p, N), "p={p}");
    }
}

#[test]
fn raw_index_round_trips_through_signed_frequency() {
    for i in 0..N {
        assert_eq!(index_of_frequency(signed_frequency(i, N), N), i);
    }
    assert_eq!(signed_frequency(0, N), 0);
    assert_eq!(signed_frequency(512, N), -512);
    assert_eq!(signed_frequency(1023, N), -1);
}

#[test]
fn conventions_diverge_at_boundaries() {
    assert_eq!(inverted_frequency(0, N), -512);
    assert_eq!(inverted_frequency(1, N), 511);
    assert_eq!(inverted_frequency(512, N), 0);
    assert_ne!(inverted_frequency(0, N).abs(), signed_frequency(0, N).abs());
}

#[test]
fn centred_view_puts_dc_in_the_middle() {
    let spectrum: Vec<usize> = (0..8).collect();
    let mut view = vec![0; 8];
    centered(&spectrum, &mut view);
    assert_eq!(view, vec![4, 5, 6, 7, 0, 1, 2, 3]);
}
