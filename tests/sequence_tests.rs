use bluemask::sequence::{to_unit_f32, BaseSequence, SequenceKind};
use std::str::FromStr;

#[test]
fn test_kind_parses_from_config_strings() {
    assert_eq!(SequenceKind::from_str("owen").unwrap(), SequenceKind::Owen);
    assert_eq!(
        SequenceKind::from_str("rank1").unwrap(),
        SequenceKind::Rank1
    );
    assert!(SequenceKind::from_str("halton").is_err());
}

#[test]
fn test_sobol_starts_at_the_origin() {
    let seq = BaseSequence::generate(SequenceKind::Owen, 4).unwrap();
    for d in 0..4 {
        assert_eq!(seq.raw(0, d), 0);
    }
}

#[test]
fn test_sobol_first_dimension_is_van_der_corput() {
    let seq = BaseSequence::generate(SequenceKind::Owen, 2).unwrap();

    // Base-2 radical inverse of 1, 2, 3.
    assert_eq!(seq.sample(1, 0, 0), 0.5);
    assert_eq!(seq.sample(2, 0, 0), 0.25);
    assert_eq!(seq.sample(3, 0, 0), 0.75);
}

#[test]
fn test_sobol_second_dimension_known_prefix() {
    let seq = BaseSequence::generate(SequenceKind::Owen, 2).unwrap();

    assert_eq!(seq.sample(1, 1, 0), 0.5);
    assert_eq!(seq.sample(2, 1, 0), 0.75);
    assert_eq!(seq.sample(3, 1, 0), 0.25);
}

#[test]
fn test_sobol_prefix_is_stratified() {
    // The first 2^k samples of the first dimension fill 2^k distinct
    // equal-width strata.
    let seq = BaseSequence::generate(SequenceKind::Owen, 2).unwrap();
    for k in [2usize, 4, 8, 16] {
        let mut strata = vec![false; k];
        for n in 0..k {
            let cell = (seq.sample(n, 0, 0) * k as f32) as usize;
            strata[cell] = true;
        }
        assert!(strata.iter().all(|&hit| hit), "gap with {} strata", k);
    }
}

#[test]
fn test_rank1_coordinates_are_lattice_points() {
    let seq = BaseSequence::generate(SequenceKind::Rank1, 2).unwrap();

    // First component of the generating vector is 1, so dimension 0 is k/n.
    let n = seq.sample_count();
    for k in [0usize, 1, 17, n - 1] {
        let expected = k as f32 / n as f32;
        assert!((seq.sample(k, 0, 0) - expected).abs() < 1e-6);
    }
}

#[test]
fn test_samples_stay_in_unit_interval() {
    for kind in [SequenceKind::Owen, SequenceKind::Rank1] {
        let seq = BaseSequence::generate(kind, 2).unwrap();
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..200 {
            let k = rng.usize(0..seq.sample_count());
            let d = rng.usize(0..seq.dimensions());
            let v = seq.sample(k, d, rng.u32(..));
            assert!((0.0..1.0).contains(&v), "{} out of range", v);
        }
    }
}

#[test]
fn test_owen_combine_is_an_involution() {
    let key = 0xDEAD_BEEF;
    let raw = 0x1234_5678;
    let once = SequenceKind::Owen.combine(raw, key);
    assert_eq!(SequenceKind::Owen.combine(once, key), raw);
}

#[test]
fn test_rank1_combine_wraps_like_a_rotation() {
    // Fixed-point wrapping add is exactly fmod(x + shift, 1).
    let raw = 0xC000_0000u32; // 0.75
    let key = 0x8000_0000u32; // 0.5
    let combined = SequenceKind::Rank1.combine(raw, key);
    assert!((to_unit_f32(combined) - 0.25).abs() < 1e-6);
}

#[test]
fn test_dimension_limits_are_enforced() {
    assert!(BaseSequence::generate(SequenceKind::Owen, 0).is_err());
    assert!(BaseSequence::generate(SequenceKind::Owen, 17).is_err());
    assert!(BaseSequence::generate(SequenceKind::Rank1, 11).is_err());
    assert!(BaseSequence::generate(SequenceKind::Rank1, 10).is_ok());
}
