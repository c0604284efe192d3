use bluemask::config::{Config, MaskParams, SearchParams};
use bluemask::export::{write_header, write_tile, PADDED_DIMENSIONS};
use bluemask::mask::MaskState;
use bluemask::optimizer::Optimizer;
use bluemask::preview::{preintegrate, write_pgm};
use bluemask::sequence::{BaseSequence, SequenceKind};
use regex::Regex;

fn finished_optimizer(sequence: &str) -> Optimizer {
    let config = Config {
        mask: MaskParams {
            mask_size: 4,
            dimensions: 2,
            spp: 4,
            sequence: sequence.to_string(),
        },
        search: SearchParams {
            heaviside_count: 8,
            sample_interval: 4,
            swap_threshold: 1,
            max_rounds: 32,
        },
    };
    let mut optimizer = Optimizer::new(&config, Some(11)).unwrap();
    while optimizer.tick() {}
    optimizer
}

#[test]
fn test_tile_layout_and_value_range() {
    let optimizer = finished_optimizer("owen");
    let mut buffer = Vec::new();
    write_tile(&mut buffer, optimizer.mask(), optimizer.sequence(), 4).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    // 3 header lines, then pixels * spp * dimensions coordinates.
    assert_eq!(lines.len(), 3 + 16 * 4 * 2);
    assert_eq!(lines[0], "4");
    assert_eq!(lines[1], "4");
    assert_eq!(lines[2], "2");

    for line in &lines[3..] {
        let value: f32 = line.parse().unwrap();
        assert!((0.0..1.0).contains(&value), "{} out of range", value);
    }
}

#[test]
fn test_tile_is_column_major() {
    let optimizer = finished_optimizer("owen");
    let mut buffer = Vec::new();
    write_tile(&mut buffer, optimizer.mask(), optimizer.sequence(), 4).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    // The second pixel block belongs to (i=1, j=0), matrix index 4.
    let mask = optimizer.mask();
    let sequence = optimizer.sequence();
    let expected = sequence.sample(0, 0, mask.committed_key(4, 0));
    let line = text.lines().nth(3 + 4 * 2).unwrap();
    let value: f32 = line.parse().unwrap();
    assert_eq!(value, expected);
}

#[test]
fn test_header_table_starts_with_committed_keys() {
    let optimizer = finished_optimizer("owen");
    let mut buffer = Vec::new();
    let mut padding = fastrand::Rng::with_seed(0);
    write_header(&mut buffer, optimizer.mask(), optimizer.sequence(), &mut padding).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    assert!(text.starts_with("#pragma once"));
    assert!(text.contains("#include \"sobol_4096spp_256d.h\""));
    assert!(text.contains("float sample(int i, int j, int sampleID, int d)"));

    let table_start = text.find("scramblingKeys").unwrap();
    let table_end = text[table_start..].find("};").unwrap() + table_start;
    let table = &text[table_start..table_end];

    let key_re = Regex::new(r"(\d+)U").unwrap();
    let keys: Vec<u32> = key_re
        .captures_iter(table)
        .map(|c| c[1].parse().unwrap())
        .collect();
    assert_eq!(keys.len(), 16 * PADDED_DIMENSIONS);

    // Row-major table order: the first entry set belongs to pixel (0, 0).
    let mask = optimizer.mask();
    assert_eq!(keys[0], mask.committed_key(0, 0));
    assert_eq!(keys[1], mask.committed_key(0, 1));
    assert_eq!(keys[PADDED_DIMENSIONS], mask.committed_key(1, 0));
}

#[test]
fn test_header_formula_agrees_with_tile_values() {
    let optimizer = finished_optimizer("owen");
    let mask = optimizer.mask();
    let sequence = optimizer.sequence();

    // The header's combine rule is ((raw ^ key) + 0.5) / 2^32; the tile
    // keeps the top 23 bits of (raw ^ key) as an f32 mantissa. They agree
    // to within the truncated low bits.
    for pixel in [0usize, 7, 15] {
        for sample_id in [1usize, 2, 3] {
            for dim in 0..2 {
                let key = mask.committed_key(pixel, dim);
                let scrambled = sequence.raw(sample_id, dim) ^ key;
                let header_value = (scrambled as f64 + 0.5) / (1u64 << 32) as f64;
                let tile_value = sequence.sample(sample_id, dim, key) as f64;
                assert!((header_value - tile_value).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn test_rank1_header_uses_lattice_combine() {
    let optimizer = finished_optimizer("rank1");
    let mut buffer = Vec::new();
    let mut padding = fastrand::Rng::with_seed(0);
    write_header(&mut buffer, optimizer.mask(), optimizer.sequence(), &mut padding).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    assert!(text.contains("#include \"rank1_1024spp_10d.h\""));
    assert!(text.contains("fmodf"));
    assert!(!text.contains("sobol_sequence"));
}

#[test]
fn test_export_rejects_unfinished_mask() {
    let mut rng = fastrand::Rng::with_seed(1);
    let mask = MaskState::new(4, 2, &mut rng);
    let sequence = BaseSequence::generate(SequenceKind::Owen, 2).unwrap();

    let mut buffer = Vec::new();
    assert!(write_header(&mut buffer, &mask, &sequence, &mut rng).is_err());
    assert!(write_tile(&mut buffer, &mask, &sequence, 4).is_err());
    assert!(buffer.is_empty());
}

#[test]
fn test_preview_field_is_normalized() {
    let sequence = BaseSequence::generate(SequenceKind::Owen, 2).unwrap();
    let mut rng = fastrand::Rng::with_seed(41);
    let records: Vec<[u32; 4]> = (0..64)
        .map(|i| [rng.u32(..), rng.u32(..), i as u32, 0])
        .collect();

    let field = preintegrate(&sequence, 0, &records, 16);
    assert_eq!(field.len(), 64);

    let mean: f32 = field.iter().sum::<f32>() / 64.0;
    assert!((mean - 0.5).abs() < 0.2);

    // Normalization fixes the root mean square around 0.5 at exactly 1/4.
    let ms: f32 = field.iter().map(|v| (v - 0.5) * (v - 0.5)).sum::<f32>() / 64.0;
    assert!((ms.sqrt() - 0.25).abs() < 1e-4);
}

#[test]
fn test_pgm_has_binary_payload() {
    let values = vec![0.0f32, 0.5, 1.0, 2.0];
    let mut buffer = Vec::new();
    write_pgm(&mut buffer, &values, 2).unwrap();

    let header_end = buffer
        .windows(4)
        .position(|w| w == b"255\n")
        .map(|p| p + 4)
        .unwrap();
    assert_eq!(&buffer[..header_end], b"P5\n2 2\n255\n");
    assert_eq!(&buffer[header_end..], &[0u8, 127, 255, 255]);
}
