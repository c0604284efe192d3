use crate::mask::{PixelRecord, CH_KEY_X, CH_KEY_Y};
use crate::sequence::BaseSequence;
use std::io::{self, Write};

/// Integral of exp(-x^2 - y^2) over the unit square; subtracting it centers
/// the per-pixel estimates on zero.
const GAUSSIAN_REFERENCE: f64 = 0.557_746_285_4;

/// Monte-Carlo pre-integration of a fixed 2-D Gaussian against every pixel's
/// scrambled samples for the active dimension pair. Purely observational:
/// the result visualizes the error distribution but feeds no decision. The
/// field is normalized to a standard deviation of 1/4 around 0.5.
pub fn preintegrate(
    sequence: &BaseSequence,
    dimension: usize,
    records: &[PixelRecord],
    spp: usize,
) -> Vec<f32> {
    let mut result = Vec::with_capacity(records.len());
    let mut variance = 0.0f64;

    for record in records {
        let mut sum = 0.0f64;
        for k in 0..spp {
            let x = sequence.sample(k, dimension, record[CH_KEY_X]) as f64;
            let y = sequence.sample(k, dimension + 1, record[CH_KEY_Y]) as f64;
            sum += (-x * x - y * y).exp();
        }

        let centered = (sum / spp as f64 - GAUSSIAN_REFERENCE) as f32;
        variance += (centered * centered) as f64;
        result.push(centered);
    }

    let stddev = (variance / records.len() as f64).sqrt() as f32;
    if stddev > 0.0 {
        for value in result.iter_mut() {
            *value = *value / (4.0 * stddev) + 0.5;
        }
    } else {
        for value in result.iter_mut() {
            *value += 0.5;
        }
    }

    result
}

/// Dumps a preview field as a binary 8-bit PGM image.
pub fn write_pgm<W: Write>(w: &mut W, values: &[f32], mask_size: usize) -> io::Result<()> {
    writeln!(w, "P5")?;
    writeln!(w, "{} {}", mask_size, mask_size)?;
    writeln!(w, "255")?;

    let bytes: Vec<u8> = values
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8)
        .collect();
    w.write_all(&bytes)
}
