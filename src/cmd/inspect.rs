use crate::reports::{self, TileStats};
use bluemask::error::{MaskError, MaskResult};
use clap::Args;
use std::fs;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Path of a tile artifact produced by `optimize`.
    pub tile: String,
}

fn parse_header_line(line: Option<&str>, name: &str) -> MaskResult<usize> {
    line.ok_or_else(|| MaskError::Parse(format!("missing {} header line", name)))?
        .trim()
        .parse()
        .map_err(|_| MaskError::Parse(format!("invalid {} header line", name)))
}

pub fn run(args: InspectArgs) -> MaskResult<()> {
    info!("Inspecting tile: {}", args.tile);
    let content = fs::read_to_string(&args.tile)?;
    let mut lines = content.lines();

    let mask_size = parse_header_line(lines.next(), "grid size")?;
    let spp = parse_header_line(lines.next(), "spp")?;
    let dimensions = parse_header_line(lines.next(), "dimension count")?;

    let expected = mask_size * mask_size * spp * dimensions;
    let mut count = 0usize;
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    let mut sum = 0.0f64;

    for line in lines {
        let value: f32 = line
            .trim()
            .parse()
            .map_err(|_| MaskError::Parse(format!("invalid sample value '{}'", line)))?;

        if !(0.0..1.0).contains(&value) {
            return Err(MaskError::Validation(format!(
                "sample value {} outside [0, 1)",
                value
            )));
        }

        count += 1;
        min = min.min(value);
        max = max.max(value);
        sum += value as f64;
    }

    if count != expected {
        return Err(MaskError::Validation(format!(
            "tile holds {} values, expected {} ({}x{} pixels, {} spp, {} dimensions)",
            count, expected, mask_size, mask_size, spp, dimensions
        )));
    }

    reports::print_tile_stats(&TileStats {
        mask_size,
        spp,
        dimensions,
        count,
        min,
        max,
        mean: (sum / count as f64) as f32,
    });

    Ok(())
}
