use crate::error::{MaskError, MaskResult};
use crate::estimator;
use crate::sequence::SequenceKind;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;

/// Hard cap on distance-matrix storage. A truncated matrix would silently
/// corrupt every swap decision, so the size is checked up front.
pub const MAX_MATRIX_BYTES: usize = 2 * 1024 * 1024 * 1024;

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[command(flatten)]
    #[serde(flatten)]
    pub mask: MaskParams,
    #[command(flatten)]
    #[serde(flatten)]
    pub search: SearchParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// Side length of the square pixel grid. Must be a power of two.
    #[arg(long, default_value_t = 128)]
    pub mask_size: u32,

    /// Total number of sampling dimensions to optimize. Must be even.
    #[arg(long, default_value_t = 2)]
    pub dimensions: u32,

    /// Samples per pixel drawn from the base sequence.
    #[arg(long, default_value_t = 4)]
    pub spp: u32,

    /// Base sequence family: "owen" (digital, XOR) or "rank1" (lattice, shift).
    #[arg(long, default_value = "owen")]
    pub sequence: String,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Random half-plane test functions per distance-matrix rebuild.
    #[arg(long, default_value_t = 1024)]
    pub heaviside_count: u32,

    /// Rounds between two samplings of the accepted-swap counter.
    #[arg(long, default_value_t = 64)]
    pub sample_interval: u32,

    /// A phase saturates when fewer swaps than this land in one interval.
    #[arg(long, default_value_t = 8)]
    pub swap_threshold: u32,

    /// Safety cap on rounds per phase. 0 disables the cap.
    #[arg(long, default_value_t = 0)]
    pub max_rounds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mask: MaskParams::default(),
            search: SearchParams::default(),
        }
    }
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            mask_size: 128,
            dimensions: 2,
            spp: 4,
            sequence: "owen".to_string(),
        }
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            heaviside_count: 1024,
            sample_interval: 64,
            swap_threshold: 8,
            max_rounds: 0,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> MaskResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn sequence_kind(&self) -> MaskResult<SequenceKind> {
        SequenceKind::from_str(&self.mask.sequence).map_err(|_| {
            MaskError::Config(format!(
                "Unknown sequence family '{}' (expected 'owen' or 'rank1')",
                self.mask.sequence
            ))
        })
    }

    /// Checks everything that must hold before any phase state is allocated.
    pub fn validate(&self) -> MaskResult<()> {
        let kind = self.sequence_kind()?;

        let n = self.mask.mask_size;
        if n < 2 || !n.is_power_of_two() {
            return Err(MaskError::Config(format!(
                "mask_size must be a power of two >= 2, got {}",
                n
            )));
        }

        let d = self.mask.dimensions;
        if d == 0 || d % 2 != 0 {
            return Err(MaskError::Config(format!(
                "dimensions must be even and non-zero, got {}",
                d
            )));
        }
        if d as usize > kind.max_dimensions() {
            return Err(MaskError::Config(format!(
                "dimensions {} exceeds the {} sequence limit of {}",
                d,
                kind,
                kind.max_dimensions()
            )));
        }

        let spp = self.mask.spp;
        if spp == 0 || spp as usize > kind.max_samples() {
            return Err(MaskError::Config(format!(
                "spp must be in 1..={} for the {} sequence, got {}",
                kind.max_samples(),
                kind,
                spp
            )));
        }

        if self.search.heaviside_count == 0 {
            return Err(MaskError::Config(
                "heaviside_count must be non-zero".to_string(),
            ));
        }
        if self.search.sample_interval == 0 {
            return Err(MaskError::Config(
                "sample_interval must be non-zero".to_string(),
            ));
        }

        let pixel_count = (n as usize) * (n as usize);
        let bytes = estimator::matrix_entry_count(pixel_count)
            .and_then(|entries| entries.checked_mul(std::mem::size_of::<f32>()));
        match bytes {
            Some(b) if b <= MAX_MATRIX_BYTES => Ok(()),
            _ => Err(MaskError::Validation(format!(
                "distance matrix for a {}x{} mask exceeds the {} byte storage cap",
                n, n, MAX_MATRIX_BYTES
            ))),
        }
    }
}
