use crate::error::{MaskError, MaskResult};
use strum_macros::{Display, EnumIter, EnumString};

pub const SOBOL_MAX_SAMPLES: usize = 4096;
pub const SOBOL_MAX_DIMENSIONS: usize = 16;
pub const RANK1_MAX_SAMPLES: usize = 1024;
pub const RANK1_MAX_DIMENSIONS: usize = 10;

const BITS: usize = 32;

/// Korobov multiplier for the rank-1 lattice. a/n ~ 1/phi^2, which keeps the
/// leading 2-D projection close to a Fibonacci lattice.
const KOROBOV_MULTIPLIER: u64 = 389;

/// The two supported base sequence families. The family fixes the combine
/// rule used everywhere a scrambling key touches a sample: XOR for the
/// digital sequence, fixed-point wrapping add (a Cranley-Patterson rotation)
/// for the lattice.
#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum SequenceKind {
    Owen,
    Rank1,
}

impl SequenceKind {
    pub fn max_samples(&self) -> usize {
        match self {
            Self::Owen => SOBOL_MAX_SAMPLES,
            Self::Rank1 => RANK1_MAX_SAMPLES,
        }
    }

    pub fn max_dimensions(&self) -> usize {
        match self {
            Self::Owen => SOBOL_MAX_DIMENSIONS,
            Self::Rank1 => RANK1_MAX_DIMENSIONS,
        }
    }

    /// Applies a pixel's scrambling key to a raw 32-bit sample coordinate.
    #[inline(always)]
    pub fn combine(&self, raw: u32, key: u32) -> u32 {
        match self {
            Self::Owen => raw ^ key,
            Self::Rank1 => raw.wrapping_add(key),
        }
    }
}

/// Maps a 32-bit fraction to [0, 1). The top 23 bits become the mantissa of
/// a float in [1, 2), so the result can never round up to 1.0.
#[inline(always)]
pub fn to_unit_f32(x: u32) -> f32 {
    f32::from_bits(0x3f80_0000 | (x >> 9)) - 1.0
}

/// A pre-generated low-discrepancy point table, sample-major. Treated as a
/// read-only oracle by the estimator, evaluator and exporter.
pub struct BaseSequence {
    kind: SequenceKind,
    dimensions: usize,
    sample_count: usize,
    points: Vec<u32>,
}

impl BaseSequence {
    /// Generates the full table for `dimensions` dimensions of the family.
    pub fn generate(kind: SequenceKind, dimensions: usize) -> MaskResult<Self> {
        if dimensions == 0 || dimensions > kind.max_dimensions() {
            return Err(MaskError::Config(format!(
                "{} sequence supports 1..={} dimensions, got {}",
                kind,
                kind.max_dimensions(),
                dimensions
            )));
        }

        let sample_count = kind.max_samples();
        let points = match kind {
            SequenceKind::Owen => sobol_table(sample_count, dimensions),
            SequenceKind::Rank1 => rank1_table(sample_count, dimensions),
        };

        Ok(Self {
            kind,
            dimensions,
            sample_count,
            points,
        })
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Raw (unscrambled) 32-bit coordinate of one sample.
    #[inline(always)]
    pub fn raw(&self, index: usize, dimension: usize) -> u32 {
        self.points[index * self.dimensions + dimension]
    }

    /// Scrambled sample coordinate in [0, 1).
    #[inline(always)]
    pub fn sample(&self, index: usize, dimension: usize, key: u32) -> f32 {
        to_unit_f32(self.kind.combine(self.raw(index, dimension), key))
    }
}

// Joe-Kuo primitive polynomial parameters (s, a, m1..ms) for Sobol
// dimensions after the base-2 van der Corput dimension.
#[rustfmt::skip]
const JOE_KUO: [(usize, u32, [u32; 6]); SOBOL_MAX_DIMENSIONS - 1] = [
    (1, 0,  [1, 0, 0, 0,  0,  0]),
    (2, 1,  [1, 1, 0, 0,  0,  0]),
    (3, 1,  [1, 1, 1, 0,  0,  0]),
    (3, 2,  [1, 3, 1, 0,  0,  0]),
    (4, 1,  [1, 1, 3, 3,  0,  0]),
    (4, 4,  [1, 3, 5, 13, 0,  0]),
    (5, 2,  [1, 1, 5, 5,  17, 0]),
    (5, 4,  [1, 1, 5, 5,  5,  0]),
    (5, 7,  [1, 1, 7, 11, 19, 0]),
    (5, 11, [1, 1, 5, 1,  1,  0]),
    (5, 13, [1, 1, 1, 3,  11, 0]),
    (5, 14, [1, 3, 5, 5,  31, 0]),
    (6, 1,  [1, 3, 3, 9,  7,  49]),
    (6, 13, [1, 1, 1, 15, 21, 21]),
    (6, 16, [1, 3, 1, 13, 27, 49]),
];

fn direction_numbers(dimension: usize) -> [u32; BITS] {
    let mut v = [0u32; BITS];

    if dimension == 0 {
        // Van der Corput base 2.
        for (c, slot) in v.iter_mut().enumerate() {
            *slot = 1u32 << (31 - c);
        }
        return v;
    }

    let (s, a, m) = JOE_KUO[dimension - 1];
    for c in 0..s {
        v[c] = m[c] << (31 - c);
    }
    for c in s..BITS {
        let mut val = v[c - s] ^ (v[c - s] >> s);
        for k in 1..s {
            if (a >> (s - 1 - k)) & 1 == 1 {
                val ^= v[c - k];
            }
        }
        v[c] = val;
    }
    v
}

fn sobol_table(sample_count: usize, dimensions: usize) -> Vec<u32> {
    let directions: Vec<[u32; BITS]> = (0..dimensions).map(direction_numbers).collect();

    let mut points = vec![0u32; sample_count * dimensions];
    for n in 0..sample_count {
        for (d, v) in directions.iter().enumerate() {
            let mut x = 0u32;
            let mut bits = n;
            let mut c = 0;
            while bits != 0 {
                if bits & 1 == 1 {
                    x ^= v[c];
                }
                bits >>= 1;
                c += 1;
            }
            points[n * dimensions + d] = x;
        }
    }
    points
}

fn rank1_table(sample_count: usize, dimensions: usize) -> Vec<u32> {
    // Korobov-form generating vector z = (1, a, a^2, ...) mod n. The lattice
    // coordinate k*z[d]/n maps exactly onto a 32-bit fraction because n is a
    // power of two.
    let n = sample_count as u64;
    let shift = 32 - n.trailing_zeros();

    let mut z = vec![0u64; dimensions];
    let mut acc = 1u64;
    for slot in z.iter_mut() {
        *slot = acc;
        acc = (acc * KOROBOV_MULTIPLIER) % n;
    }

    let mut points = vec![0u32; sample_count * dimensions];
    for k in 0..sample_count {
        for (d, &zd) in z.iter().enumerate() {
            let coord = (k as u64 * zd) % n;
            points[k * dimensions + d] = (coord as u32) << shift;
        }
    }
    points
}
