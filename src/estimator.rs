use crate::error::{MaskError, MaskResult};
use crate::mask::{PixelRecord, CH_KEY_X, CH_KEY_Y};
use crate::sequence::BaseSequence;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Entry count of the upper-triangular pairwise matrix, or None on overflow.
pub fn matrix_entry_count(pixel_count: usize) -> Option<usize> {
    pixel_count
        .checked_mul(pixel_count.checked_add(1)?)
        .map(|x| x / 2)
}

/// Symmetric pairwise dissimilarity over all pixel positions, stored as the
/// upper triangle (diagonal included). Allocated once, overwritten in place
/// on every later rebuild.
pub struct DistanceMatrix {
    pixel_count: usize,
    values: Vec<f32>,
}

impl DistanceMatrix {
    pub fn new(pixel_count: usize) -> MaskResult<Self> {
        let entries = matrix_entry_count(pixel_count).ok_or_else(|| {
            MaskError::Validation(format!(
                "distance matrix size overflows for {} pixels",
                pixel_count
            ))
        })?;

        Ok(Self {
            pixel_count,
            values: vec![0.0; entries],
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Triangular storage index for an ordered pair i <= j.
    #[inline(always)]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= j && j < self.pixel_count);
        j + i * self.pixel_count - i * (i + 1) / 2
    }

    /// Dissimilarity between two pixels, in either argument order.
    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
        self.values[self.index(lo, hi)]
    }

    /// Mutable triangle rows of decreasing length, for the parallel
    /// distance pass. Row i covers pairs (i, i..pixel_count).
    fn rows_mut(&mut self) -> Vec<&mut [f32]> {
        let pixel_count = self.pixel_count;
        let mut rows = Vec::with_capacity(pixel_count);
        let mut rest = self.values.as_mut_slice();
        for i in 0..pixel_count {
            let (row, tail) = rest.split_at_mut(pixel_count - i);
            rows.push(row);
            rest = tail;
        }
        rows
    }
}

/// A random oriented half-plane: a unit direction and a 2-D offset point.
#[derive(Debug, Clone, Copy)]
pub struct Heaviside {
    pub normal: [f32; 2],
    pub point: [f32; 2],
}

impl Heaviside {
    fn draw(rng: &mut fastrand::Rng) -> Self {
        let theta = 2.0 * std::f32::consts::PI * rng.f32();
        Self {
            normal: [theta.cos(), theta.sin()],
            point: [rng.f32(), rng.f32()],
        }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let diff = x - y;
        sum += diff * diff;
    }
    sum
}

/// Estimates pairwise pixel dissimilarity for the active dimension pair by
/// projecting every pixel's scrambled sample set onto a family of random
/// half-plane indicators.
pub struct DistanceEstimator {
    sequence: Arc<BaseSequence>,
    spp: usize,
    heaviside_count: usize,
}

impl DistanceEstimator {
    pub fn new(sequence: Arc<BaseSequence>, spp: usize, heaviside_count: usize) -> Self {
        Self {
            sequence,
            spp,
            heaviside_count,
        }
    }

    /// Overwrites `matrix` with fresh pairwise distances for the keys in
    /// `records` at dimension offset `dimension`. The matrix keeps its
    /// backing storage across rebuilds; the squared L2 distance is stored
    /// uniformly (never its square root).
    pub fn rebuild(
        &self,
        records: &[PixelRecord],
        dimension: usize,
        matrix: &mut DistanceMatrix,
        rng: &mut fastrand::Rng,
    ) {
        let pixel_count = records.len();
        debug_assert_eq!(pixel_count, matrix.pixel_count());

        let heavisides: Vec<Heaviside> = (0..self.heaviside_count)
            .map(|_| Heaviside::draw(rng))
            .collect();

        debug!(
            pixel_count,
            heavisides = self.heaviside_count,
            dimension,
            "rebuilding distance matrix"
        );

        // Estimate pass: one indicator average per (pixel, heaviside).
        let h = self.heaviside_count;
        let mut estimates = vec![0.0f32; pixel_count * h];
        estimates
            .par_chunks_mut(h)
            .zip(records.par_iter())
            .for_each(|(row, record)| {
                let keys = [record[CH_KEY_X], record[CH_KEY_Y]];
                for (slot, heaviside) in row.iter_mut().zip(heavisides.iter()) {
                    *slot = self.integrate_heaviside(keys, dimension, heaviside);
                }
            });

        // Distance pass: each triangle row is a disjoint output slice.
        matrix
            .rows_mut()
            .into_par_iter()
            .enumerate()
            .for_each(|(i, row)| {
                let lhs = &estimates[i * h..(i + 1) * h];
                for (k, slot) in row.iter_mut().enumerate() {
                    let j = i + k;
                    *slot = squared_l2(lhs, &estimates[j * h..(j + 1) * h]);
                }
            });
    }

    /// Fraction of the pixel's scrambled 2-D samples on the negative side of
    /// the half-plane.
    pub fn integrate_heaviside(
        &self,
        keys: [u32; 2],
        dimension: usize,
        heaviside: &Heaviside,
    ) -> f32 {
        let [nx, ny] = heaviside.normal;
        let [px, py] = heaviside.point;

        let mut sum = 0u32;
        for k in 0..self.spp {
            let x = self.sequence.sample(k, dimension, keys[0]);
            let y = self.sequence.sample(k, dimension + 1, keys[1]);

            if (x - px) * nx + (y - py) * ny < 0.0 {
                sum += 1;
            }
        }

        sum as f32 / self.spp as f32
    }
}
