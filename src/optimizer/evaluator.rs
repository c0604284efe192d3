use crate::estimator::DistanceMatrix;
use crate::mask::{PixelRecord, CH_MATRIX_INDEX};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// Spatial falloff of the blue-noise energy kernel.
const SPATIAL_SIGMA: f32 = 2.1;

/// Neighborhood half-width; weights beyond 3 pixels are negligible at the
/// chosen sigma.
const KERNEL_RADIUS: i32 = 3;

/// Per-round decorrelation key supplied by the controller. The partner of a
/// candidate anchor is the pixel at the anchor's coordinates XOR these
/// offsets, which makes the pairing an involution: every pixel belongs to at
/// most one pair per round.
#[derive(Debug, Clone, Copy)]
pub struct RoundKey {
    pub offset_x: u32,
    pub offset_y: u32,
}

/// The massively parallel swap evaluator the controller dispatches into once
/// per round. Reads the front buffer and the phase's distance matrix, writes
/// the back buffer, and bumps the accepted-swap counter. Implementations
/// must not touch any other state.
pub trait SwapEvaluator: Send + Sync {
    fn dispatch(
        &self,
        round: RoundKey,
        candidates: &[u32],
        front: &[PixelRecord],
        back: &mut [PixelRecord],
        matrix: &DistanceMatrix,
        counter: &AtomicU32,
    );
}

/// Rayon-backed compute binding: all accept/reject decisions are taken
/// against the immutable front buffer in a parallel pass, then the accepted
/// swaps land in the back buffer.
pub struct ParallelEvaluator {
    mask_size: usize,
    // (dx, dy, spatial weight) for the toroidal neighborhood.
    kernel: Vec<(i32, i32, f32)>,
}

impl ParallelEvaluator {
    pub fn new(mask_size: usize) -> Self {
        let mut kernel = Vec::new();
        for dy in -KERNEL_RADIUS..=KERNEL_RADIUS {
            for dx in -KERNEL_RADIUS..=KERNEL_RADIUS {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let dist_sq = (dx * dx + dy * dy) as f32;
                kernel.push((dx, dy, (-dist_sq / (SPATIAL_SIGMA * SPATIAL_SIGMA)).exp()));
            }
        }
        Self { mask_size, kernel }
    }

    /// Blue-noise energy of one pixel under a hypothetical matrix-index
    /// assignment: high when nearby pixels carry similar sample sets, which
    /// is exactly what a swap should remove.
    fn energy<F>(&self, p: usize, matrix: &DistanceMatrix, lookup: &F) -> f32
    where
        F: Fn(usize) -> u32,
    {
        let n = self.mask_size as i32;
        let px = (p % self.mask_size) as i32;
        let py = (p / self.mask_size) as i32;
        let mi = lookup(p) as usize;

        let mut e = 0.0;
        for &(dx, dy, w) in &self.kernel {
            let qx = (px + dx).rem_euclid(n);
            let qy = (py + dy).rem_euclid(n);
            let q = (qy * n + qx) as usize;
            if q == p {
                continue;
            }

            let d = matrix.get(mi, lookup(q) as usize);
            e += w * (-d.sqrt()).exp();
        }
        e
    }

    fn partner(&self, anchor: usize, round: RoundKey) -> usize {
        let n = self.mask_size;
        let ax = anchor % n;
        let ay = anchor / n;
        let bx = ax ^ round.offset_x as usize;
        let by = ay ^ round.offset_y as usize;
        by * n + bx
    }
}

impl SwapEvaluator for ParallelEvaluator {
    fn dispatch(
        &self,
        round: RoundKey,
        candidates: &[u32],
        front: &[PixelRecord],
        back: &mut [PixelRecord],
        matrix: &DistanceMatrix,
        counter: &AtomicU32,
    ) {
        // Decision pass: pure function of the front buffer and the matrix.
        let mut accepted: Vec<(usize, usize)> = candidates
            .par_iter()
            .filter_map(|&anchor| {
                let a = anchor as usize;
                let b = self.partner(a, round);
                if a == b {
                    return None;
                }
                let (lo, hi) = (a.min(b), a.max(b));

                let current = |q: usize| front[q][CH_MATRIX_INDEX];
                let swapped = |q: usize| {
                    if q == lo {
                        front[hi][CH_MATRIX_INDEX]
                    } else if q == hi {
                        front[lo][CH_MATRIX_INDEX]
                    } else {
                        front[q][CH_MATRIX_INDEX]
                    }
                };

                let before =
                    self.energy(lo, matrix, &current) + self.energy(hi, matrix, &current);
                let after = self.energy(lo, matrix, &swapped) + self.energy(hi, matrix, &swapped);

                (after < before).then_some((lo, hi))
            })
            .collect();

        // The involution can surface the same pair from both of its anchors.
        accepted.par_sort_unstable();
        accepted.dedup();

        back.copy_from_slice(front);
        for &(a, b) in &accepted {
            back.swap(a, b);
        }
        counter.fetch_add(accepted.len() as u32, Ordering::Relaxed);
    }
}
