use std::sync::atomic::{AtomicU32, Ordering};

/// One working-buffer texel: channels 0-1 hold the scrambling keys for the
/// active dimension pair, channel 2 the pixel's distance-matrix index,
/// channel 3 is padding.
pub type PixelRecord = [u32; 4];

pub const CH_KEY_X: usize = 0;
pub const CH_KEY_Y: usize = 1;
pub const CH_MATRIX_INDEX: usize = 2;

/// Double-buffered per-pixel key field for the active dimension pair, plus
/// the accumulated keys of every committed pair. The evaluator reads `front`
/// and writes `back`; `publish` copies back over front after each round, so
/// the two buffers always represent consecutive rounds.
pub struct MaskState {
    mask_size: usize,
    dimensions: usize,
    active_dimension: usize,

    front: Vec<PixelRecord>,
    back: Vec<PixelRecord>,
    accepted: AtomicU32,

    committed: Vec<u32>,
}

impl MaskState {
    pub fn new(mask_size: usize, dimensions: usize, rng: &mut fastrand::Rng) -> Self {
        let pixel_count = mask_size * mask_size;
        let mut state = Self {
            mask_size,
            dimensions,
            active_dimension: 0,
            front: vec![[0u32; 4]; pixel_count],
            back: vec![[0u32; 4]; pixel_count],
            accepted: AtomicU32::new(0),
            committed: vec![0u32; dimensions * pixel_count],
        };
        state.reinit_working(rng);
        state
    }

    fn reinit_working(&mut self, rng: &mut fastrand::Rng) {
        for (i, record) in self.front.iter_mut().enumerate() {
            record[CH_KEY_X] = rng.u32(..);
            record[CH_KEY_Y] = rng.u32(..);
            record[CH_MATRIX_INDEX] = i as u32;
            record[3] = 0;
        }
        self.back.copy_from_slice(&self.front);
        self.accepted.store(0, Ordering::Relaxed);
    }

    pub fn mask_size(&self) -> usize {
        self.mask_size
    }

    pub fn pixel_count(&self) -> usize {
        self.mask_size * self.mask_size
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn active_dimension(&self) -> usize {
        self.active_dimension
    }

    pub fn front(&self) -> &[PixelRecord] {
        &self.front
    }

    /// Split borrow for one evaluator dispatch: read-only front, writable
    /// back, and the shared swap counter.
    pub fn buffers(&mut self) -> (&[PixelRecord], &mut [PixelRecord], &AtomicU32) {
        (&self.front, &mut self.back, &self.accepted)
    }

    /// Makes the last round's writes the readable current state.
    pub fn publish(&mut self) {
        self.front.copy_from_slice(&self.back);
    }

    pub fn accepted_swaps(&self) -> u32 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Drains the front buffer's keys into the accumulated field at the
    /// active dimension offset. Returns true if dimensions remain, in which
    /// case the working buffers are re-drawn for the next pair and the swap
    /// counter is reset.
    pub fn commit_phase(&mut self, rng: &mut fastrand::Rng) -> bool {
        let d = self.dimensions;
        let offset = self.active_dimension;
        for (i, record) in self.front.iter().enumerate() {
            self.committed[i * d + offset] = record[CH_KEY_X];
            self.committed[i * d + offset + 1] = record[CH_KEY_Y];
        }

        self.active_dimension += 2;
        if self.active_dimension < d {
            self.reinit_working(rng);
            true
        } else {
            false
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.active_dimension >= self.dimensions
    }

    /// Committed scrambling key for one pixel and dimension. Only meaningful
    /// for dimensions below `active_dimension`.
    pub fn committed_key(&self, pixel: usize, dimension: usize) -> u32 {
        self.committed[pixel * self.dimensions + dimension]
    }
}
