use fastrand::Rng;

/// Draws the fixed candidate-anchor subset: a partial Fisher-Yates shuffle
/// of the identity permutation, truncated to the first `pixel_count / 2`
/// slots. Generated once per optimizer lifetime and shared by every phase.
pub fn generate_candidates(rng: &mut Rng, pixel_count: usize) -> Vec<u32> {
    let half = pixel_count / 2;

    let mut permutation: Vec<u32> = (0..pixel_count as u32).collect();
    for i in 0..half {
        let j = rng.usize(i..pixel_count);
        permutation.swap(i, j);
    }

    permutation.truncate(half);
    permutation
}
