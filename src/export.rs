use crate::error::{MaskError, MaskResult};
use crate::mask::MaskState;
use crate::sequence::{BaseSequence, SequenceKind};
use std::io::Write;

/// The header artifact always carries this many key slots per pixel so the
/// table layout is independent of how many dimensions were optimized; the
/// trailing slots are filled with fresh random keys.
pub const PADDED_DIMENSIONS: usize = 256;

fn require_finalized(mask: &MaskState) -> MaskResult<()> {
    if mask.is_finalized() {
        Ok(())
    } else {
        Err(MaskError::Validation(
            "mask export requires all dimensions to be committed".to_string(),
        ))
    }
}

/// Writes the compact header artifact: the static scrambling-key table plus
/// the family-specific combine function, ready for embedding in rendering
/// code.
pub fn write_header<W: Write>(
    w: &mut W,
    mask: &MaskState,
    sequence: &BaseSequence,
    rng: &mut fastrand::Rng,
) -> MaskResult<()> {
    require_finalized(mask)?;

    let n = mask.mask_size();
    let d = mask.dimensions();

    writeln!(w, "#pragma once")?;
    writeln!(w)?;
    match sequence.kind() {
        SequenceKind::Owen => writeln!(w, "#include \"sobol_4096spp_256d.h\"")?,
        SequenceKind::Rank1 => writeln!(w, "#include \"rank1_1024spp_10d.h\"")?,
    }
    writeln!(w)?;
    writeln!(w)?;

    writeln!(
        w,
        "static const uint32_t scramblingKeys[{}][{}][{}] = {{",
        n, n, PADDED_DIMENSIONS
    )?;
    for i in 0..n {
        write!(w, "    {{")?;
        for j in 0..n {
            write!(w, "{{")?;

            let pixel = i * n + j;
            for dim in 0..PADDED_DIMENSIONS {
                let key = if dim < d {
                    mask.committed_key(pixel, dim)
                } else {
                    rng.u32(..)
                };

                write!(w, "{}U", key)?;
                if dim != PADDED_DIMENSIONS - 1 {
                    write!(w, ", ")?;
                }
            }
            write!(w, "}}")?;

            if j != n - 1 {
                write!(w, ", ")?;
            }
        }
        write!(w, "}}")?;

        if i != n - 1 {
            writeln!(w, ",")?;
        }
    }
    writeln!(w)?;
    writeln!(w, "}};")?;
    writeln!(w)?;
    writeln!(w)?;

    writeln!(w, "float sample(int i, int j, int sampleID, int d) {{")?;
    writeln!(w, "    i = i & {};", n - 1)?;
    writeln!(w, "    j = j & {};", n - 1)?;
    writeln!(w)?;
    match sequence.kind() {
        SequenceKind::Owen => {
            writeln!(w, "    uint32_t scramble = scramblingKeys[i][j][d];")?;
            writeln!(
                w,
                "    uint32_t sample = sobol_sequence[sampleID][d] ^ scramble;"
            )?;
            writeln!(w)?;
            writeln!(w, "    return (sample + 0.5f) / {}ULL;", 1u64 << 32)?;
        }
        SequenceKind::Rank1 => {
            writeln!(
                w,
                "    float scramble = float(double(scramblingKeys[i][j][d]) / double({}ULL));",
                1u64 << 32
            )?;
            writeln!(
                w,
                "    float sample = fmodf(rank1_sequence[sampleID][d] + scramble, 1.0f);"
            )?;
            writeln!(w)?;
            writeln!(w, "    return sample;")?;
        }
    }
    writeln!(w, "}}")?;

    Ok(())
}

/// Writes the flat tile artifact: three header lines (grid size, spp,
/// dimension count) then one resolved sample coordinate per line in
/// column-major pixel order.
pub fn write_tile<W: Write>(
    w: &mut W,
    mask: &MaskState,
    sequence: &BaseSequence,
    spp: usize,
) -> MaskResult<()> {
    require_finalized(mask)?;

    let n = mask.mask_size();
    let d = mask.dimensions();

    writeln!(w, "{}", n)?;
    writeln!(w, "{}", spp)?;
    writeln!(w, "{}", d)?;

    for j in 0..n {
        for i in 0..n {
            let pixel = i * n + j;
            for k in 0..spp {
                for dim in 0..d {
                    let value = sequence.sample(k, dim, mask.committed_key(pixel, dim));
                    writeln!(w, "{}", value)?;
                }
            }
        }
    }

    Ok(())
}
