use crate::reports;
use bluemask::config::Config;
use bluemask::error::MaskResult;
use bluemask::mask::PixelRecord;
use bluemask::optimizer::{Optimizer, ProgressCallback};
use bluemask::{export, preview};
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub config: Config,

    /// JSON file overriding the whole configuration.
    #[arg(long)]
    pub params: Option<String>,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    /// Wall-clock budget in seconds; the run stops between rounds.
    #[arg(short = 'T', long)]
    pub time: Option<u64>,

    #[arg(long, default_value = "mask.h")]
    pub header: String,

    #[arg(long, default_value = "mask.tile")]
    pub tile: String,

    /// Optional PGM dump of the Gaussian preview field.
    #[arg(long)]
    pub preview: Option<String>,
}

struct ConsoleProgress {
    deadline: Option<Instant>,
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, phase: usize, round: u64, accepted: u32, rounds_per_sec: f32) -> bool {
        info!(
            "Phase {:2} | Round {:6} | Swaps {:8} | {:.1} rounds/s",
            phase, round, accepted, rounds_per_sec
        );

        match self.deadline {
            Some(deadline) => Instant::now() < deadline,
            None => true,
        }
    }
}

pub fn run(args: OptimizeArgs) -> MaskResult<()> {
    let config = match &args.params {
        Some(path) => {
            info!("Loading parameters from: {}", path);
            Config::load_from_file(path)?
        }
        None => args.config.clone(),
    };

    let mut optimizer = Optimizer::new(&config, args.seed)?;

    let progress = ConsoleProgress {
        deadline: args.time.map(|t| Instant::now() + Duration::from_secs(t)),
    };
    optimizer.run(&progress);

    reports::print_phase_summary(optimizer.summaries());

    if !optimizer.is_finished() {
        warn!("Stopped before all dimensions were committed; skipping export");
        return Ok(());
    }

    let mask = optimizer.mask();
    let sequence = optimizer.sequence();
    let mut padding_rng = match args.seed {
        Some(s) => fastrand::Rng::with_seed(s ^ 0x5eed),
        None => fastrand::Rng::new(),
    };

    info!("Exporting the header artifact to {}", args.header);
    let mut header = BufWriter::new(File::create(&args.header)?);
    export::write_header(&mut header, mask, sequence, &mut padding_rng)?;

    info!("Exporting the tile artifact to {}", args.tile);
    let mut tile = BufWriter::new(File::create(&args.tile)?);
    export::write_tile(&mut tile, mask, sequence, config.mask.spp as usize)?;

    if let Some(path) = &args.preview {
        info!("Exporting the preview field to {}", path);
        let records: Vec<PixelRecord> = (0..mask.pixel_count())
            .map(|p| {
                [
                    mask.committed_key(p, 0),
                    mask.committed_key(p, 1),
                    p as u32,
                    0,
                ]
            })
            .collect();
        let field = preview::preintegrate(sequence, 0, &records, config.mask.spp as usize);

        let mut pgm = BufWriter::new(File::create(path)?);
        preview::write_pgm(&mut pgm, &field, mask.mask_size())?;
    }

    Ok(())
}
