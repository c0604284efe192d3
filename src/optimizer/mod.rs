pub mod evaluator;
pub mod proposer;

use self::evaluator::{ParallelEvaluator, RoundKey, SwapEvaluator};
use crate::config::Config;
use crate::error::MaskResult;
use crate::estimator::{DistanceEstimator, DistanceMatrix};
use crate::mask::MaskState;
use crate::sequence::BaseSequence;
use std::sync::Arc;
use tracing::{info, warn};

/// Substituted when the configured saturation threshold is zero.
const DEFAULT_SWAP_THRESHOLD: u32 = 1;

pub struct OptimizerOptions {
    pub heaviside_count: usize,
    pub sample_interval: u64,
    pub swap_threshold: u32,
    pub max_rounds: u64,
}

impl From<&Config> for OptimizerOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            heaviside_count: cfg.search.heaviside_count as usize,
            sample_interval: cfg.search.sample_interval as u64,
            swap_threshold: cfg.search.swap_threshold,
            max_rounds: cfg.search.max_rounds,
        }
    }
}

/// A trait for receiving updates during optimization.
/// Boolean return value indicates if the search should continue (true) or
/// stop between rounds (false). Whatever has been committed stays valid.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, phase: usize, round: u64, accepted: u32, rounds_per_sec: f32) -> bool;
}

/// Bookkeeping for one completed phase, for the final report.
#[derive(Debug, Clone)]
pub struct PhaseSummary {
    pub dimension: usize,
    pub rounds: u64,
    pub accepted: u32,
}

/// Drives the phase loop: one evaluator dispatch plus publish per tick,
/// counter sampling on a fixed interval, commit and matrix rebuild on
/// saturation, until every dimension pair has been committed.
pub struct Optimizer {
    sequence: Arc<BaseSequence>,
    estimator: DistanceEstimator,
    matrix: DistanceMatrix,
    mask: MaskState,
    candidates: Vec<u32>,
    evaluator: Box<dyn SwapEvaluator>,
    rng: fastrand::Rng,
    options: OptimizerOptions,

    round_in_phase: u64,
    swap_baseline: u32,
    finished: bool,
    summaries: Vec<PhaseSummary>,
}

impl Optimizer {
    pub fn new(config: &Config, seed: Option<u64>) -> MaskResult<Self> {
        config.validate()?;

        let kind = config.sequence_kind()?;
        let mask_size = config.mask.mask_size as usize;
        let dimensions = config.mask.dimensions as usize;
        let pixel_count = mask_size * mask_size;

        info!("Initializing the optimizer...");
        info!("Using the {} sequence family", kind);

        let mut options = OptimizerOptions::from(config);
        if options.swap_threshold == 0 {
            warn!(
                "swap_threshold 0 never saturates; substituting {}",
                DEFAULT_SWAP_THRESHOLD
            );
            options.swap_threshold = DEFAULT_SWAP_THRESHOLD;
        }

        let mut rng = if let Some(s) = seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };

        let sequence = Arc::new(BaseSequence::generate(kind, dimensions)?);
        let estimator = DistanceEstimator::new(
            sequence.clone(),
            config.mask.spp as usize,
            options.heaviside_count,
        );

        let candidates = proposer::generate_candidates(&mut rng, pixel_count);
        let mask = MaskState::new(mask_size, dimensions, &mut rng);
        let mut matrix = DistanceMatrix::new(pixel_count)?;

        info!(
            "Dimensions 1 and 2 out of {}: building the distance matrix",
            dimensions
        );
        estimator.rebuild(mask.front(), 0, &mut matrix, &mut rng);

        Ok(Self {
            sequence,
            estimator,
            matrix,
            mask,
            candidates,
            evaluator: Box::new(ParallelEvaluator::new(mask_size)),
            rng,
            options,
            round_in_phase: 0,
            swap_baseline: 0,
            finished: false,
            summaries: Vec::new(),
        })
    }

    pub fn sequence(&self) -> &BaseSequence {
        &self.sequence
    }

    pub fn mask(&self) -> &MaskState {
        &self.mask
    }

    pub fn candidates(&self) -> &[u32] {
        &self.candidates
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn summaries(&self) -> &[PhaseSummary] {
        &self.summaries
    }

    /// Total accepted swaps in the current phase; the externally queryable
    /// progress signal.
    pub fn accepted_swaps(&self) -> u32 {
        self.mask.accepted_swaps()
    }

    /// One round: a single evaluator dispatch over all candidate anchors
    /// followed by the front/back publish, then the periodic saturation
    /// test. Returns false once all phases have committed.
    pub fn tick(&mut self) -> bool {
        if self.finished {
            return false;
        }

        let n = self.mask.mask_size() as u32;
        let round = RoundKey {
            offset_x: self.rng.u32(0..n),
            offset_y: self.rng.u32(0..n),
        };

        let (front, back, counter) = self.mask.buffers();
        self.evaluator
            .dispatch(round, &self.candidates, front, back, &self.matrix, counter);
        self.mask.publish();
        self.round_in_phase += 1;

        // A fresh phase always completes at least one full interval before
        // the saturation test runs.
        if self.round_in_phase % self.options.sample_interval == 0 {
            let total = self.mask.accepted_swaps();
            let delta = total - self.swap_baseline;
            self.swap_baseline = total;

            let capped =
                self.options.max_rounds > 0 && self.round_in_phase >= self.options.max_rounds;
            if delta < self.options.swap_threshold || capped {
                self.finish_phase();
            }
        }

        !self.finished
    }

    fn finish_phase(&mut self) {
        let dimension = self.mask.active_dimension();
        let accepted = self.mask.accepted_swaps();
        info!(
            "Dimensions {} and {} saturated after {} rounds ({} swaps)",
            dimension + 1,
            dimension + 2,
            self.round_in_phase,
            accepted
        );
        self.summaries.push(PhaseSummary {
            dimension,
            rounds: self.round_in_phase,
            accepted,
        });

        if self.mask.commit_phase(&mut self.rng) {
            let next = self.mask.active_dimension();
            info!(
                "Dimensions {} and {} out of {}: building the distance matrix",
                next + 1,
                next + 2,
                self.mask.dimensions()
            );
            self.estimator
                .rebuild(self.mask.front(), next, &mut self.matrix, &mut self.rng);
            self.round_in_phase = 0;
            self.swap_baseline = 0;
        } else {
            self.finished = true;
        }
    }

    /// Runs ticks until `Finished`, reporting once per sampling interval.
    /// The callback may stop the run between rounds.
    pub fn run<CB: ProgressCallback>(&mut self, callback: &CB) {
        let mut last_report = std::time::Instant::now();
        let mut rounds_since_report = 0u64;

        while self.tick() {
            rounds_since_report += 1;

            if self.round_in_phase % self.options.sample_interval == 0 {
                let now = std::time::Instant::now();
                let elapsed = now.duration_since(last_report).as_secs_f32();
                let rps = if elapsed > 0.0 {
                    rounds_since_report as f32 / elapsed
                } else {
                    0.0
                };

                let keep_going = callback.on_progress(
                    self.mask.active_dimension() / 2,
                    self.round_in_phase,
                    self.mask.accepted_swaps(),
                    rps,
                );
                if !keep_going {
                    break;
                }

                last_report = now;
                rounds_since_report = 0;
            }
        }
    }
}
