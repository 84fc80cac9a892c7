//! Monte Carlo claims simulation run by each batch worker
//!
//! Each trial draws, for every policy, a claim count from an exponential
//! distribution whose mean is the policy term in years, and a normally
//! distributed amount for every claim. The worker's reserve is the mean total
//! claim amount across trials.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Normal};
use rayon::prelude::*;

use crate::error::SimulationError;
use crate::policy::Policy;
use crate::results::RESULT_SUFFIX;

pub const NUM_SIMULATIONS: usize = 10_000;
pub const DEFAULT_CLAIM_MEAN: f64 = 100.0;
pub const DEFAULT_CLAIM_STD_DEV: f64 = 10.0;

/// Simulation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub num_simulations: usize,
    /// Base seed; trial `i` uses a stream derived from `(seed, i)`.
    /// The default draws a fresh seed from OS entropy so that shards are
    /// independent; set it explicitly to reproduce a run.
    pub seed: u64,
    pub claim_mean: f64,
    pub claim_std_dev: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: NUM_SIMULATIONS,
            seed: rand::random(),
            claim_mean: DEFAULT_CLAIM_MEAN,
            claim_std_dev: DEFAULT_CLAIM_STD_DEV,
        }
    }
}

/// Outcome of one worker's simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReserveEstimate {
    pub average_reserve: f64,
    pub simulations: usize,
    pub policies: usize,
}

/// Pre-built samplers for a shard of policies
#[derive(Debug, Clone)]
pub struct ClaimsSimulator {
    claim_counts: Vec<Exp<f64>>,
    claim_amount: Normal<f64>,
    config: SimulationConfig,
}

impl ClaimsSimulator {
    pub fn new(policies: &[Policy], config: SimulationConfig) -> Result<Self, SimulationError> {
        let claim_counts = policies
            .iter()
            .map(|policy| {
                Exp::new(policy.claim_rate()).map_err(|e| SimulationError::InvalidPolicy {
                    policy_id: policy.id.clone(),
                    reason: format!("claim count distribution: {}", e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let claim_amount = Normal::new(config.claim_mean, config.claim_std_dev).map_err(|e| {
            SimulationError::InvalidPolicy {
                policy_id: "*".to_string(),
                reason: format!("claim amount distribution: {}", e),
            }
        })?;

        Ok(Self {
            claim_counts,
            claim_amount,
            config,
        })
    }

    fn trial_rng(&self, trial: usize) -> StdRng {
        let stream = (trial as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(self.config.seed ^ stream)
    }

    /// Total claims for one trial across the shard
    pub fn run_trial(&self, trial: usize) -> f64 {
        let mut rng = self.trial_rng(trial);
        let mut reserves = 0.0;
        for claim_count in &self.claim_counts {
            let num_claims = claim_count.sample(&mut rng) as usize;
            for _ in 0..num_claims {
                reserves += self.claim_amount.sample(&mut rng);
            }
        }
        reserves
    }

    /// Run every trial in parallel and average the totals
    pub fn run(&self) -> ReserveEstimate {
        let n = self.config.num_simulations;
        let trials: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|trial| self.run_trial(trial))
            .collect();

        // summed in trial order so the result does not depend on thread scheduling
        let total: f64 = trials.iter().sum();
        let average_reserve = if n == 0 { 0.0 } else { total / n as f64 };

        ReserveEstimate {
            average_reserve,
            simulations: n,
            policies: self.claim_counts.len(),
        }
    }
}

/// Result file for an input shard: `<output_dir>/<shard stem>.txt`
pub fn result_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reserves".to_string());
    output_dir.join(format!("{}{}", stem, RESULT_SUFFIX))
}

/// Write the reserve as a bare decimal, the format the aggregator expects
pub fn write_reserve(path: &Path, reserve: f64) -> Result<(), SimulationError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, reserve.to_string())?;
    info!("Wrote reserve {} to {}", reserve, path.display());
    Ok(())
}
