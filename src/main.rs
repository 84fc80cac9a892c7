//! Actuarial Batch CLI
//!
//! `simulate` is the batch worker entry point: one policy shard in, one reserve
//! file out. `aggregate` sums reserve files straight from a mounted directory.

use std::path::PathBuf;
use std::time::Instant;

use actuarial_batch::{
    deployment::{EXPORT_PATH, JOB_DEFINITION},
    policy::load_policies,
    results::{aggregate_results, LocalResultStore, ParseMode, RESULT_SUFFIX},
    simulation::{result_path, write_reserve, ClaimsSimulator, SimulationConfig, NUM_SIMULATIONS},
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

#[derive(Debug, Parser)]
#[command(name = "actuarial_batch", version, about = "Distributed actuarial reserve calculation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate claims for one policy shard and write its average reserve
    Simulate {
        /// Policy CSV; relative paths are resolved against --input-dir
        #[arg(long)]
        input: PathBuf,

        #[arg(long, env = "INPUT_DIR", default_value = JOB_DEFINITION.input_dir)]
        input_dir: PathBuf,

        #[arg(long, env = "OUTPUT_DIR", default_value = JOB_DEFINITION.output_dir)]
        output_dir: PathBuf,

        #[arg(long, default_value_t = NUM_SIMULATIONS)]
        simulations: usize,

        /// Fixed seed for a reproducible run; drawn from OS entropy when absent
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Sum the reserve files found under a directory
    Aggregate {
        /// Root the keys are relative to, e.g. the filesystem mount point
        #[arg(long, default_value = JOB_DEFINITION.host_path)]
        dir: PathBuf,

        #[arg(long, default_value = EXPORT_PATH)]
        prefix: String,

        #[arg(long, default_value = RESULT_SUFFIX)]
        suffix: String,

        /// Leave unparsable files out of the total instead of failing
        #[arg(long)]
        skip_invalid: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            input,
            input_dir,
            output_dir,
            simulations,
            seed,
        } => {
            let start = Instant::now();
            let input = input_dir.join(input);

            let policies = load_policies(&input)
                .with_context(|| format!("loading policies from {}", input.display()))?;
            info!("Loaded {} policies from {}", policies.len(), input.display());

            let mut config = SimulationConfig {
                num_simulations: simulations,
                ..Default::default()
            };
            if let Some(seed) = seed {
                config.seed = seed;
            }
            info!("Simulating with seed {}", config.seed);
            let estimate = ClaimsSimulator::new(&policies, config)?.run();

            let output = result_path(&output_dir, &input);
            write_reserve(&output, estimate.average_reserve)?;

            info!(
                "Average reserve {:.2} over {} simulations of {} policies",
                estimate.average_reserve, estimate.simulations, estimate.policies
            );
            println!("Time elapsed since the start: {:?}", start.elapsed());
        }

        Command::Aggregate {
            dir,
            prefix,
            suffix,
            skip_invalid,
        } => {
            let mode = if skip_invalid {
                ParseMode::SkipInvalid
            } else {
                ParseMode::Strict
            };
            let store = LocalResultStore::new(&dir);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .context("starting runtime")?;
            let summary = runtime
                .block_on(aggregate_results(&store, &prefix, &suffix, mode))
                .with_context(|| format!("aggregating results under {}", dir.display()))?;

            for skipped in &summary.skipped {
                println!("  skipped {}: {}", skipped.key, skipped.reason);
            }
            println!("The total reserves value is: {}", summary.total);
        }
    }

    Ok(())
}
