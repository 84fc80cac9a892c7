//! Actuarial Batch - distributed reserve calculation on AWS Batch
//!
//! This library provides:
//! - The per-worker Monte Carlo claims simulation (policy shard in, one reserve out)
//! - The completion handler that exports the shared FSx filesystem to S3, waits for
//!   the export task, and sums the per-worker reserve files
//! - Typed parameters of the deployed stack (job definition, event rule, mounts)

pub mod config;
pub mod deployment;
pub mod error;
pub mod events;
pub mod export;
pub mod handler;
pub mod policy;
pub mod results;
pub mod simulation;

// Re-export commonly used types
pub use config::HandlerConfig;
pub use error::{HandlerError, SimulationError};
pub use handler::{CompletionHandler, CompletionReport};
pub use policy::Policy;
pub use results::{aggregate_results, ParseMode, ReserveTotal, ResultStore};
pub use simulation::{ClaimsSimulator, ReserveEstimate, SimulationConfig};
