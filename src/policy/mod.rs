//! Policy data structures and shard loading

mod data;
pub mod loader;

pub use data::{Policy, Gender, SmokingStatus, CLAIM_INTERVAL_DAYS};
pub use loader::{load_policies, load_policies_from_reader};
