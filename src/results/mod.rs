//! Aggregation of per-worker reserve results
//!
//! Every batch worker writes one object whose body is a single decimal number.
//! Aggregation lists the objects under the export prefix, keeps the non-empty ones
//! with the expected suffix, and sums their values.

mod local;
mod s3;

pub use local::LocalResultStore;
pub use s3::S3ResultStore;

use std::str::FromStr;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{HandlerError, Result};

/// Default key suffix of a worker result
pub const RESULT_SUFFIX: &str = ".txt";

/// Listing entry for a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

impl ObjectSummary {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Whether this object counts as a worker result
    pub fn is_result(&self, suffix: &str) -> bool {
        self.size > 0 && self.key.ends_with(suffix)
    }
}

/// Read access to wherever the results were exported
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// All objects whose key starts with `prefix`
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// Full body of one object
    async fn read_object(&self, key: &str) -> Result<Vec<u8>>;
}

/// What to do with a result body that is not a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseMode {
    /// Abort the whole aggregation
    #[default]
    Strict,
    /// Log, record and leave the object out of the total
    SkipInvalid,
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ParseMode::Strict),
            "skip-invalid" | "skip_invalid" => Ok(ParseMode::SkipInvalid),
            other => Err(format!("unknown result parse mode: {}", other)),
        }
    }
}

/// Result object left out of the total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedResult {
    pub key: String,
    pub reason: String,
}

/// Sum of all valid worker results
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReserveTotal {
    pub total: f64,
    pub included: usize,
    pub skipped: Vec<SkippedResult>,
}

/// Parse one result body: UTF-8, surrounding whitespace stripped, one decimal number
pub fn parse_reserve(body: &[u8]) -> std::result::Result<f64, String> {
    let text = std::str::from_utf8(body).map_err(|e| format!("body is not UTF-8: {}", e))?;
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|e| format!("cannot parse {:?}: {}", trimmed, e))?;
    if !value.is_finite() {
        return Err(format!("value {:?} is not finite", trimmed));
    }
    Ok(value)
}

/// Sum every result object under `prefix`
pub async fn aggregate_results<S>(
    store: &S,
    prefix: &str,
    suffix: &str,
    mode: ParseMode,
) -> Result<ReserveTotal>
where
    S: ResultStore + ?Sized,
{
    let objects = store.list_objects(prefix).await?;
    let listed = objects.len();
    let mut summary = ReserveTotal::default();

    for object in objects.into_iter().filter(|o| o.is_result(suffix)) {
        let body = store.read_object(&object.key).await?;
        match parse_reserve(&body) {
            Ok(value) => {
                debug!("{} = {}", object.key, value);
                summary.total += value;
                summary.included += 1;
            }
            Err(reason) => match mode {
                ParseMode::Strict => {
                    return Err(HandlerError::InvalidResult {
                        key: object.key,
                        reason,
                    });
                }
                ParseMode::SkipInvalid => {
                    warn!("Skipping result {}: {}", object.key, reason);
                    summary.skipped.push(SkippedResult {
                        key: object.key,
                        reason,
                    });
                }
            },
        }
    }

    info!(
        "Aggregated {} results under {} ({} listed, {} skipped)",
        summary.included,
        prefix,
        listed,
        summary.skipped.len()
    );
    Ok(summary)
}
