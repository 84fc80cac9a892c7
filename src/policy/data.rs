//! Policy records fed to the claims simulation
//!
//! Only `term` drives the simulation. The descriptive columns are kept as
//! given so that a shard with unfamiliar categories still runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Days in one claim interval; policy terms are expressed in days
pub const CLAIM_INTERVAL_DAYS: f64 = 365.0;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Gender of the policyholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl Gender {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Gender::Male,
            "f" | "female" => Gender::Female,
            _ => Gender::Other(value.trim().to_string()),
        }
    }
}

/// Smoker classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmokingStatus {
    Smoker,
    NonSmoker,
    Other(String),
}

impl SmokingStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "smoker" | "s" | "yes" | "y" => SmokingStatus::Smoker,
            "non-smoker" | "nonsmoker" | "non_smoker" | "ns" | "no" | "n" => {
                SmokingStatus::NonSmoker
            }
            _ => SmokingStatus::Other(value.trim().to_string()),
        }
    }
}

/// A single policy in a worker's shard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,

    /// Age of the policyholder in years
    pub age: f64,

    pub gender: Gender,
    pub smoking_status: SmokingStatus,
    pub occupation: String,
    pub policy_type: String,

    /// Effective date as written in the shard
    pub effective_date: String,

    /// Policy term in days
    pub term: f64,

    pub premium: f64,
}

impl Policy {
    /// Term measured in claim intervals (years)
    pub fn term_in_intervals(&self) -> f64 {
        self.term / CLAIM_INTERVAL_DAYS
    }

    /// Rate of the exponential claim-count distribution
    ///
    /// The mean number of claims equals the term in claim intervals.
    pub fn claim_rate(&self) -> f64 {
        1.0 / self.term_in_intervals()
    }

    /// Effective date, when it is in one of the recognised formats
    pub fn effective_on(&self) -> Option<NaiveDate> {
        let value = self.effective_date.trim();
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }
}
