//! Load policy shards from CSV

use super::{Gender, Policy, SmokingStatus};
use crate::error::SimulationError;
use csv::Reader;
use std::path::Path;

/// Raw CSV row matching the policy shard columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: String,
    age: f64,
    gender: String,
    smoking_status: String,
    occupation: String,
    policy_type: String,
    effective_date: String,
    term: f64,
    premium: f64,
}

impl CsvRow {
    fn to_policy(self) -> Result<Policy, SimulationError> {
        if !(self.term.is_finite() && self.term > 0.0) {
            return Err(SimulationError::InvalidPolicy {
                policy_id: self.id,
                reason: format!("term must be positive, got {}", self.term),
            });
        }

        Ok(Policy {
            gender: Gender::parse(&self.gender),
            smoking_status: SmokingStatus::parse(&self.smoking_status),
            id: self.id,
            age: self.age,
            occupation: self.occupation,
            policy_type: self.policy_type,
            effective_date: self.effective_date,
            term: self.term,
            premium: self.premium,
        })
    }
}

/// Load all policies from a CSV file
pub fn load_policies<P: AsRef<Path>>(path: P) -> Result<Vec<Policy>, SimulationError> {
    let reader = Reader::from_path(path)?;
    collect_policies(reader)
}

/// Load policies from any reader (e.g., string buffer, network stream)
pub fn load_policies_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Policy>, SimulationError> {
    collect_policies(Reader::from_reader(reader))
}

fn collect_policies<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<Policy>, SimulationError> {
    let mut policies = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        policies.push(row.to_policy()?);
    }
    Ok(policies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SHARD: &str = "\
id,age,gender,smoking_status,occupation,policy_type,effective_date,term,premium
P-001,45,Male,Non-Smoker,Engineer,Term Life,2021-03-15,3650,1200.50
P-002,62,Female,Smoker,Pharmacist,Whole Life,06/01/2019,7300,2400
";

    #[test]
    fn test_load_policies() {
        let policies = load_policies_from_reader(SHARD.as_bytes()).expect("Failed to load policies");
        assert_eq!(policies.len(), 2);

        let p1 = &policies[0];
        assert_eq!(p1.id, "P-001");
        assert_eq!(p1.gender, Gender::Male);
        assert_eq!(p1.smoking_status, SmokingStatus::NonSmoker);
        assert_eq!(p1.effective_on(), NaiveDate::from_ymd_opt(2021, 3, 15));
        assert_eq!(p1.term, 3650.0);

        let p2 = &policies[1];
        assert_eq!(p2.policy_type, "Whole Life");
        assert_eq!(p2.effective_on(), NaiveDate::from_ymd_opt(2019, 6, 1));
    }

    #[test]
    fn test_unfamiliar_descriptive_columns_load() {
        let csv = "\
id,age,gender,smoking_status,occupation,policy_type,effective_date,term,premium
P-1,41,Other,No,Clerk,Term Life,2021-01-01,3650,700
P-2,58,Female,Former Smoker,Chef,Term Life,2021-01-01,1825,900
P-3,36,Male,No,Driver,Whole Life,2021-01-01T00:00:00,7300,650
";
        let policies = load_policies_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(policies.len(), 3);
        assert_eq!(policies[0].gender, Gender::Other("Other".to_string()));
        assert_eq!(
            policies[1].smoking_status,
            SmokingStatus::Other("Former Smoker".to_string())
        );
        assert_eq!(policies[2].effective_date, "2021-01-01T00:00:00");
        assert_eq!(policies[2].effective_on(), None);
    }

    #[test]
    fn test_rejects_zero_term() {
        let csv = "\
id,age,gender,smoking_status,occupation,policy_type,effective_date,term,premium
P-009,30,Female,No,Nurse,Term Life,2020-01-01,0,500
";
        let err = load_policies_from_reader(csv.as_bytes()).unwrap_err();
        match err {
            SimulationError::InvalidPolicy { policy_id, .. } => assert_eq!(policy_id, "P-009"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_row() {
        let csv = "\
id,age,gender,smoking_status,occupation,policy_type,effective_date,term,premium
P-010,thirty,Female,No,Nurse,Term Life,2020-01-01,365,500
";
        assert!(matches!(
            load_policies_from_reader(csv.as_bytes()),
            Err(SimulationError::Csv(_))
        ));
    }
}
