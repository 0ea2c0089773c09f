use tracing::{info, warn};

use super::error::RowError;
use super::evaluator::evaluate_basin;
use super::types::{BasinRecord, ModelConfig, RawRow, Scenario, StrategyResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// Zero-based position of the row in the scenario input.
    pub index: usize,
    pub error: RowError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRun {
    pub scenario: Scenario,
    pub results: Vec<StrategyResult>,
    pub rejected: Vec<RejectedRow>,
}

/// Evaluates every row of one scenario table. Rows that fail validation
/// are collected in `rejected`; the rest of the batch still runs.
pub fn run_scenario(config: &ModelConfig, scenario: Scenario, rows: &[RawRow]) -> ScenarioRun {
    let (results, rejected) = rows.iter().enumerate().fold(
        (Vec::with_capacity(rows.len() * 3), Vec::new()),
        |(mut results, mut rejected), (index, row)| {
            match BasinRecord::try_from(row) {
                Ok(record) => results.extend(evaluate_basin(config, &record)),
                Err(error) => {
                    warn!(scenario = scenario.id(), row = index, %error, "rejected input row");
                    rejected.push(RejectedRow { index, error });
                }
            }
            (results, rejected)
        },
    );

    info!(
        scenario = scenario.id(),
        rows = rows.len(),
        results = results.len(),
        rejected = rejected.len(),
        "scenario evaluated"
    );

    ScenarioRun {
        scenario,
        results,
        rejected,
    }
}
