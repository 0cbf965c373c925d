//! Scenario results collected by a harness run.

use serde::Serialize;

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub passed: bool,
    /// Failure chain, formatted with `{:#}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Results of a full harness run, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub scenarios: Vec<ScenarioResult>,
}

impl Report {
    pub fn record(&mut self, name: &'static str, outcome: &anyhow::Result<()>, elapsed_ms: u64) {
        self.scenarios.push(ScenarioResult {
            name,
            passed: outcome.is_ok(),
            error: outcome.as_ref().err().map(|e| format!("{e:#}")),
            elapsed_ms,
        });
    }

    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Serialize the report, with totals, as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "passed": self.passed(),
            "failed": self.failed(),
            "total_elapsed_ms": self.scenarios.iter().map(|s| s.elapsed_ms).sum::<u64>(),
            "scenarios": self.scenarios,
        })
    }
}
