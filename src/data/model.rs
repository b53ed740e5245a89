use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// MetricSeries – one named array of a method's results
// ---------------------------------------------------------------------------

/// A single metric array as exported by the aggregation step.
///
/// Status arrays are usually booleans, but exports that went through a
/// numeric table come back as `0`/`1` values; [`MetricSeries::as_flags`]
/// accepts both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricSeries {
    Flags(Vec<bool>),
    Values(Vec<f64>),
}

impl MetricSeries {
    /// Read the series as numeric values. An empty series reads as either kind.
    pub fn as_values(&self) -> Option<Vec<f64>> {
        match self {
            MetricSeries::Values(v) => Some(v.clone()),
            MetricSeries::Flags(f) if f.is_empty() => Some(Vec::new()),
            MetricSeries::Flags(_) => None,
        }
    }

    /// Read the series as success flags.
    pub fn as_flags(&self) -> Option<Vec<bool>> {
        match self {
            MetricSeries::Flags(f) => Some(f.clone()),
            MetricSeries::Values(v) => v
                .iter()
                .map(|&x| {
                    if x == 1.0 {
                        Some(true)
                    } else if x == 0.0 {
                        Some(false)
                    } else {
                        None
                    }
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ResultsError {
    #[error("scenario '{0}' not found in results")]
    MissingScenario(String),

    #[error("method '{method}' not found in scenario '{scenario}'")]
    MissingMethod { scenario: String, method: String },

    #[error("metric '{metric}' not found for method '{method}' in scenario '{scenario}'")]
    MissingMetric {
        scenario: String,
        method: String,
        metric: String,
    },

    #[error("metric '{metric}' of method '{method}' is not a {expected} series")]
    WrongKind {
        method: String,
        metric: String,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// ResultsSet – the complete loaded mapping
// ---------------------------------------------------------------------------

/// metric name → series
pub type MethodResults = BTreeMap<String, MetricSeries>;

/// method name → metrics
pub type ScenarioResults = BTreeMap<String, MethodResults>;

/// scenario name → method name → metric name → series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsSet {
    scenarios: BTreeMap<String, ScenarioResults>,
}

impl ResultsSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) one series.
    pub fn insert(&mut self, scenario: &str, method: &str, metric: &str, series: MetricSeries) {
        self.scenarios
            .entry(scenario.to_string())
            .or_default()
            .entry(method.to_string())
            .or_default()
            .insert(metric.to_string(), series);
    }

    pub fn has_scenario(&self, scenario: &str) -> bool {
        self.scenarios.contains_key(scenario)
    }

    pub fn scenario(&self, scenario: &str) -> Result<&ScenarioResults, ResultsError> {
        self.scenarios
            .get(scenario)
            .ok_or_else(|| ResultsError::MissingScenario(scenario.to_string()))
    }

    pub fn method(&self, scenario: &str, method: &str) -> Result<&MethodResults, ResultsError> {
        self.scenario(scenario)?
            .get(method)
            .ok_or_else(|| ResultsError::MissingMethod {
                scenario: scenario.to_string(),
                method: method.to_string(),
            })
    }

    /// Numeric metric of one method, e.g. `iate_trans`.
    pub fn metric_values(
        &self,
        scenario: &str,
        method: &str,
        metric: &str,
    ) -> Result<Vec<f64>, ResultsError> {
        let series = self
            .method(scenario, method)?
            .get(metric)
            .ok_or_else(|| ResultsError::MissingMetric {
                scenario: scenario.to_string(),
                method: method.to_string(),
                metric: metric.to_string(),
            })?;
        series.as_values().ok_or_else(|| ResultsError::WrongKind {
            method: method.to_string(),
            metric: metric.to_string(),
            expected: "numeric",
        })
    }

    /// Per-repetition status flags of one method, `None` if the method has
    /// no such metric.
    pub fn metric_flags(
        &self,
        scenario: &str,
        method: &str,
        metric: &str,
    ) -> Result<Option<Vec<bool>>, ResultsError> {
        let Some(series) = self.method(scenario, method)?.get(metric) else {
            return Ok(None);
        };
        series
            .as_flags()
            .map(Some)
            .ok_or_else(|| ResultsError::WrongKind {
                method: method.to_string(),
                metric: metric.to_string(),
                expected: "boolean",
            })
    }

    /// Total number of series across all scenarios and methods.
    pub fn series_count(&self) -> usize {
        self.scenarios
            .values()
            .flat_map(|methods| methods.values())
            .map(|metrics| metrics.len())
            .sum()
    }
}
