//! Reduction of monthly global anomalies to yearly means.

use crate::engine::aggregator::AnomalySeries;
use crate::types::period::Year;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a yearly mean treats months that have no global value.
///
/// Missing months are never counted as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingMonthPolicy {
    /// Average the months that are present; the year is missing only when all twelve are.
    #[default]
    SkipMissing,
    /// Any missing month makes the whole year missing.
    PropagateMissing,
}

impl fmt::Display for MissingMonthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingMonthPolicy::SkipMissing => "skip",
            MissingMonthPolicy::PropagateMissing => "propagate",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for MissingMonthPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" | "skip-missing" => Ok(MissingMonthPolicy::SkipMissing),
            "propagate" | "propagate-missing" => Ok(MissingMonthPolicy::PropagateMissing),
            other => Err(format!("unknown missing-month policy '{other}'")),
        }
    }
}

/// One row of the final output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyAnomaly {
    pub year: Year,
    /// Yearly mean anomaly; `None` when the policy deems the year missing.
    pub value: Option<f64>,
    /// Months that had a global value.
    pub months: usize,
}

/// Yearly mean anomalies, in increasing year order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearlySeries {
    years: BTreeMap<Year, YearlyAnomaly>,
}

impl YearlySeries {
    pub fn get(&self, year: Year) -> Option<f64> {
        self.years.get(&year).and_then(|row| row.value)
    }

    pub fn row(&self, year: Year) -> Option<&YearlyAnomaly> {
        self.years.get(&year)
    }

    /// Rows in increasing year order.
    pub fn iter(&self) -> impl Iterator<Item = &YearlyAnomaly> {
        self.years.values()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl FromIterator<YearlyAnomaly> for YearlySeries {
    fn from_iter<T: IntoIterator<Item = YearlyAnomaly>>(iter: T) -> Self {
        let years = iter.into_iter().map(|row| (row.year, row)).collect();
        YearlySeries { years }
    }
}

/// Reduces an [`AnomalySeries`] to a [`YearlySeries`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesSummarizer {
    policy: MissingMonthPolicy,
}

impl SeriesSummarizer {
    pub fn new(policy: MissingMonthPolicy) -> Self {
        Self { policy }
    }

    pub fn summarize(&self, series: &AnomalySeries) -> YearlySeries {
        let years = series
            .years()
            .map(|(year, months)| {
                let present: Vec<f64> = months.iter().filter_map(|m| m.value).collect();
                let value = match self.policy {
                    _ if present.is_empty() => None,
                    MissingMonthPolicy::PropagateMissing if present.len() < 12 => None,
                    _ => Some(present.iter().sum::<f64>() / present.len() as f64),
                };
                let row = YearlyAnomaly {
                    year,
                    value,
                    months: present.len(),
                };
                (year, row)
            })
            .collect();
        YearlySeries { years }
    }
}
