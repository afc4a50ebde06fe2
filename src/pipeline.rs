//! The full run: population filter, baselines, gridded aggregation and yearly means,
//! as ordered stages that each consume the finished output of the previous one.

use crate::config::AnomalyConfig;
use crate::engine::aggregator::{AnomalyAggregator, AnomalySeries};
use crate::engine::baseline::{BaselineCalculator, BaselineStats};
use crate::engine::grid::GridIndex;
use crate::engine::summarizer::{SeriesSummarizer, YearlySeries};
use crate::error::ConfigError;
use crate::observations::store::ObservationStore;
use crate::stations::catalog::StationCatalog;
use crate::types::station::PopulationFilter;
use log::info;
use serde::Serialize;
use std::borrow::Cow;

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    /// Stations left after the population filter.
    pub stations: usize,
    pub baseline_stats: BaselineStats,
    pub monthly: AnomalySeries,
    pub yearly: YearlySeries,
}

/// Headline numbers of a report, for logs and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportSummary {
    pub stations: usize,
    pub baseline_stats: BaselineStats,
    pub months: usize,
    pub missing_months: usize,
    pub years: usize,
}

impl AnomalyReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            stations: self.stations,
            baseline_stats: self.baseline_stats,
            months: self.monthly.len(),
            missing_months: self.monthly.missing_count(),
            years: self.yearly.len(),
        }
    }
}

/// A validated configuration, ready to run against loaded data.
///
/// # Examples
///
/// ```
/// use gridtemp::{AnomalyConfig, GlobalAnomaly, ObservationStore, StationCatalog, YearRange};
///
/// let config = AnomalyConfig::builder().years(YearRange::new(1990, 1991)).build();
/// let engine = GlobalAnomaly::new(config).unwrap();
///
/// let report = engine.run(&StationCatalog::new(), &ObservationStore::new());
/// assert_eq!(report.yearly.len(), 2);
/// assert!(report.yearly.iter().all(|row| row.value.is_none()));
/// ```
#[derive(Debug, Clone)]
pub struct GlobalAnomaly {
    config: AnomalyConfig,
    grid: GridIndex,
}

impl GlobalAnomaly {
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`AnomalyConfig::validate`].
    pub fn new(config: AnomalyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = GridIndex::new(config.grid_size)?;
        Ok(Self { config, grid })
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    /// Runs every stage. Inputs are only read; the same inputs always give the
    /// same report.
    pub fn run(&self, catalog: &StationCatalog, store: &ObservationStore) -> AnomalyReport {
        let (catalog, store) = self.restrict_inputs(catalog, store);
        info!(
            "Running {} for {} stations ({} with observations), grid {}°, reference {}, years {}",
            self.config.population,
            catalog.len(),
            store.station_count(),
            self.grid.size(),
            self.config.reference_period,
            self.config.years
        );

        let baselines =
            BaselineCalculator::new(self.config.reference_period, self.config.min_samples)
                .compute(&store);

        let monthly = AnomalyAggregator::new(&catalog, self.grid, self.config.years)
            .aggregate(&store, &baselines);
        info!(
            "Global series has {} of {} months missing",
            monthly.missing_count(),
            monthly.len()
        );

        let yearly = SeriesSummarizer::new(self.config.missing_months).summarize(&monthly);
        info!(
            "Summarized {} years (missing months: {})",
            yearly.len(),
            self.config.missing_months
        );

        AnomalyReport {
            stations: catalog.len(),
            baseline_stats: baselines.stats(),
            monthly,
            yearly,
        }
    }

    /// Applies the population filter to the catalog and keeps only observations of
    /// catalog stations. Inputs are copied only when something is dropped.
    fn restrict_inputs<'a>(
        &self,
        catalog: &'a StationCatalog,
        store: &'a ObservationStore,
    ) -> (Cow<'a, StationCatalog>, Cow<'a, ObservationStore>) {
        let catalog = if self.config.population == PopulationFilter::all() {
            Cow::Borrowed(catalog)
        } else {
            Cow::Owned(catalog.filter_population(&self.config.population))
        };
        if store.iter().all(|(id, _)| catalog.contains(id)) {
            return (catalog, Cow::Borrowed(store));
        }
        let mut store = store.clone();
        store.retain_stations(|id| catalog.contains(id));
        (catalog, Cow::Owned(store))
    }
}
