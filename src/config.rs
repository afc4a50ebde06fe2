//! Run configuration for the anomaly engine.

use crate::engine::summarizer::MissingMonthPolicy;
use crate::error::ConfigError;
use crate::types::period::YearRange;
use crate::types::station::PopulationFilter;
use bon::Builder;

/// Default climatological reference period.
pub const DEFAULT_REFERENCE_PERIOD: YearRange = YearRange::new(1951, 1980);
/// Default output year range.
pub const DEFAULT_YEARS: YearRange = YearRange::new(1880, 2010);
/// Default minimum number of reference-period readings for a monthly baseline.
pub const DEFAULT_MIN_SAMPLES: usize = 15;
/// Default grid cell size in degrees. Coarse enough that few southern-hemisphere
/// cells are empty; a 5 degree grid overweights the northern hemisphere.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// Every tunable of a run, with the reference defaults.
///
/// Built with the generated builder; fields that are not set keep their default.
/// Call [`AnomalyConfig::validate`] (or construct a [`crate::GlobalAnomaly`], which does it
/// for you) before running anything.
///
/// # Examples
///
/// ```
/// use gridtemp::{AnomalyConfig, PopulationFilter, YearRange};
///
/// let config = AnomalyConfig::builder()
///     .grid_size(30.0)
///     .years(YearRange::new(1950, 2000))
///     .population(PopulationFilter::from_codes("R").unwrap())
///     .build();
///
/// assert_eq!(config.min_samples, 15);
/// assert_eq!(config.reference_period, YearRange::new(1951, 1980));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct AnomalyConfig {
    /// Years whose readings form each station's monthly baseline (inclusive).
    #[builder(default = DEFAULT_REFERENCE_PERIOD)]
    pub reference_period: YearRange,

    /// Readings required in the reference period before a (station, month) baseline is admitted.
    #[builder(default = DEFAULT_MIN_SAMPLES)]
    pub min_samples: usize,

    /// Grid cell edge length in degrees.
    #[builder(default = DEFAULT_GRID_SIZE)]
    pub grid_size: f64,

    /// Years for which the global series is produced (inclusive).
    #[builder(default = DEFAULT_YEARS)]
    pub years: YearRange,

    /// Station classes admitted to the run.
    #[builder(default)]
    pub population: PopulationFilter,

    /// How yearly means treat months with no global value.
    #[builder(default)]
    pub missing_months: MissingMonthPolicy,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AnomalyConfig {
    /// Rejects configurations that cannot produce a meaningful run.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidGridSize`] for a non-positive or non-finite grid size.
    /// * [`ConfigError::GridHasNoCells`] when the grid is wider than 180 degrees.
    /// * [`ConfigError::InvalidReferencePeriod`] / [`ConfigError::InvalidYearRange`] for inverted ranges.
    /// * [`ConfigError::InvalidMinimumSamples`] when `min_samples` is zero.
    /// * [`ConfigError::EmptyPopulationFilter`] when no station class is admitted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if (180.0 / self.grid_size).floor() < 1.0 {
            return Err(ConfigError::GridHasNoCells {
                grid_size: self.grid_size,
            });
        }
        if self.reference_period.is_inverted() {
            return Err(ConfigError::InvalidReferencePeriod {
                start: self.reference_period.start,
                end: self.reference_period.end,
            });
        }
        if self.min_samples < 1 {
            return Err(ConfigError::InvalidMinimumSamples(self.min_samples));
        }
        if self.years.is_inverted() {
            return Err(ConfigError::InvalidYearRange {
                start: self.years.start,
                end: self.years.end,
            });
        }
        if self.population.is_empty() {
            return Err(ConfigError::EmptyPopulationFilter);
        }
        Ok(())
    }
}
