use crate::observations::error::LoadError;
use crate::output::OutputError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridTempError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Invalid run configuration. Always reported before any stage starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Grid size must be a positive, finite number of degrees, got {0}")]
    InvalidGridSize(f64),

    #[error("Grid size {grid_size} produces no cells (must be at most 180 degrees)")]
    GridHasNoCells { grid_size: f64 },

    #[error("Reference period start {start} is after its end {end}")]
    InvalidReferencePeriod { start: i32, end: i32 },

    #[error("Minimum sample count must be at least 1, got {0}")]
    InvalidMinimumSamples(usize),

    #[error("Year range start {start} is after its end {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Population filter excludes every station class")]
    EmptyPopulationFilter,
}
