use clap::Parser;
use gridtemp::{
    MissingMonthPolicy, OutputFormat, PopulationClass, PopulationFilter, DEFAULT_GRID_SIZE,
    DEFAULT_MIN_SAMPLES,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about = "Global temperature anomalies from station records.", version)]
pub struct Cli {
    /// GHCN-M v3 station inventory (.inv)
    #[arg(required_unless_present = "parquet_stations")]
    pub inventory: Option<PathBuf>,
    /// GHCN-M v3 monthly data (.dat)
    #[arg(required_unless_present = "parquet_observations")]
    pub data: Option<PathBuf>,

    /// Columnar station table, instead of an inventory file
    #[arg(long, requires = "parquet_observations", conflicts_with = "inventory")]
    pub parquet_stations: Option<PathBuf>,
    /// Columnar monthly observations, instead of a data file
    #[arg(long, requires = "parquet_stations", conflicts_with = "data")]
    pub parquet_observations: Option<PathBuf>,
    /// Element to read from columnar observations
    #[arg(long, default_value = "tavg")]
    pub element: String,
    /// Dataset variant to read from columnar observations (e.g. raw, tob, FLs.52j)
    #[arg(long)]
    pub dataset_type: Option<String>,
    /// Class for columnar stations without a population classification
    #[arg(long, default_value = "rural")]
    pub default_population: PopulationClass,

    /// Station classes to include, as letters: R(ural), S(uburban), U(rban)
    #[arg(env = "GRIDTEMP_POPULATION", short, long, default_value = "RSU", value_parser = parse_population)]
    pub population: PopulationFilter,
    /// Grid cell size in degrees
    #[arg(short, long, default_value_t = DEFAULT_GRID_SIZE)]
    pub grid: f64,
    /// First year of the baseline reference period
    #[arg(long, default_value_t = 1951)]
    pub ref_start: i32,
    /// Last year of the baseline reference period
    #[arg(long, default_value_t = 1980)]
    pub ref_end: i32,
    /// Reference-period readings required for a monthly baseline
    #[arg(long, default_value_t = DEFAULT_MIN_SAMPLES)]
    pub min_samples: usize,
    /// First output year
    #[arg(long, default_value_t = 1880)]
    pub first_year: i32,
    /// Last output year
    #[arg(long, default_value_t = 2010)]
    pub last_year: i32,
    /// How yearly means treat months without a global value: skip or propagate
    #[arg(long, default_value_t = MissingMonthPolicy::SkipMissing)]
    pub missing_months: MissingMonthPolicy,

    /// Output file; standard output when absent
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Output format: csv, json or parquet
    #[arg(short, long, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
    /// Write the monthly series instead of yearly means
    #[arg(long)]
    pub monthly: bool,
}

fn parse_population(codes: &str) -> Result<PopulationFilter, String> {
    PopulationFilter::from_codes(codes)
        .ok_or_else(|| format!("'{codes}' is not a combination of R, S and U"))
}
