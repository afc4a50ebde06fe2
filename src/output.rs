//! Tabular output of the yearly and monthly series as CSV, JSON or parquet.

use crate::engine::aggregator::AnomalySeries;
use crate::engine::summarizer::YearlySeries;
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Marker written for a missing value in CSV output.
pub const MISSING_MARKER: &str = "NA";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed writing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Failed writing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to flush output")]
    Flush(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Parquet,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// One row of yearly output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearRow {
    pub year: i32,
    pub temp: Option<f64>,
    pub months: usize,
}

/// One row of monthly output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthRow {
    pub year: i32,
    pub month: u32,
    pub temp: Option<f64>,
    pub stations: usize,
    pub cells: usize,
}

pub fn yearly_rows(series: &YearlySeries) -> Vec<YearRow> {
    series
        .iter()
        .map(|row| YearRow {
            year: row.year.get(),
            temp: row.value,
            months: row.months,
        })
        .collect()
}

pub fn monthly_rows(series: &AnomalySeries) -> Vec<MonthRow> {
    series
        .iter()
        .map(|(when, anomaly)| MonthRow {
            year: when.year.get(),
            month: when.month.number(),
            temp: anomaly.value,
            stations: anomaly.stations,
            cells: anomaly.cells,
        })
        .collect()
}

/// The yearly series as a `year`, `temp`, `months` DataFrame.
pub fn yearly_frame(series: &YearlySeries) -> PolarsResult<DataFrame> {
    let rows = yearly_rows(series);
    df!(
        "year" => rows.iter().map(|r| r.year).collect::<Vec<i32>>(),
        "temp" => rows.iter().map(|r| r.temp).collect::<Vec<Option<f64>>>(),
        "months" => rows.iter().map(|r| r.months as u32).collect::<Vec<u32>>()
    )
}

/// The monthly series as a `year`, `month`, `temp`, `stations`, `cells` DataFrame.
pub fn monthly_frame(series: &AnomalySeries) -> PolarsResult<DataFrame> {
    let rows = monthly_rows(series);
    df!(
        "year" => rows.iter().map(|r| r.year).collect::<Vec<i32>>(),
        "month" => rows.iter().map(|r| r.month).collect::<Vec<u32>>(),
        "temp" => rows.iter().map(|r| r.temp).collect::<Vec<Option<f64>>>(),
        "stations" => rows.iter().map(|r| r.stations as u32).collect::<Vec<u32>>(),
        "cells" => rows.iter().map(|r| r.cells as u32).collect::<Vec<u32>>()
    )
}

/// Writes the yearly series and flushes `writer`. CSV carries only the `year,temp` columns.
pub fn write_yearly<W: Write>(
    series: &YearlySeries,
    mut writer: W,
    format: OutputFormat,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => write_json(&yearly_rows(series), &mut writer)?,
        OutputFormat::Csv => {
            let mut df = yearly_frame(series)?.select(["year", "temp"])?;
            write_csv(&mut df, &mut writer)?
        }
        OutputFormat::Parquet => write_parquet(&mut yearly_frame(series)?, &mut writer)?,
    }
    writer.flush().map_err(OutputError::Flush)
}

/// Writes the monthly series and flushes `writer`.
pub fn write_monthly<W: Write>(
    series: &AnomalySeries,
    mut writer: W,
    format: OutputFormat,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => write_json(&monthly_rows(series), &mut writer)?,
        OutputFormat::Csv => write_csv(&mut monthly_frame(series)?, &mut writer)?,
        OutputFormat::Parquet => write_parquet(&mut monthly_frame(series)?, &mut writer)?,
    }
    writer.flush().map_err(OutputError::Flush)
}

/// Creates (or truncates) `path` for one of the `write_*` functions.
pub fn create_output(path: &Path) -> Result<File, OutputError> {
    File::create(path).map_err(|e| OutputError::Io(path.to_path_buf(), e))
}

fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<(), OutputError> {
    CsvWriter::new(writer)
        .include_header(true)
        .with_null_value(MISSING_MARKER.to_string())
        .finish(df)?;
    Ok(())
}

fn write_parquet<W: Write>(df: &mut DataFrame, writer: W) -> Result<(), OutputError> {
    ParquetWriter::new(writer)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)?;
    Ok(())
}

fn write_json<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::summarizer::YearlyAnomaly;
    use crate::types::period::Year;

    fn yearly() -> YearlySeries {
        [
            YearlyAnomaly {
                year: Year(1990),
                value: Some(0.25),
                months: 12,
            },
            YearlyAnomaly {
                year: Year(1991),
                value: None,
                months: 0,
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn yearly_csv_has_header_and_missing_marker() -> Result<(), OutputError> {
        let mut buffer = Vec::new();
        write_yearly(&yearly(), &mut buffer, OutputFormat::Csv)?;
        let text = String::from_utf8_lossy(&buffer);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["year,temp", "1990,0.25", "1991,NA"]);
        Ok(())
    }

    /// Accepts writes but fails to flush, like a full disk behind a buffer.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn flush_failure_is_reported() {
        let result = write_yearly(&yearly(), FailingFlush(Vec::new()), OutputFormat::Json);
        assert!(matches!(result, Err(OutputError::Flush(_))));
    }

    #[test]
    fn buffered_output_is_complete_after_write() -> Result<(), OutputError> {
        let mut buffer = Vec::new();
        write_yearly(&yearly(), std::io::BufWriter::new(&mut buffer), OutputFormat::Json)?;
        assert!(serde_json::from_slice::<serde_json::Value>(&buffer).is_ok());
        Ok(())
    }

    #[test]
    fn yearly_json_lists_rows_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let mut buffer = Vec::new();
        write_yearly(&yearly(), &mut buffer, OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_slice(&buffer)?;
        assert_eq!(value[0]["year"], 1990);
        assert_eq!(value[0]["temp"], 0.25);
        assert!(value[1]["temp"].is_null());
        Ok(())
    }

    #[test]
    fn yearly_parquet_round_trips_through_polars() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("yearly.parquet");
        write_yearly(&yearly(), create_output(&path)?, OutputFormat::Parquet)?;

        let df = ParquetReader::new(File::open(&path)?).finish()?;
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("temp")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn monthly_frame_has_a_row_per_month() -> Result<(), PolarsError> {
        use crate::config::AnomalyConfig;
        use crate::observations::store::ObservationStore;
        use crate::pipeline::GlobalAnomaly;
        use crate::stations::catalog::StationCatalog;
        use crate::types::period::YearRange;

        let config = AnomalyConfig::builder().years(YearRange::new(2000, 2001)).build();
        let engine = GlobalAnomaly::new(config).expect("valid config");
        let report = engine.run(&StationCatalog::new(), &ObservationStore::new());

        let df = monthly_frame(&report.monthly)?;
        assert_eq!(df.height(), 24);
        assert_eq!(df.get_column_names_str(), ["year", "month", "temp", "stations", "cells"]);
        assert_eq!(df.column("temp")?.null_count(), 24);
        Ok(())
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("parquet".parse::<OutputFormat>(), Ok(OutputFormat::Parquet));
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }
}
