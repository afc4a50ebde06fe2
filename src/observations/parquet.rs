use crate::observations::error::LoadError;
use crate::observations::store::{MonthlyObservation, ObservationStore};
use crate::stations::catalog::StationCatalog;
use crate::utils::LoadSummary;
use bon::builder;
use log::{debug, info, warn};
use polars::prelude::*;
use std::path::Path;

/// Column names of a long-format observation table (one row per station-month).
#[derive(Debug, Clone, PartialEq)]
pub struct ParquetColumns {
    pub station_id: String,
    pub year: String,
    pub month: String,
    /// Values in degrees Celsius.
    pub value: String,
    /// Element code column, filtered against the requested element when present.
    pub element: Option<String>,
    /// Dataset-variant column (e.g. `raw`, `tob`, `FLs.52j`).
    pub dataset_type: Option<String>,
    /// Flag columns; a non-blank entry in any of them marks the value missing.
    pub flags: Vec<String>,
}

impl Default for ParquetColumns {
    /// The layout written by the USHCN parquet converter.
    fn default() -> Self {
        Self {
            station_id: "coop_id".to_string(),
            year: "year".to_string(),
            month: "month".to_string(),
            value: "value".to_string(),
            element: Some("element".to_string()),
            dataset_type: Some("dataset_type".to_string()),
            flags: vec!["dmflag".to_string(), "qcflag".to_string()],
        }
    }
}

/// Reads monthly observations from a parquet table.
///
/// Rows are filtered to `element` (default `tavg`) and, when given, to one
/// `dataset_type`. Rows for stations outside `catalog` are skipped. Rows with a
/// null id, year or month, or a month outside `1..=12`, are rejected. A null value
/// or a set flag yields an explicitly missing reading.
///
/// # Errors
///
/// [`LoadError::ParquetScan`] when the file cannot be scanned,
/// [`LoadError::MissingColumn`] when a configured column is absent.
///
/// # Example
///
/// ```no_run
/// use gridtemp::{read_parquet_observations, StationCatalog};
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = StationCatalog::new();
/// let (store, summary) = read_parquet_observations(Path::new("ushcn_monthly.parquet"))
///     .catalog(&catalog)
///     .dataset_type("FLs.52j")
///     .call()?;
/// println!("{} readings, {} rejected", store.valid_count(), summary.rejected);
/// # Ok(())
/// # }
/// ```
#[builder]
pub fn read_parquet_observations(
    #[builder(start_fn)] path: &Path,
    catalog: &StationCatalog,
    #[builder(default)] columns: ParquetColumns,
    #[builder(default = "tavg")] element: &str,
    dataset_type: Option<&str>,
) -> Result<(ObservationStore, LoadSummary), LoadError> {
    let mut frame = LazyFrame::scan_parquet(path, Default::default())
        .map_err(|e| LoadError::ParquetScan(path.to_path_buf(), e))?;
    let schema = frame.collect_schema()?;
    let require = |name: &str| -> Result<(), LoadError> {
        match schema.get(name) {
            Some(_) => Ok(()),
            None => Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            }),
        }
    };

    let keys = [&columns.station_id, &columns.year, &columns.month, &columns.value];
    for name in keys.into_iter().chain(columns.flags.iter()) {
        require(name.as_str())?;
    }

    if let Some(element_column) = &columns.element {
        require(element_column.as_str())?;
        frame = frame.filter(col(element_column.as_str()).eq(lit(element)));
    }
    if let Some(wanted) = dataset_type {
        let dataset_column = columns.dataset_type.as_deref().ok_or_else(|| LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: "dataset_type".to_string(),
        })?;
        require(dataset_column)?;
        frame = frame.filter(col(dataset_column).eq(lit(wanted)));
    }

    let mut selection = vec![
        col(columns.station_id.as_str()).cast(DataType::String).alias("station_id"),
        col(columns.year.as_str()).cast(DataType::Int32).alias("year"),
        col(columns.month.as_str()).cast(DataType::Int64).alias("month"),
        col(columns.value.as_str()).cast(DataType::Float64).alias("value"),
    ];
    for (i, flag) in columns.flags.iter().enumerate() {
        selection.push(col(flag.as_str()).cast(DataType::String).alias(format!("flag_{i}")));
    }
    let df = frame.select(selection).collect()?;
    debug!("Selected {} observation rows from {:?}", df.height(), path);

    let ids = df.column("station_id")?.str()?;
    let years = df.column("year")?.i32()?;
    let months = df.column("month")?.i64()?;
    let values = df.column("value")?.f64()?;
    let flags = (0..columns.flags.len())
        .map(|i| df.column(&format!("flag_{i}")).and_then(|c| c.str()))
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut store = ObservationStore::new();
    let mut summary = LoadSummary::default();
    for row in 0..df.height() {
        let (Some(id), Some(year), Some(month)) = (ids.get(row), years.get(row), months.get(row)) else {
            warn!("Observation row {} in {:?} has a null key; skipping", row, path);
            summary.rejected += 1;
            continue;
        };
        let id = id.trim();
        if !catalog.contains(id) {
            summary.skipped += 1;
            continue;
        }
        let flagged = flags
            .iter()
            .any(|f| f.get(row).is_some_and(|flag| !flag.trim().is_empty()));
        let value = values.get(row).filter(|_| !flagged);

        match MonthlyObservation::new(id, year, month, value) {
            Ok(observation) => {
                store.insert(observation);
                summary.accepted += 1;
            }
            Err(e) => {
                warn!("Observation row {} in {:?}: {}; skipping", row, path, e);
                summary.rejected += 1;
            }
        }
    }

    info!(
        "Read {} observations for {} stations from {:?} (element {}): {} rejected, {} for unknown stations",
        summary.accepted,
        store.station_count(),
        path,
        element,
        summary.rejected,
        summary.skipped
    );
    Ok((store, summary))
}
