//! Station inventory decoders: GHCN-M v3 `.inv` fixed-width files and columnar
//! station tables.

use crate::observations::error::LoadError;
use crate::stations::catalog::StationCatalog;
use crate::stations::error::RecordError;
use crate::types::station::{Location, PopulationClass, PopulationFilter, Station};
use crate::utils::{column, parse_f64, LoadSummary};
use bon::builder;
use log::{info, warn};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const ID: std::ops::Range<usize> = 0..11;
const LATITUDE: std::ops::Range<usize> = 12..20;
const LONGITUDE: std::ops::Range<usize> = 21..30;
const POPULATION: std::ops::Range<usize> = 73..74;

/// Decodes one GHCN-M v3 inventory line.
///
/// # Errors
///
/// A [`RecordError`] when the line is too short, a coordinate is not numeric, or the
/// population code is not one of `R`, `S`, `U`.
pub fn parse_inventory_line(line: &str) -> Result<Station, RecordError> {
    let id = column(line, ID)?.trim();
    if id.is_empty() {
        return Err(RecordError::EmptyStationId);
    }
    let latitude = parse_f64("latitude", column(line, LATITUDE)?)?;
    let longitude = parse_f64("longitude", column(line, LONGITUDE)?)?;
    let code = column(line, POPULATION)?;
    let population = code
        .chars()
        .next()
        .and_then(PopulationClass::from_code)
        .ok_or_else(|| RecordError::UnknownPopulationClass(code.to_string()))?;

    Ok(Station {
        id: id.to_string(),
        location: Location {
            latitude,
            longitude,
        },
        population,
    })
}

/// Decodes a whole inventory, keeping only stations whose class `filter` admits.
///
/// Malformed lines are logged and counted, never fatal.
pub fn decode_inventory<R: BufRead>(
    reader: R,
    filter: &PopulationFilter,
) -> Result<(StationCatalog, LoadSummary), std::io::Error> {
    let mut catalog = StationCatalog::new();
    let mut summary = LoadSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let station = match parse_inventory_line(&line) {
            Ok(station) => station,
            Err(e) => {
                warn!("Inventory line {}: {}; skipping", index + 1, e);
                summary.rejected += 1;
                continue;
            }
        };
        if !filter.allows(station.population) {
            summary.skipped += 1;
            continue;
        }
        match catalog.insert(station) {
            Ok(_) => summary.accepted += 1,
            Err(e) => {
                warn!("Inventory line {}: {}; skipping", index + 1, e);
                summary.rejected += 1;
            }
        }
    }
    Ok((catalog, summary))
}

/// Reads a GHCN-M v3 `.inv` file.
pub fn read_inventory(
    path: &Path,
    filter: &PopulationFilter,
) -> Result<(StationCatalog, LoadSummary), LoadError> {
    let file = File::open(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let (catalog, summary) = decode_inventory(BufReader::new(file), filter)
        .map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    info!(
        "Read {} stations from {:?} (class filter {}): {} rejected, {} filtered out",
        catalog.len(),
        path,
        filter,
        summary.rejected,
        summary.skipped
    );
    Ok((catalog, summary))
}

/// Column names of a columnar station table.
#[derive(Debug, Clone, PartialEq)]
pub struct StationColumns {
    pub id: String,
    pub latitude: String,
    pub longitude: String,
    /// Optional population-class column holding `R`/`S`/`U` or full names.
    pub population: Option<String>,
}

impl Default for StationColumns {
    /// The layout written by the USHCN parquet converter.
    fn default() -> Self {
        Self {
            id: "coop_id".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            population: None,
        }
    }
}

/// Reads stations from a parquet table.
///
/// Stations with a null population value get `default_population`, which also
/// covers tables (such as USHCN) that carry no classification at all. A value that
/// is present but not a known class rejects the row.
///
/// # Example
///
/// ```no_run
/// use gridtemp::{read_parquet_stations, PopulationClass, PopulationFilter};
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (catalog, summary) = read_parquet_stations(Path::new("ushcn_stations.parquet"))
///     .default_population(PopulationClass::Rural)
///     .call()?;
/// println!("{} stations, {} rejected", catalog.len(), summary.rejected);
/// # Ok(())
/// # }
/// ```
#[builder]
pub fn read_parquet_stations(
    #[builder(start_fn)] path: &Path,
    #[builder(default)] columns: StationColumns,
    #[builder(default)] filter: PopulationFilter,
    #[builder(default = PopulationClass::Rural)] default_population: PopulationClass,
) -> Result<(StationCatalog, LoadSummary), LoadError> {
    let mut frame = LazyFrame::scan_parquet(path, Default::default())
        .map_err(|e| LoadError::ParquetScan(path.to_path_buf(), e))?;
    let schema = frame.collect_schema()?;

    let mut wanted = vec![
        columns.id.as_str(),
        columns.latitude.as_str(),
        columns.longitude.as_str(),
    ];
    if let Some(population) = &columns.population {
        wanted.push(population.as_str());
    }
    for name in &wanted {
        if schema.get(name).is_none() {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            });
        }
    }

    let mut selection = vec![
        col(columns.id.as_str()).cast(DataType::String).alias("id"),
        col(columns.latitude.as_str()).cast(DataType::Float64).alias("latitude"),
        col(columns.longitude.as_str()).cast(DataType::Float64).alias("longitude"),
    ];
    if let Some(population) = &columns.population {
        selection.push(col(population.as_str()).cast(DataType::String).alias("population"));
    }
    let df = frame.select(selection).collect()?;

    let ids = df.column("id")?.str()?;
    let latitudes = df.column("latitude")?.f64()?;
    let longitudes = df.column("longitude")?.f64()?;
    let populations = match df.column("population") {
        Ok(c) => Some(c.str()?),
        Err(_) => None,
    };

    let mut catalog = StationCatalog::new();
    let mut summary = LoadSummary::default();
    for row in 0..df.height() {
        let population = match populations.and_then(|p| p.get(row)) {
            None => default_population,
            Some(code) => match code.trim().parse::<PopulationClass>() {
                Ok(class) => class,
                Err(_) => {
                    let e = RecordError::UnknownPopulationClass(code.to_string());
                    warn!("Station row {} in {:?}: {}; skipping", row, path, e);
                    summary.rejected += 1;
                    continue;
                }
            },
        };
        if !filter.allows(population) {
            summary.skipped += 1;
            continue;
        }

        let station = match (ids.get(row), latitudes.get(row), longitudes.get(row)) {
            (Some(id), Some(latitude), Some(longitude)) => Station {
                id: id.trim().to_string(),
                location: Location {
                    latitude,
                    longitude,
                },
                population,
            },
            _ => {
                warn!("Station row {} in {:?} has null id or coordinates; skipping", row, path);
                summary.rejected += 1;
                continue;
            }
        };
        match catalog.insert(station) {
            Ok(_) => summary.accepted += 1,
            Err(e) => {
                warn!("Station row {} in {:?}: {}; skipping", row, path, e);
                summary.rejected += 1;
            }
        }
    }

    info!(
        "Read {} stations from {:?}: {} rejected, {} filtered out",
        catalog.len(),
        path,
        summary.rejected,
        summary.skipped
    );
    Ok((catalog, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Builds an inventory line with fields at their fixed columns.
    fn inv_line(id: &str, latitude: &str, longitude: &str, population: char) -> String {
        let mut line = format!("{:<11} {:>8} {:>9}", id, latitude, longitude);
        while line.len() < 73 {
            line.push(' ');
        }
        line.push(population);
        line.push_str("A 1FLxxno-9x-9WARM CROPS      C");
        line
    }

    #[test]
    fn parses_fixed_width_inventory_line() -> Result<(), RecordError> {
        let station = parse_inventory_line(&inv_line("10160355000", "36.9300", "6.9500", 'U'))?;
        assert_eq!(station.id, "10160355000");
        assert_eq!(station.location.latitude, 36.93);
        assert_eq!(station.location.longitude, 6.95);
        assert_eq!(station.population, PopulationClass::Urban);
        Ok(())
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse_inventory_line("10160355000  36.9300"),
            Err(RecordError::LineTooShort { .. })
        ));
        assert!(matches!(
            parse_inventory_line(&inv_line("10160355000", "abc", "6.9500", 'R')),
            Err(RecordError::NotNumeric { field: "latitude", .. })
        ));
        assert_eq!(
            parse_inventory_line(&inv_line("10160355000", "36.9300", "6.9500", 'X')),
            Err(RecordError::UnknownPopulationClass("X".to_string()))
        );
    }

    #[test]
    fn decode_skips_bad_and_filtered_lines() -> Result<(), std::io::Error> {
        let text = [
            inv_line("10000000001", "10.0000", "10.0000", 'R'),
            "garbage".to_string(),
            inv_line("10000000002", "95.0000", "10.0000", 'R'),
            inv_line("10000000003", "-70.0000", "170.0000", 'U'),
            String::new(),
            inv_line("10000000004", "-10.0000", "-50.0000", 'S'),
        ]
        .join("\n");
        let filter = PopulationFilter::from_codes("RS").expect("valid codes");
        let (catalog, summary) = decode_inventory(Cursor::new(text), &filter)?;

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("10000000001"));
        assert!(catalog.contains("10000000004"));
        assert_eq!(
            summary,
            LoadSummary {
                accepted: 2,
                rejected: 2,
                skipped: 1
            }
        );
        Ok(())
    }

    #[test]
    fn reads_parquet_station_table() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stations.parquet");
        let mut df = df!(
            "coop_id" => &["011084", "012813", "013160"],
            "latitude" => &[Some(31.0581), None, Some(32.8347)],
            "longitude" => &[-87.0547, -87.8803, -88.1342],
            "pop" => &[Some("U"), Some("R"), None]
        )?;
        ParquetWriter::new(File::create(&path)?).finish(&mut df)?;

        let columns = StationColumns {
            population: Some("pop".to_string()),
            ..StationColumns::default()
        };
        let (catalog, summary) = read_parquet_stations(&path)
            .columns(columns)
            .default_population(PopulationClass::Suburban)
            .call()?;

        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(
            catalog.get("011084").map(|s| s.population),
            Some(PopulationClass::Urban)
        );
        assert_eq!(
            catalog.get("013160").map(|s| s.population),
            Some(PopulationClass::Suburban)
        );
        Ok(())
    }

    #[test]
    fn unknown_population_value_rejects_station() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stations.parquet");
        let mut df = df!(
            "coop_id" => &["011084", "012813"],
            "latitude" => &[31.0581, 31.1903],
            "longitude" => &[-87.0547, -87.8803],
            "pop" => &[Some("X"), Some("rural")]
        )?;
        ParquetWriter::new(File::create(&path)?).finish(&mut df)?;

        let columns = StationColumns {
            population: Some("pop".to_string()),
            ..StationColumns::default()
        };
        let (catalog, summary) = read_parquet_stations(&path)
            .columns(columns)
            .filter(PopulationFilter::from_codes("R").expect("valid codes"))
            .call()?;

        assert_eq!(
            summary,
            LoadSummary {
                accepted: 1,
                rejected: 1,
                skipped: 0
            }
        );
        assert!(!catalog.contains("011084"));
        assert!(catalog.contains("012813"));
        Ok(())
    }

    #[test]
    fn parquet_station_table_requires_columns() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stations.parquet");
        let mut df = df!("coop_id" => &["011084"], "lat" => &[31.0])?;
        ParquetWriter::new(File::create(&path)?).finish(&mut df)?;

        let result = read_parquet_stations(&path).call();
        assert!(matches!(
            result,
            Err(LoadError::MissingColumn { ref column, .. }) if column == "latitude"
        ));
        Ok(())
    }
}
