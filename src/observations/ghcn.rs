//! GHCN-M v3 `.dat` decoder.
//!
//! Each line carries one station-year: an 11-character id, the year, the element
//! code, then twelve 8-character month groups of a 5-character value in hundredths
//! of a degree followed by DM/QC/DS flag characters.

use crate::observations::error::LoadError;
use crate::observations::store::{ObservationStore, YearValues};
use crate::stations::catalog::StationCatalog;
use crate::stations::error::RecordError;
use crate::types::period::Year;
use crate::utils::{column, parse_i32, LoadSummary};
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Sentinel for "no reading".
pub const MISSING_VALUE: i32 = -9999;
const HUNDREDTHS_PER_DEGREE: f64 = 100.0;

/// The last value column ends here; trailing flag columns may be trimmed away.
const MIN_LINE_LENGTH: usize = 11 + 8 + 8 * 12 - 3;

/// One decoded station-year line.
#[derive(Debug, Clone, PartialEq)]
pub struct DataLine {
    pub station_id: String,
    pub year: Year,
    pub element: String,
    /// Degrees Celsius; `None` for the sentinel or a flagged value.
    pub values: YearValues,
}

/// Decodes one data line.
///
/// A month is kept only when its value is not [`MISSING_VALUE`] and both its
/// data-measurement and quality-control flags are blank.
pub fn parse_data_line(line: &str) -> Result<DataLine, RecordError> {
    if line.len() < MIN_LINE_LENGTH {
        return Err(RecordError::LineTooShort {
            expected: MIN_LINE_LENGTH,
            found: line.len(),
        });
    }
    let station_id = column(line, 0..11)?.trim();
    if station_id.is_empty() {
        return Err(RecordError::EmptyStationId);
    }
    let year = parse_i32("year", column(line, 11..15)?)?;
    let element = column(line, 15..19)?.trim().to_string();

    let mut values: YearValues = [None; 12];
    for (index, slot) in values.iter_mut().enumerate() {
        let start = 19 + 8 * index;
        let raw = parse_i32("value", column(line, start..start + 5)?)?;
        // Trimmed flag columns read as blank; whichever flags are present still count.
        let flags = line
            .get(start + 5..(start + 7).min(line.len()))
            .unwrap_or("");
        let unflagged = flags.chars().all(|c| c == ' ');
        if raw != MISSING_VALUE && unflagged {
            *slot = Some(f64::from(raw) / HUNDREDTHS_PER_DEGREE);
        }
    }

    Ok(DataLine {
        station_id: station_id.to_string(),
        year: Year(year),
        element,
        values,
    })
}

/// Decodes a data stream into `store`, keeping only stations present in `catalog`.
///
/// A repeated station-year replaces the earlier one wholesale.
pub fn decode_data<R: BufRead>(
    reader: R,
    catalog: &StationCatalog,
    store: &mut ObservationStore,
) -> Result<LoadSummary, std::io::Error> {
    let mut summary = LoadSummary::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_data_line(&line) {
            Ok(record) if catalog.contains(&record.station_id) => {
                store.replace_year(&record.station_id, record.year, record.values);
                summary.accepted += 1;
            }
            Ok(_) => summary.skipped += 1,
            Err(e) => {
                warn!("Data line {}: {}; skipping", index + 1, e);
                summary.rejected += 1;
            }
        }
    }
    Ok(summary)
}

/// Reads a GHCN-M v3 `.dat` file for the stations in `catalog`.
///
/// # Errors
///
/// [`LoadError::Io`] when the file cannot be opened or read. Malformed lines are
/// counted in the returned summary instead.
pub fn read_ghcn_data(
    path: &Path,
    catalog: &StationCatalog,
) -> Result<(ObservationStore, LoadSummary), LoadError> {
    let file = File::open(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let mut store = ObservationStore::new();
    let summary = decode_data(BufReader::new(file), catalog, &mut store)
        .map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    info!(
        "Read {} station-years for {} stations from {:?}: {} rejected, {} for unknown stations",
        summary.accepted,
        store.station_count(),
        path,
        summary.rejected,
        summary.skipped
    );
    Ok((store, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::period::CalendarMonth;
    use crate::types::station::{Location, PopulationClass, Station};
    use std::io::Cursor;

    /// Builds a data line from `(value, dm, qc, ds)` month groups.
    fn dat_line(id: &str, year: i32, months: &[(i32, char, char, char)]) -> String {
        let mut line = format!("{:<11}{:04}TAVG", id, year);
        for (value, dm, qc, ds) in months {
            line.push_str(&format!("{:>5}{}{}{}", value, dm, qc, ds));
        }
        line
    }

    fn clean_year(value: i32) -> Vec<(i32, char, char, char)> {
        vec![(value, ' ', ' ', 'G'); 12]
    }

    fn catalog_with(ids: &[&str]) -> StationCatalog {
        let mut catalog = StationCatalog::new();
        for id in ids {
            catalog
                .insert(Station {
                    id: id.to_string(),
                    location: Location {
                        latitude: 0.0,
                        longitude: 0.0,
                    },
                    population: PopulationClass::Rural,
                })
                .expect("valid station");
        }
        catalog
    }

    #[test]
    fn decodes_values_in_hundredths() -> Result<(), RecordError> {
        let record = parse_data_line(&dat_line("10160355000", 1966, &clean_year(1250)))?;
        assert_eq!(record.station_id, "10160355000");
        assert_eq!(record.year, Year(1966));
        assert_eq!(record.element, "TAVG");
        assert!(record.values.iter().all(|v| *v == Some(12.5)));
        Ok(())
    }

    #[test]
    fn sentinel_and_flagged_values_are_missing() -> Result<(), RecordError> {
        let mut months = clean_year(-310);
        months[0] = (MISSING_VALUE, ' ', ' ', ' ');
        months[1] = (500, 'E', ' ', ' ');
        months[2] = (500, ' ', 'K', ' ');
        // A source flag alone does not invalidate a value.
        months[3] = (500, ' ', ' ', 'C');
        let record = parse_data_line(&dat_line("10160355000", 1966, &months))?;

        assert_eq!(record.values[0], None);
        assert_eq!(record.values[1], None);
        assert_eq!(record.values[2], None);
        assert_eq!(record.values[3], Some(5.0));
        assert!((record.values[4].unwrap_or_default() + 3.1).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn trimmed_trailing_flags_read_as_blank() -> Result<(), RecordError> {
        let line = dat_line("10160355000", 1966, &clean_year(100));
        let trimmed = &line[..line.len() - 3];
        let record = parse_data_line(trimmed)?;
        assert_eq!(record.values[11], Some(1.0));
        Ok(())
    }

    #[test]
    fn flag_at_end_of_trimmed_line_still_counts() -> Result<(), RecordError> {
        let mut months = clean_year(100);
        months[11] = (100, 'E', ' ', ' ');
        let line = dat_line("10160355000", 1966, &months);
        // Keep December's DM flag but drop its QC and DS columns.
        let cut = &line[..line.len() - 2];
        assert_eq!(cut.len(), 113);

        let record = parse_data_line(cut)?;
        assert_eq!(record.values[11], None);
        assert_eq!(record.values[10], Some(1.0));
        Ok(())
    }

    #[test]
    fn rejects_short_and_non_numeric_lines() {
        assert!(matches!(
            parse_data_line("101603550001966TAVG"),
            Err(RecordError::LineTooShort { .. })
        ));
        let line = dat_line("10160355000", 1966, &clean_year(100)).replacen("1966", "19x6", 1);
        assert!(matches!(
            parse_data_line(&line),
            Err(RecordError::NotNumeric { field: "year", .. })
        ));
    }

    #[test]
    fn decode_replaces_duplicate_years_and_skips_unknown_stations() -> Result<(), std::io::Error> {
        let text = [
            dat_line("A0000000001", 1990, &clean_year(100)),
            dat_line("B0000000002", 1990, &clean_year(200)),
            "broken line".to_string(),
            dat_line("A0000000001", 1990, &clean_year(300)),
        ]
        .join("\n");
        let catalog = catalog_with(&["A0000000001"]);
        let mut store = ObservationStore::new();
        let summary = decode_data(Cursor::new(text), &catalog, &mut store)?;

        assert_eq!(
            summary,
            LoadSummary {
                accepted: 2,
                rejected: 1,
                skipped: 1
            }
        );
        assert_eq!(store.station_count(), 1);
        assert_eq!(
            store.get("A0000000001", Year(1990), CalendarMonth::JANUARY),
            Some(3.0)
        );
        Ok(())
    }
}
