//! Two-stage spatial averaging of station anomalies into one global value per month.
//!
//! Stage one averages the anomalies of all stations inside a grid cell (an unweighted
//! mean, so a dense cell counts no more than a sparse one). Stage two combines the
//! populated cells with cosine-latitude area weights. Empty cells contribute to
//! neither the numerator nor the denominator.

use crate::engine::baseline::Baselines;
use crate::engine::grid::{GridCell, GridIndex};
use crate::observations::store::ObservationStore;
use crate::stations::catalog::StationCatalog;
use crate::types::period::{CalendarMonth, Year, YearMonth, YearRange};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Weight sums at or below this are treated as "no data".
pub const MIN_WEIGHT_SUM: f64 = 1.0e-20;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct CellAccumulator {
    sum: f64,
    count: usize,
}

impl CellAccumulator {
    fn push(&mut self, anomaly: f64) {
        self.sum += anomaly;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Station anomalies for one month, grouped by grid cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellField {
    cells: BTreeMap<GridCell, CellAccumulator>,
}

impl CellField {
    fn push(&mut self, cell: GridCell, anomaly: f64) {
        self.cells.entry(cell).or_default().push(anomaly);
    }

    /// Mean anomaly of the stations in `cell`, if any station reported.
    pub fn cell_mean(&self, cell: GridCell) -> Option<f64> {
        self.cells.get(&cell).map(CellAccumulator::mean)
    }

    /// Populated cells with their mean anomaly and station count, in (lat, lon) order.
    pub fn cells(&self) -> impl Iterator<Item = (GridCell, f64, usize)> + '_ {
        self.cells
            .iter()
            .map(|(cell, acc)| (*cell, acc.mean(), acc.count))
    }

    pub fn populated_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn station_count(&self) -> usize {
        self.cells.values().map(|acc| acc.count).sum()
    }

    /// Area-weighted mean over populated cells, or `None` when the weight sum is negligible.
    ///
    /// Cells are visited in (lat, lon) order so the floating-point result is reproducible.
    pub fn weighted_mean(&self, grid: &GridIndex) -> Option<f64> {
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for (cell, acc) in &self.cells {
            let weight = grid.area_weight(cell.lat);
            weighted_sum += weight * acc.mean();
            weight_sum += weight;
        }
        (weight_sum > MIN_WEIGHT_SUM).then(|| weighted_sum / weight_sum)
    }
}

/// Per-month cell fields, before the cross-cell reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedAnomalies {
    grid: GridIndex,
    years: YearRange,
    months: BTreeMap<YearMonth, CellField>,
}

impl GriddedAnomalies {
    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn field(&self, when: YearMonth) -> Option<&CellField> {
        self.months.get(&when)
    }

    pub fn cell_mean(&self, when: YearMonth, cell: GridCell) -> Option<f64> {
        self.field(when).and_then(|field| field.cell_mean(cell))
    }

    /// Collapses every month of the configured year range to a global value.
    /// Months with no contributing station come out missing, never zero.
    pub fn to_series(&self) -> AnomalySeries {
        let mut series = AnomalySeries::default();
        for year in self.years.years() {
            let mut months = [MonthlyAnomaly::MISSING; 12];
            for month in CalendarMonth::all() {
                if let Some(field) = self.months.get(&YearMonth::new(year, month)) {
                    months[month.index()] = MonthlyAnomaly {
                        value: field.weighted_mean(&self.grid),
                        stations: field.station_count(),
                        cells: field.populated_cells(),
                    };
                }
            }
            let reported = months.iter().filter(|m| m.value.is_some()).count();
            debug!("{}: {} of 12 months have a global value", year, reported);
            series.years.insert(year, months);
        }
        series
    }
}

/// The global anomaly for one month together with how much data went into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyAnomaly {
    /// Area-weighted global anomaly; `None` when no station contributed.
    pub value: Option<f64>,
    /// Stations that contributed an anomaly.
    pub stations: usize,
    /// Populated grid cells.
    pub cells: usize,
}

impl MonthlyAnomaly {
    pub const MISSING: MonthlyAnomaly = MonthlyAnomaly {
        value: None,
        stations: 0,
        cells: 0,
    };
}

/// Global monthly anomalies for every year of the run, in year order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalySeries {
    years: BTreeMap<Year, [MonthlyAnomaly; 12]>,
}

impl AnomalySeries {
    pub fn get(&self, year: Year, month: CalendarMonth) -> Option<f64> {
        self.month(year, month).and_then(|m| m.value)
    }

    pub fn month(&self, year: Year, month: CalendarMonth) -> Option<&MonthlyAnomaly> {
        self.years.get(&year).map(|months| &months[month.index()])
    }

    pub fn year(&self, year: Year) -> Option<&[MonthlyAnomaly; 12]> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = (Year, &[MonthlyAnomaly; 12])> {
        self.years.iter().map(|(year, months)| (*year, months))
    }

    /// Every (year, month) in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, &MonthlyAnomaly)> {
        self.years.iter().flat_map(|(year, months)| {
            CalendarMonth::all().map(move |month| (YearMonth::new(*year, month), &months[month.index()]))
        })
    }

    pub fn len(&self) -> usize {
        self.years.len() * 12
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Number of months with no global value.
    pub fn missing_count(&self) -> usize {
        self.iter().filter(|(_, m)| m.value.is_none()).count()
    }
}

/// Turns observations and baselines into gridded, then global, anomalies.
#[derive(Debug, Clone)]
pub struct AnomalyAggregator<'a> {
    catalog: &'a StationCatalog,
    grid: GridIndex,
    years: YearRange,
}

impl<'a> AnomalyAggregator<'a> {
    pub fn new(catalog: &'a StationCatalog, grid: GridIndex, years: YearRange) -> Self {
        Self {
            catalog,
            grid,
            years,
        }
    }

    /// Computes station anomalies and groups them by cell for every month in the year range.
    ///
    /// Stations absent from the catalog have no location and are skipped. A reading
    /// contributes only when the station also has a baseline for that calendar month.
    pub fn grid_anomalies(
        &self,
        store: &ObservationStore,
        baselines: &Baselines,
    ) -> GriddedAnomalies {
        let mut months: BTreeMap<YearMonth, CellField> = BTreeMap::new();
        let mut unlocated = 0usize;
        let mut contributions = 0usize;

        for (station_id, series) in store.iter() {
            let Some(slots) = baselines.station(station_id) else {
                continue;
            };
            let Some(station) = self.catalog.get(station_id) else {
                unlocated += 1;
                continue;
            };
            let cell = self.grid.cell(station.location);

            for (when, value) in series.valid_readings() {
                if !self.years.contains(when.year.get()) {
                    continue;
                }
                let Some(baseline) = slots[when.month.index()] else {
                    continue;
                };
                months.entry(when).or_default().push(cell, value - baseline.mean);
                contributions += 1;
            }
        }

        if unlocated > 0 {
            warn!(
                "{} stations with baselines are missing from the station catalog and were skipped",
                unlocated
            );
        }
        info!(
            "Gridded {} station anomalies into {} months on a {}° grid ({} cells)",
            contributions,
            months.len(),
            self.grid.size(),
            self.grid.cell_count()
        );

        GriddedAnomalies {
            grid: self.grid,
            years: self.years,
            months,
        }
    }

    /// Global area-weighted anomaly for every (year, month) in the year range.
    pub fn aggregate(&self, store: &ObservationStore, baselines: &Baselines) -> AnomalySeries {
        self.grid_anomalies(store, baselines).to_series()
    }
}
