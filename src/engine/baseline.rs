//! Per-station, per-calendar-month climatological baselines.
//!
//! A baseline is the mean of a station's readings for one calendar month over the
//! reference period. It is admitted only when enough readings exist; each month is
//! judged on its own, so a station can have a January baseline and no July one.

use crate::observations::store::{ObservationStore, StationSeries};
use crate::types::period::{CalendarMonth, YearRange};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

/// An admitted baseline for one (station, month).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyBaseline {
    /// Reference-period mean temperature.
    pub mean: f64,
    /// Number of readings the mean was taken over.
    pub samples: usize,
}

/// Counts describing how many station-months were admitted or left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BaselineStats {
    /// Stations examined.
    pub stations: usize,
    /// Stations with a baseline for at least one month.
    pub stations_with_baseline: usize,
    /// Station-months with a baseline.
    pub admitted: usize,
    /// Station-months with some reference readings, but fewer than required.
    pub insufficient: usize,
    /// Station-months with no reference readings at all.
    pub empty: usize,
}

/// The baselines of every station, partial per station.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baselines {
    stations: BTreeMap<String, [Option<MonthlyBaseline>; 12]>,
    stats: BaselineStats,
}

impl Baselines {
    pub fn get(&self, station_id: &str, month: CalendarMonth) -> Option<MonthlyBaseline> {
        self.stations
            .get(station_id)
            .and_then(|months| months[month.index()])
    }

    /// Shorthand for the baseline mean.
    pub fn mean(&self, station_id: &str, month: CalendarMonth) -> Option<f64> {
        self.get(station_id, month).map(|b| b.mean)
    }

    /// All twelve slots of a station; `None` when the station has no baseline for any month.
    pub fn station(&self, station_id: &str) -> Option<&[Option<MonthlyBaseline>; 12]> {
        self.stations.get(station_id)
    }

    /// Stations holding at least one baseline, in ascending id order.
    pub fn station_ids(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn stats(&self) -> BaselineStats {
        self.stats
    }
}

/// Computes [`Baselines`] from an [`ObservationStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineCalculator {
    reference_period: YearRange,
    min_samples: usize,
}

impl BaselineCalculator {
    pub fn new(reference_period: YearRange, min_samples: usize) -> Self {
        Self {
            reference_period,
            min_samples,
        }
    }

    pub fn compute(&self, store: &ObservationStore) -> Baselines {
        let mut baselines = Baselines::default();

        for (station_id, series) in store.iter() {
            baselines.stats.stations += 1;
            let months = self.station_baselines(series, &mut baselines.stats);
            if months.iter().any(Option::is_some) {
                baselines.stats.stations_with_baseline += 1;
                baselines.stations.insert(station_id.to_string(), months);
            }
        }

        let stats = baselines.stats;
        info!(
            "Baselines {} (min {} samples): {} of {} stations usable, {} station-months admitted, {} insufficient, {} empty",
            self.reference_period,
            self.min_samples,
            stats.stations_with_baseline,
            stats.stations,
            stats.admitted,
            stats.insufficient,
            stats.empty
        );
        baselines
    }

    fn station_baselines(
        &self,
        series: &StationSeries,
        stats: &mut BaselineStats,
    ) -> [Option<MonthlyBaseline>; 12] {
        let mut sums = [0.0f64; 12];
        let mut counts = [0usize; 12];
        for (when, value) in series.valid_readings() {
            if self.reference_period.contains(when.year.get()) {
                let i = when.month.index();
                sums[i] += value;
                counts[i] += 1;
            }
        }

        let mut months = [None; 12];
        for i in 0..12 {
            match counts[i] {
                0 => stats.empty += 1,
                n if n < self.min_samples => stats.insufficient += 1,
                n => {
                    stats.admitted += 1;
                    months[i] = Some(MonthlyBaseline {
                        mean: sums[i] / n as f64,
                        samples: n,
                    });
                }
            }
        }
        months
    }
}
