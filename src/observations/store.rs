//! Decoded monthly mean temperatures, keyed by station, year and calendar month.

use crate::stations::error::RecordError;
use crate::types::period::{CalendarMonth, Year, YearMonth};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One station's reading for one month. `value` is `None` when there is no valid reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    pub station_id: String,
    pub year: Year,
    pub month: CalendarMonth,
    /// Monthly mean temperature in degrees Celsius.
    pub value: Option<f64>,
}

impl MonthlyObservation {
    /// Builds an observation from loosely typed decoder output.
    ///
    /// Non-finite values are normalised to `None`.
    ///
    /// # Errors
    ///
    /// [`RecordError::MonthOutOfRange`] when `month` is not in `1..=12`,
    /// [`RecordError::EmptyStationId`] when the id is blank.
    pub fn new(
        station_id: impl Into<String>,
        year: i32,
        month: i64,
        value: Option<f64>,
    ) -> Result<Self, RecordError> {
        let station_id = station_id.into();
        if station_id.trim().is_empty() {
            return Err(RecordError::EmptyStationId);
        }
        let month = u32::try_from(month)
            .ok()
            .and_then(CalendarMonth::new)
            .ok_or(RecordError::MonthOutOfRange(month))?;
        Ok(Self {
            station_id,
            year: Year(year),
            month,
            value: value.filter(|v| v.is_finite()),
        })
    }
}

/// Twelve monthly slots for one station-year.
pub type YearValues = [Option<f64>; 12];

/// Every reading of a single station, sparse over years.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationSeries {
    years: BTreeMap<Year, YearValues>,
}

impl StationSeries {
    pub fn get(&self, year: Year, month: CalendarMonth) -> Option<f64> {
        self.years.get(&year).and_then(|values| values[month.index()])
    }

    pub fn year(&self, year: Year) -> Option<&YearValues> {
        self.years.get(&year)
    }

    /// Years with at least one slot recorded, ascending.
    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.years.keys().copied()
    }

    /// Every valid reading in chronological order.
    pub fn valid_readings(&self) -> impl Iterator<Item = (YearMonth, f64)> + '_ {
        self.years.iter().flat_map(|(year, values)| {
            CalendarMonth::all().filter_map(move |month| {
                values[month.index()].map(|value| (YearMonth::new(*year, month), value))
            })
        })
    }

    pub fn valid_count(&self) -> usize {
        self.years
            .values()
            .map(|values| values.iter().flatten().count())
            .sum()
    }
}

/// All decoded readings of a run.
///
/// Holds at most one value per (station, year, month); a later insert for the same
/// key replaces the earlier one. Stations and years are stored sparsely, so decades a
/// station never reported cost nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationStore {
    stations: BTreeMap<String, StationSeries>,
}

impl ObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a single observation, returning the value it replaced (if any).
    pub fn insert(&mut self, observation: MonthlyObservation) -> Option<f64> {
        let series = self.stations.entry(observation.station_id).or_default();
        let values = series.years.entry(observation.year).or_insert([None; 12]);
        std::mem::replace(&mut values[observation.month.index()], observation.value)
    }

    /// Replaces a whole station-year at once, as fixed-width data files deliver it.
    pub fn replace_year(&mut self, station_id: &str, year: Year, values: YearValues) {
        let values = values.map(|v| v.filter(|x| x.is_finite()));
        self.stations
            .entry(station_id.to_string())
            .or_default()
            .years
            .insert(year, values);
    }

    pub fn get(&self, station_id: &str, year: Year, month: CalendarMonth) -> Option<f64> {
        self.stations
            .get(station_id)
            .and_then(|series| series.get(year, month))
    }

    pub fn station(&self, station_id: &str) -> Option<&StationSeries> {
        self.stations.get(station_id)
    }

    /// Stations with their series, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StationSeries)> {
        self.stations
            .iter()
            .map(|(id, series)| (id.as_str(), series))
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Total number of valid (non-missing) readings.
    pub fn valid_count(&self) -> usize {
        self.stations.values().map(StationSeries::valid_count).sum()
    }

    /// Drops every station for which `keep` returns `false`.
    pub fn retain_stations(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.stations.retain(|id, _| keep(id));
    }

    /// Every observation slot, including explicit missing ones, in key order.
    pub fn observations(&self) -> impl Iterator<Item = MonthlyObservation> + '_ {
        self.stations.iter().flat_map(|(id, series)| {
            series.years.iter().flat_map(move |(year, values)| {
                CalendarMonth::all().map(move |month| MonthlyObservation {
                    station_id: id.clone(),
                    year: *year,
                    month,
                    value: values[month.index()],
                })
            })
        })
    }
}

impl Extend<MonthlyObservation> for ObservationStore {
    fn extend<T: IntoIterator<Item = MonthlyObservation>>(&mut self, iter: T) {
        for observation in iter {
            self.insert(observation);
        }
    }
}

impl FromIterator<MonthlyObservation> for ObservationStore {
    fn from_iter<T: IntoIterator<Item = MonthlyObservation>>(iter: T) -> Self {
        let mut store = ObservationStore::new();
        store.extend(iter);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: &str, year: i32, month: i64, value: Option<f64>) -> MonthlyObservation {
        MonthlyObservation::new(id, year, month, value).expect("valid observation")
    }

    #[test]
    fn observation_rejects_bad_month() {
        assert_eq!(
            MonthlyObservation::new("A", 1990, 13, Some(1.0)),
            Err(RecordError::MonthOutOfRange(13))
        );
        assert_eq!(
            MonthlyObservation::new("A", 1990, -1, Some(1.0)),
            Err(RecordError::MonthOutOfRange(-1))
        );
        assert_eq!(
            MonthlyObservation::new("", 1990, 1, Some(1.0)),
            Err(RecordError::EmptyStationId)
        );
    }

    #[test]
    fn non_finite_values_become_missing() {
        assert_eq!(obs("A", 1990, 1, Some(f64::NAN)).value, None);
    }

    #[test]
    fn one_value_per_key_later_wins() {
        let mut store = ObservationStore::new();
        assert_eq!(store.insert(obs("A", 1990, 1, Some(1.0))), None);
        assert_eq!(store.insert(obs("A", 1990, 1, Some(2.0))), Some(1.0));

        let january = CalendarMonth::JANUARY;
        assert_eq!(store.get("A", Year(1990), january), Some(2.0));
        assert_eq!(store.valid_count(), 1);

        // An explicit missing reading clears the slot.
        store.insert(obs("A", 1990, 1, None));
        assert_eq!(store.get("A", Year(1990), january), None);
        assert_eq!(store.valid_count(), 0);
    }

    #[test]
    fn replace_year_overwrites_all_months() {
        let mut store: ObservationStore = [obs("A", 1990, 3, Some(5.0)), obs("A", 1990, 4, Some(6.0))]
            .into_iter()
            .collect();
        let mut values = [None; 12];
        values[0] = Some(-1.0);
        store.replace_year("A", Year(1990), values);

        assert_eq!(store.get("A", Year(1990), CalendarMonth::JANUARY), Some(-1.0));
        assert_eq!(store.get("A", Year(1990), CalendarMonth::new(3).unwrap()), None);
        assert_eq!(store.valid_count(), 1);
    }

    #[test]
    fn readings_are_chronological() {
        let store: ObservationStore = [
            obs("A", 1991, 1, Some(3.0)),
            obs("A", 1990, 12, Some(2.0)),
            obs("A", 1990, 2, Some(1.0)),
        ]
        .into_iter()
        .collect();
        let series = store.station("A").expect("station A");
        let values: Vec<f64> = series.valid_readings().map(|(_, v)| v).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.years().collect::<Vec<_>>(), vec![Year(1990), Year(1991)]);
    }

    #[test]
    fn retain_drops_stations() {
        let mut store: ObservationStore = [obs("A", 1990, 1, Some(1.0)), obs("B", 1990, 1, Some(1.0))]
            .into_iter()
            .collect();
        store.retain_stations(|id| id == "B");
        assert_eq!(store.station_count(), 1);
        assert!(store.station("A").is_none());
    }
}
