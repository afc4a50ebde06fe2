//! The in-memory station catalog: identity, location and population class of
//! every station a run may use.

use crate::stations::error::RecordError;
use crate::types::station::{PopulationFilter, Station};
use log::debug;
use std::collections::BTreeMap;

/// Stations keyed by id.
///
/// Iteration is always in ascending id order, which keeps every downstream
/// summation order fixed from run to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationCatalog {
    stations: BTreeMap<String, Station>,
}

impl StationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a station after basic validation.
    ///
    /// A station whose id is already present replaces the earlier record (no merge);
    /// the replaced record is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] for an empty id or a coordinate outside the valid range.
    /// The catalog is left unchanged in that case.
    pub fn insert(&mut self, station: Station) -> Result<Option<Station>, RecordError> {
        if station.id.trim().is_empty() {
            return Err(RecordError::EmptyStationId);
        }
        let latitude = station.location.latitude;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(RecordError::LatitudeOutOfRange(latitude));
        }
        let longitude = station.location.longitude;
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(RecordError::LongitudeOutOfRange(longitude));
        }

        let replaced = self.stations.insert(station.id.clone(), station);
        if let Some(previous) = &replaced {
            debug!("Station {} listed twice, keeping the later record", previous.id);
        }
        Ok(replaced)
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// A new catalog holding only the stations whose class the filter admits.
    pub fn filter_population(&self, filter: &PopulationFilter) -> StationCatalog {
        let stations = self
            .stations
            .iter()
            .filter(|(_, station)| filter.allows(station.population))
            .map(|(id, station)| (id.clone(), station.clone()))
            .collect();
        StationCatalog { stations }
    }
}
