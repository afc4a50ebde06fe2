//! Defines the data structures representing weather stations: identity, location
//! and the population class used to split rural from urban records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Data Structures ---

/// A single weather station as supplied by an inventory loader.
///
/// Stations are immutable once loaded; the [`crate::StationCatalog`] owns them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The unique station identifier (e.g. "42572530000" in GHCN-M v3).
    pub id: String,
    /// Geographical location (latitude, longitude).
    pub location: Location,
    /// Rural / suburban / urban classification.
    pub population: PopulationClass,
}

/// Represents the geographical location of a weather station.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
}

impl Location {
    /// `true` when latitude lies in `[-90, 90]` and longitude in `[-180, 180]`.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// The population classification of a station's surroundings.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PopulationClass {
    Rural,
    Suburban,
    Urban,
}

impl PopulationClass {
    pub const ALL: [PopulationClass; 3] = [
        PopulationClass::Rural,
        PopulationClass::Suburban,
        PopulationClass::Urban,
    ];

    /// The single-letter code used by the GHCN inventory files (`R`, `S`, `U`).
    pub fn code(self) -> char {
        match self {
            PopulationClass::Rural => 'R',
            PopulationClass::Suburban => 'S',
            PopulationClass::Urban => 'U',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'R' => Some(PopulationClass::Rural),
            'S' => Some(PopulationClass::Suburban),
            'U' => Some(PopulationClass::Urban),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            PopulationClass::Rural => 1 << 0,
            PopulationClass::Suburban => 1 << 1,
            PopulationClass::Urban => 1 << 2,
        }
    }
}

impl fmt::Display for PopulationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PopulationClass::Rural => "rural",
            PopulationClass::Suburban => "suburban",
            PopulationClass::Urban => "urban",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PopulationClass {
    type Err = String;

    /// Accepts either the full lowercase name or the single-letter code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rural" | "r" => Ok(PopulationClass::Rural),
            "suburban" | "s" => Ok(PopulationClass::Suburban),
            "urban" | "u" => Ok(PopulationClass::Urban),
            other => Err(format!("unknown population class '{other}'")),
        }
    }
}

/// A subset of [`PopulationClass`] values a run is restricted to.
///
/// Defaults to all three classes.
///
/// # Examples
///
/// ```
/// use gridtemp::{PopulationClass, PopulationFilter};
///
/// let rural_only = PopulationFilter::from_codes("R").unwrap();
/// assert!(rural_only.allows(PopulationClass::Rural));
/// assert!(!rural_only.allows(PopulationClass::Urban));
/// assert_eq!(PopulationFilter::default().codes(), "RSU");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PopulationFilter {
    mask: u8,
}

impl PopulationFilter {
    pub fn all() -> Self {
        Self::from_classes(PopulationClass::ALL)
    }

    pub fn from_classes(classes: impl IntoIterator<Item = PopulationClass>) -> Self {
        let mask = classes.into_iter().fold(0, |mask, class| mask | class.bit());
        Self { mask }
    }

    /// Parses a code string such as `"RSU"` or `"R"`. Returns `None` on an unknown letter.
    pub fn from_codes(codes: &str) -> Option<Self> {
        let classes = codes
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(PopulationClass::from_code)
            .collect::<Option<Vec<_>>>()?;
        Some(Self::from_classes(classes))
    }

    pub fn allows(&self, class: PopulationClass) -> bool {
        self.mask & class.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn classes(&self) -> impl Iterator<Item = PopulationClass> + '_ {
        PopulationClass::ALL.into_iter().filter(|c| self.allows(*c))
    }

    pub fn codes(&self) -> String {
        self.classes().map(PopulationClass::code).collect()
    }
}

impl Default for PopulationFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for PopulationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.codes())
    }
}
