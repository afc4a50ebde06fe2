//! Equal-angle latitude/longitude grid used to group nearby stations.

use crate::error::ConfigError;
use crate::types::station::Location;
use serde::Serialize;
use std::fmt;

/// A grid cell, identified by its latitude band (0 = southernmost) and longitude
/// band (0 = starting at -180°). Orders lexicographically by (lat, lon).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GridCell {
    pub lat: usize,
    pub lon: usize,
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Maps locations to [`GridCell`]s at a fixed angular resolution.
///
/// Cell latitude index is `floor((lat + 90) / size)` and longitude index is
/// `floor((lon + 180) / size)`. When the size does not divide 180 or 360 evenly
/// the band counts are truncated, and locations past the last full band (including
/// exactly +90° or +180°) fall into the last band.
///
/// # Examples
///
/// ```
/// use gridtemp::{GridCell, GridIndex, Location};
///
/// let grid = GridIndex::new(20.0).unwrap();
/// assert_eq!((grid.lat_bands(), grid.lon_bands()), (9, 18));
///
/// let cell = grid.cell(Location { latitude: 10.0, longitude: 10.0 });
/// assert_eq!(cell, GridCell { lat: 5, lon: 9 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIndex {
    size: f64,
    lat_bands: usize,
    lon_bands: usize,
}

impl GridIndex {
    /// # Errors
    ///
    /// [`ConfigError::InvalidGridSize`] for a non-positive or non-finite size,
    /// [`ConfigError::GridHasNoCells`] when no full latitude band fits.
    pub fn new(size: f64) -> Result<Self, ConfigError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(ConfigError::InvalidGridSize(size));
        }
        let lat_bands = (180.0 / size).floor();
        let lon_bands = (360.0 / size).floor();
        if lat_bands < 1.0 || lon_bands < 1.0 {
            return Err(ConfigError::GridHasNoCells { grid_size: size });
        }
        Ok(Self {
            size,
            lat_bands: lat_bands as usize,
            lon_bands: lon_bands as usize,
        })
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn lat_bands(&self) -> usize {
        self.lat_bands
    }

    pub fn lon_bands(&self) -> usize {
        self.lon_bands
    }

    pub fn cell_count(&self) -> usize {
        self.lat_bands * self.lon_bands
    }

    pub fn cell(&self, location: Location) -> GridCell {
        GridCell {
            lat: Self::band(location.latitude + 90.0, self.size, self.lat_bands),
            lon: Self::band(location.longitude + 180.0, self.size, self.lon_bands),
        }
    }

    fn band(offset: f64, size: f64, bands: usize) -> usize {
        let index = (offset / size).floor();
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(bands - 1)
        }
    }

    /// Latitude of the middle of a latitude band, in degrees.
    pub fn band_center_latitude(&self, lat_band: usize) -> f64 {
        (lat_band as f64 + 0.5) * self.size - 90.0
    }

    /// Area weight of a latitude band: the cosine of its center latitude, which is
    /// proportional to the band's surface area per degree of longitude.
    pub fn area_weight(&self, lat_band: usize) -> f64 {
        self.band_center_latitude(lat_band).to_radians().cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(latitude: f64, longitude: f64) -> Location {
        Location {
            latitude,
            longitude,
        }
    }

    #[test]
    fn default_grid_has_nine_by_eighteen_cells() -> Result<(), ConfigError> {
        let grid = GridIndex::new(20.0)?;
        assert_eq!(grid.cell_count(), 162);
        Ok(())
    }

    #[test]
    fn assigns_cells_by_floor() -> Result<(), ConfigError> {
        let grid = GridIndex::new(20.0)?;
        assert_eq!(grid.cell(at(-90.0, -180.0)), GridCell { lat: 0, lon: 0 });
        assert_eq!(grid.cell(at(-70.0, 170.0)), GridCell { lat: 1, lon: 17 });
        assert_eq!(grid.cell(at(-70.01, 159.99)), GridCell { lat: 0, lon: 16 });
        assert_eq!(grid.cell(at(0.0, 0.0)), GridCell { lat: 4, lon: 9 });
        Ok(())
    }

    #[test]
    fn poles_and_antimeridian_clamp_to_last_band() -> Result<(), ConfigError> {
        let grid = GridIndex::new(20.0)?;
        assert_eq!(grid.cell(at(90.0, 180.0)), GridCell { lat: 8, lon: 17 });
        Ok(())
    }

    #[test]
    fn uneven_grid_truncates_band_count() -> Result<(), ConfigError> {
        let grid = GridIndex::new(7.0)?;
        assert_eq!(grid.lat_bands(), 25);
        assert_eq!(grid.lon_bands(), 51);
        assert_eq!(grid.cell(at(89.0, 179.0)), GridCell { lat: 24, lon: 50 });
        Ok(())
    }

    #[test]
    fn rejects_invalid_sizes() {
        assert_eq!(GridIndex::new(0.0), Err(ConfigError::InvalidGridSize(0.0)));
        assert_eq!(
            GridIndex::new(181.0),
            Err(ConfigError::GridHasNoCells { grid_size: 181.0 })
        );
    }

    #[test]
    fn band_weights_follow_cosine_of_center() -> Result<(), ConfigError> {
        let grid = GridIndex::new(20.0)?;
        assert_eq!(grid.band_center_latitude(0), -80.0);
        assert_eq!(grid.band_center_latitude(4), 0.0);
        assert_eq!(grid.area_weight(4), 1.0);
        assert!((grid.area_weight(0) - 80f64.to_radians().cos()).abs() < 1e-15);
        // Symmetric about the equator.
        assert!((grid.area_weight(1) - grid.area_weight(7)).abs() < 1e-12);
        Ok(())
    }
}
