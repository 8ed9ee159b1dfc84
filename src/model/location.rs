//! Geographic positions and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// WGS84 latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject non-finite values and positions off the globe.
    ///
    /// `field` prefixes the reported field name, e.g. `suppliers.mill.location`.
    pub fn validate(&self, field: &str) -> Result<()> {
        let checks = [("lat", self.lat, 90.0), ("lon", self.lon, 180.0)];
        for (axis, value, limit) in checks {
            if !value.is_finite() || value.abs() > limit {
                return Err(Error::InvalidNumericInput {
                    field: format!("{field}.{axis}"),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Great-circle distance to another position in kilometers.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_KM * c
    }
}

/// A resolved supplier location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinates: Coordinates,
    /// ISO 3166-1 alpha-2 code, when the resolver knows it.
    #[serde(default)]
    pub country_code: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { coordinates: Coordinates::new(lat, lon), country_code: None }
    }

    pub fn with_country(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    pub fn distance_km(&self, other: &Location) -> f64 {
        self.coordinates.distance_km(&other.coordinates)
    }
}

/// Regional-indicator flag emoji for a two-letter country code.
///
/// Returns `None` for anything that is not exactly two ASCII letters.
pub fn flag_emoji(country_code: &str) -> Option<String> {
    let code = country_code.trim();
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    code.bytes()
        .map(|b| char::from_u32(0x1F1E6 + u32::from(b.to_ascii_uppercase() - b'A')))
        .collect()
}
