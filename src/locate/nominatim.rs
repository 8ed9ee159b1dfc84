//! Nominatim-compatible HTTP geocoder.
//!
//! Issues blocking `GET {endpoint}/search?q=...&format=jsonv2&addressdetails=1&limit=1`
//! requests. Public Nominatim instances require a descriptive User-Agent and
//! at most one request per second; wrap this locator in a `CachedLocator` so
//! each address is asked for once.

use std::time::Duration;

use serde::Deserialize;

use super::Locator;
use crate::model::Location;
use crate::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

pub struct NominatimLocator {
    client: reqwest::blocking::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<PlaceAddress>,
}

#[derive(Debug, Deserialize)]
struct PlaceAddress {
    #[serde(default)]
    country_code: Option<String>,
}

impl NominatimLocator {
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| Error::Geocoder(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

impl Locator for NominatimLocator {
    fn locate(&self, address: &str) -> Result<Option<Location>> {
        let url = format!("{}/search", self.endpoint);
        tracing::debug!(%address, %url, "geocoding");

        let response = self.client
            .get(&url)
            .query(&[("q", address), ("format", "jsonv2"), ("addressdetails", "1"), ("limit", "1")])
            .send()
            .map_err(|e| Error::Geocoder(format!("{address}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Geocoder(format!("{address}: HTTP {}", response.status())));
        }

        let places: Vec<Place> = response
            .json()
            .map_err(|e| Error::Geocoder(format!("{address}: {e}")))?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let parse = |field: &str, raw: &str| {
            raw.parse::<f64>()
                .map_err(|_| Error::Geocoder(format!("{address}: bad {field} '{raw}'")))
        };
        let mut location = Location::new(parse("lat", &place.lat)?, parse("lon", &place.lon)?);
        location.country_code = place
            .address
            .and_then(|a| a.country_code)
            .map(|cc| cc.to_ascii_uppercase());

        Ok(Some(location))
    }
}
