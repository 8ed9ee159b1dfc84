//! # Location Resolution
//!
//! The `Locator` trait is the contract between the walker and whatever turns
//! a supplier's free-text address into coordinates.
//!
//! | Locator | Module | Description |
//! |---------|--------|-------------|
//! | `Gazetteer` | `locate` | In-memory address table, loadable from YAML |
//! | `CachedLocator` | `locate` | Memoizing wrapper around any locator |
//! | `NominatimLocator` | `nominatim` | HTTP geocoding (feature `geocode`) |
//!
//! ## Answer semantics
//!
//! - `Ok(Some(location))`: resolved.
//! - `Ok(None)`: definitive "not found". The walker turns this into
//!   `Error::UnresolvableLocation` and aborts the run.
//! - `Err(_)`: the lookup itself failed (network, rate limit). Propagated
//!   unchanged; locators must not mask it as "not found".

#[cfg(feature = "geocode")]
pub mod nominatim;

use std::io::Read;
use std::path::Path;

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::model::{Coordinates, Location};
use crate::{Error, Result};

#[cfg(feature = "geocode")]
pub use nominatim::NominatimLocator;

/// Resolves a free-text address to a location.
pub trait Locator {
    fn locate(&self, address: &str) -> Result<Option<Location>>;
}

impl<L: Locator + ?Sized> Locator for &L {
    fn locate(&self, address: &str) -> Result<Option<Location>> {
        (**self).locate(address)
    }
}

impl<L: Locator + ?Sized> Locator for Box<L> {
    fn locate(&self, address: &str) -> Result<Option<Location>> {
        (**self).locate(address)
    }
}

/// Normalized lookup key: trimmed, whitespace-collapsed, lowercase.
fn normalize(address: &str) -> String {
    address.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

// ============================================================================
// Gazetteer
// ============================================================================

/// Offline address book.
///
/// Addresses are matched case- and whitespace-insensitively. An address
/// missing from the table is a definitive "not found".
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: HashMap<String, Location>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    #[serde(flatten)]
    coordinates: Coordinates,
    #[serde(default, alias = "country-code")]
    country_code: Option<String>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &str, location: Location) {
        self.places.insert(normalize(address), location);
    }

    pub fn with_place(mut self, address: &str, location: Location) -> Self {
        self.insert(address, location);
        self
    }

    /// Parse a YAML mapping of `address: { lat, lon, country-code }`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: std::collections::BTreeMap<String, RawPlace> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Catalog(format!("gazetteer: {e}")))?;
        Self::from_raw(raw)
    }

    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: std::collections::BTreeMap<String, RawPlace> = serde_yaml::from_reader(reader)
            .map_err(|e| Error::Catalog(format!("gazetteer: {e}")))?;
        Self::from_raw(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let gazetteer = Self::from_yaml_reader(std::io::BufReader::new(file))?;
        tracing::debug!(path = %path.as_ref().display(), places = gazetteer.len(), "loaded gazetteer");
        Ok(gazetteer)
    }

    fn from_raw(raw: std::collections::BTreeMap<String, RawPlace>) -> Result<Self> {
        let mut gazetteer = Self::new();
        for (address, place) in raw {
            place.coordinates.validate(&format!("gazetteer.{address}"))?;
            gazetteer.insert(&address, Location {
                coordinates: place.coordinates,
                country_code: place.country_code,
            });
        }
        Ok(gazetteer)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl Locator for Gazetteer {
    fn locate(&self, address: &str) -> Result<Option<Location>> {
        Ok(self.places.get(&normalize(address)).cloned())
    }
}

// ============================================================================
// CachedLocator
// ============================================================================

/// Memoizes another locator's answers by normalized address.
///
/// "Not found" answers are cached too; errors are not, so a transient
/// failure is retried on the next request for that address.
pub struct CachedLocator<L> {
    inner: L,
    answers: RwLock<HashMap<String, Option<Location>>>,
}

impl<L: Locator> CachedLocator<L> {
    pub fn new(inner: L) -> Self {
        Self { inner, answers: RwLock::new(HashMap::new()) }
    }

    /// Number of distinct addresses answered so far.
    pub fn cached(&self) -> usize {
        self.answers.read().len()
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: Locator> Locator for CachedLocator<L> {
    fn locate(&self, address: &str) -> Result<Option<Location>> {
        let key = normalize(address);
        if let Some(answer) = self.answers.read().get(&key) {
            return Ok(answer.clone());
        }

        let answer = self.inner.locate(address)?;
        self.answers.write().insert(key, answer.clone());
        Ok(answer)
    }
}
