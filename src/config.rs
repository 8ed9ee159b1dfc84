//! # Run Configuration
//!
//! Parsed from a TOML file; every section and key is optional.
//!
//! ```toml
//! [emissions]
//! air_threshold_km = 873.0
//!
//! [diagram]
//! font = "Segoe UI Emoji"
//! rankdir = "LR"
//!
//! [locator]
//! kind = "gazetteer"
//! path = "places.yml"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagram::DotStyle;
use crate::emissions::EmissionsPolicy;
use crate::locate::{CachedLocator, Gazetteer, Locator};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub emissions: EmissionsPolicy,
    pub diagram: DotStyle,
    pub locator: LocatorConfig,
}

/// Which `Locator` resolves supplier addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LocatorConfig {
    /// Offline address table; without a path only declared coordinates work.
    Gazetteer {
        #[serde(default)]
        path: Option<PathBuf>,
    },

    /// Nominatim-compatible HTTP service
    #[cfg(feature = "geocode")]
    Nominatim {
        #[serde(default = "default_endpoint")]
        endpoint: String,
        user_agent: String,
    },
}

impl Default for LocatorConfig {
    fn default() -> Self {
        LocatorConfig::Gazetteer { path: None }
    }
}

#[cfg(feature = "geocode")]
fn default_endpoint() -> String {
    crate::locate::nominatim::DEFAULT_ENDPOINT.to_string()
}

impl LocatorConfig {
    /// Build the configured locator behind a per-address cache.
    pub fn build(&self) -> Result<CachedLocator<Box<dyn Locator>>> {
        let locator: Box<dyn Locator> = match self {
            LocatorConfig::Gazetteer { path: None } => Box::new(Gazetteer::new()),
            LocatorConfig::Gazetteer { path: Some(path) } => Box::new(Gazetteer::load(path)?),
            #[cfg(feature = "geocode")]
            LocatorConfig::Nominatim { endpoint, user_agent } => {
                Box::new(crate::locate::NominatimLocator::new(endpoint.as_str(), user_agent)?)
            }
        };
        Ok(CachedLocator::new(locator))
    }
}

impl Config {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.emissions.validate()
    }
}
