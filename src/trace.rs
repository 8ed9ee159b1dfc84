//! Traversal output: the finished diagram plus the numbers behind it.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagram::{self, Diagram, DotStyle};
use crate::emissions::TransportMode;
use crate::model::Visit;
use crate::Result;

/// One priced transport leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitHop {
    /// The product moved.
    pub resource: String,
    /// Where it was made.
    pub from_supplier: String,
    /// Where it was consumed.
    pub to_supplier: String,
    pub distance_km: f64,
    pub mass_g: f64,
    pub mode: TransportMode,
    pub emissions_kg: f64,
}

/// Transport emissions accumulated up to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEmissions {
    pub product: String,
    pub emissions_kg: f64,
}

/// A completed walk from one root product.
#[derive(Debug, Clone)]
pub struct Trace {
    pub root: String,
    pub result: Visit,
    pub diagram: Diagram,
    /// Every hop priced during the walk, in discovery order.
    pub hops: Vec<TransitHop>,
    /// One entry per product visited, in post-order.
    pub products: Vec<ProductEmissions>,
}

impl Trace {
    pub fn total_emissions_kg(&self) -> f64 {
        self.result.emissions_kg
    }

    pub fn render_dot(&self, style: &DotStyle, writer: &mut dyn Write) -> Result<()> {
        diagram::render_dot(&self.diagram, style, writer)
    }

    pub fn export_cypher(&self, writer: &mut dyn Write) -> Result<()> {
        diagram::export_cypher(&self.diagram, writer)
    }

    /// Summary stamped with the current time.
    pub fn report(&self) -> Report {
        self.report_at(Utc::now())
    }

    pub fn report_at(&self, generated_at: DateTime<Utc>) -> Report {
        Report {
            root: self.root.clone(),
            origin: self.result.origin.clone(),
            total_emissions_kg: self.result.emissions_kg,
            products: self.products.clone(),
            hops: self.hops.clone(),
            generated_at,
        }
    }
}

/// Serializable run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub root: String,
    /// Supplier of the root product.
    pub origin: Option<String>,
    pub total_emissions_kg: f64,
    pub products: Vec<ProductEmissions>,
    pub hops: Vec<TransitHop>,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Emissions split by transport mode: `(ground_kg, air_kg)`.
    pub fn by_mode(&self) -> (f64, f64) {
        self.hops.iter().fold((0.0, 0.0), |(ground, air), hop| match hop.mode {
            TransportMode::Ground => (ground + hop.emissions_kg, air),
            TransportMode::Air => (ground, air + hop.emissions_kg),
        })
    }
}
