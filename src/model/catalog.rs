//! The supply-chain catalog: materials, products and suppliers.
//!
//! A `Catalog` is only ever produced by `CatalogBuilder::build`, which
//! classifies every supplier resource as a material or a product and rejects
//! references that resolve to neither. The walker can therefore rely on:
//!
//! - every `ResourceRef` naming a known material or product,
//! - every product naming a known supplier,
//! - every supplier declaring an address or coordinates,
//! - declared coordinates being finite and on the globe,
//! - every product mass being finite and non-negative,
//! - no supplier sharing its id with a product or a material.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Coordinates, NodeKind};
use crate::{Error, Result};

// ============================================================================
// Resolved catalog types
// ============================================================================

/// Kind of a supplier input, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Material,
    Product,
}

impl From<ResourceKind> for NodeKind {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Material => NodeKind::Material,
            ResourceKind::Product => NodeKind::Product,
        }
    }
}

/// A classified entry of a supplier's `resources` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub mass_g: f64,
    pub quantity: u32,
    pub supplier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    /// Free-text address handed to the `Locator`.
    pub address: Option<String>,
    /// Declared position; when present the locator is never consulted.
    pub coordinates: Option<Coordinates>,
    pub country_code: Option<String>,
    pub high_impact: bool,
    pub processes: Vec<String>,
    pub resources: SmallVec<[ResourceRef; 4]>,
}

/// Validated, read-only view of a supply chain.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    materials: HashSet<String>,
    products: HashMap<String, Product>,
    suppliers: HashMap<String, Supplier>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Parse and validate a YAML catalog.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawCatalog = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Catalog(e.to_string()))?;
        raw.into_builder().build()
    }

    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawCatalog = serde_yaml::from_reader(reader)
            .map_err(|e| Error::Catalog(e.to_string()))?;
        raw.into_builder().build()
    }

    /// Load a YAML catalog from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_yaml_reader(std::io::BufReader::new(file))?;
        tracing::debug!(
            path = %path.display(),
            materials = catalog.materials.len(),
            products = catalog.products.len(),
            suppliers = catalog.suppliers.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    pub fn is_material(&self, id: &str) -> bool {
        self.materials.contains(id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn supplier(&self, id: &str) -> Option<&Supplier> {
        self.suppliers.get(id)
    }

    pub fn materials(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(String::as_str)
    }

    pub fn products(&self) -> impl Iterator<Item = (&str, &Product)> {
        self.products.iter().map(|(id, p)| (id.as_str(), p))
    }

    pub fn suppliers(&self) -> impl Iterator<Item = (&str, &Supplier)> {
        self.suppliers.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.products.is_empty() && self.suppliers.is_empty()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Unvalidated supplier description; resources are bare identifiers.
#[derive(Debug, Clone, Default)]
pub struct SupplierDraft {
    address: Option<String>,
    coordinates: Option<Coordinates>,
    country_code: Option<String>,
    high_impact: bool,
    processes: Vec<String>,
    resources: Vec<String>,
}

impl SupplierDraft {
    /// A supplier at a fixed position.
    pub fn at(lat: f64, lon: f64) -> Self {
        Self { coordinates: Some(Coordinates::new(lat, lon)), ..Self::default() }
    }

    /// A supplier whose position comes from the locator.
    pub fn at_address(address: impl Into<String>) -> Self {
        Self { address: Some(address.into()), ..Self::default() }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    pub fn high_impact(mut self, high_impact: bool) -> Self {
        self.high_impact = high_impact;
        self
    }

    pub fn process(mut self, process: impl Into<String>) -> Self {
        self.processes.push(process.into());
        self
    }

    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resources.push(id.into());
        self
    }

    pub fn resources(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.resources.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Collects catalog entries and validates them in `build`.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    materials: Vec<String>,
    products: Vec<(String, Product)>,
    suppliers: Vec<(String, SupplierDraft)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn material(mut self, id: impl Into<String>) -> Self {
        self.materials.push(id.into());
        self
    }

    pub fn product(
        mut self,
        id: impl Into<String>,
        mass_g: f64,
        quantity: u32,
        supplier: impl Into<String>,
    ) -> Self {
        self.products.push((id.into(), Product { mass_g, quantity, supplier: supplier.into() }));
        self
    }

    pub fn supplier(mut self, id: impl Into<String>, draft: SupplierDraft) -> Self {
        self.suppliers.push((id.into(), draft));
        self
    }

    /// Validate every entry and classify supplier resources.
    ///
    /// Classification checks the material set first and falls back to the
    /// product table; anything else is a `DanglingReference`.
    pub fn build(self) -> Result<Catalog> {
        let materials: HashSet<String> = self.materials.into_iter().collect();
        let supplier_ids: HashSet<String> = self.suppliers.iter().map(|(id, _)| id.clone()).collect();

        let mut products = HashMap::with_capacity(self.products.len());
        for (id, product) in self.products {
            if !product.mass_g.is_finite() || product.mass_g < 0.0 {
                return Err(Error::InvalidNumericInput {
                    field: format!("products.{id}.mass"),
                    value: product.mass_g,
                });
            }
            if !supplier_ids.contains(product.supplier.as_str()) {
                return Err(Error::DanglingReference {
                    referrer: id,
                    reference: product.supplier,
                });
            }
            if supplier_ids.contains(&id) {
                return Err(Error::IdConflict {
                    id,
                    first: NodeKind::Product,
                    second: NodeKind::Supplier,
                });
            }
            if materials.contains(&id) {
                tracing::warn!(id = %id, "identifier is both a material and a product; resources will resolve to the material");
            }
            products.insert(id, product);
        }

        let mut suppliers = HashMap::with_capacity(self.suppliers.len());
        for (id, draft) in self.suppliers {
            if materials.contains(&id) {
                return Err(Error::IdConflict {
                    id,
                    first: NodeKind::Material,
                    second: NodeKind::Supplier,
                });
            }
            if draft.address.is_none() && draft.coordinates.is_none() {
                return Err(Error::MissingLocation { supplier: id });
            }
            if let Some(coordinates) = &draft.coordinates {
                coordinates.validate(&format!("suppliers.{id}.location"))?;
            }

            let mut resources = SmallVec::with_capacity(draft.resources.len());
            for resource in draft.resources {
                let kind = if materials.contains(&resource) {
                    ResourceKind::Material
                } else if products.contains_key(&resource) {
                    ResourceKind::Product
                } else {
                    return Err(Error::DanglingReference {
                        referrer: id,
                        reference: resource,
                    });
                };
                resources.push(ResourceRef { id: resource, kind });
            }

            suppliers.insert(id, Supplier {
                address: draft.address,
                coordinates: draft.coordinates,
                country_code: draft.country_code,
                high_impact: draft.high_impact,
                processes: draft.processes,
                resources,
            });
        }

        Ok(Catalog { materials, products, suppliers })
    }
}

// ============================================================================
// YAML schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    products: BTreeMap<String, RawProduct>,
    #[serde(default)]
    suppliers: BTreeMap<String, RawSupplier>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(alias = "mass_g")]
    mass: f64,
    #[serde(default = "default_quantity")]
    quantity: u32,
    supplier: String,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSupplier {
    #[serde(default)]
    address: Option<String>,
    #[serde(default, alias = "coordinates")]
    location: Option<Coordinates>,
    #[serde(default, alias = "country_code")]
    country_code: Option<String>,
    #[serde(default, alias = "high_impact")]
    high_impact: bool,
    #[serde(default)]
    processes: Vec<String>,
    #[serde(default)]
    resources: Vec<String>,
}

impl RawCatalog {
    fn into_builder(self) -> CatalogBuilder {
        let mut builder = CatalogBuilder::new();
        for material in self.materials {
            builder = builder.material(material);
        }
        for (id, p) in self.products {
            builder = builder.product(id, p.mass, p.quantity, p.supplier);
        }
        for (id, s) in self.suppliers {
            builder = builder.supplier(id, SupplierDraft {
                address: s.address,
                coordinates: s.location,
                country_code: s.country_code,
                high_impact: s.high_impact,
                processes: s.processes,
                resources: s.resources,
            });
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
materials:
  - steel
  - rubber
products:
  bike:
    mass: 12000
    quantity: 1
    supplier: assembler
  wheel:
    mass_g: 900
    supplier: wheelworks
suppliers:
  assembler:
    address: "Sheffield, UK"
    country-code: GB
    processes: [welding, painting]
    resources: [steel, wheel]
  wheelworks:
    location: { lat: 52.52, lon: 13.40 }
    country-code: DE
    high-impact: true
    resources: [rubber]
"#;

    #[test]
    fn test_yaml_classifies_resources() {
        let catalog = Catalog::from_yaml_str(SAMPLE).unwrap();
        let assembler = catalog.supplier("assembler").unwrap();
        assert_eq!(
            assembler.resources.as_slice(),
            &[
                ResourceRef { id: "steel".into(), kind: ResourceKind::Material },
                ResourceRef { id: "wheel".into(), kind: ResourceKind::Product },
            ]
        );
        assert_eq!(assembler.processes, vec!["welding", "painting"]);
        assert!(catalog.is_material("rubber"));
    }

    #[test]
    fn test_yaml_defaults_and_aliases() {
        let catalog = Catalog::from_yaml_str(SAMPLE).unwrap();
        let wheel = catalog.product("wheel").unwrap();
        assert_eq!(wheel.mass_g, 900.0);
        assert_eq!(wheel.quantity, 1);

        let works = catalog.supplier("wheelworks").unwrap();
        assert!(works.high_impact);
        assert_eq!(works.coordinates, Some(Coordinates::new(52.52, 13.40)));
        assert_eq!(works.address, None);
    }

    #[test]
    fn test_material_wins_over_product() {
        let catalog = Catalog::builder()
            .material("frame")
            .product("frame", 10.0, 1, "s")
            .supplier("s", SupplierDraft::at(0.0, 0.0).resource("frame"))
            .build()
            .unwrap();
        assert_eq!(catalog.supplier("s").unwrap().resources[0].kind, ResourceKind::Material);
    }

    #[test]
    fn test_dangling_resource() {
        let err = Catalog::builder()
            .supplier("s", SupplierDraft::at(0.0, 0.0).resource("unobtainium"))
            .build()
            .unwrap_err();
        match err {
            Error::DanglingReference { referrer, reference } => {
                assert_eq!(referrer, "s");
                assert_eq!(reference, "unobtainium");
            }
            other => panic!("expected DanglingReference, got {other:?}"),
        }
    }

    #[test]
    fn test_resource_naming_a_supplier_is_dangling() {
        let err = Catalog::builder()
            .supplier("a", SupplierDraft::at(0.0, 0.0))
            .supplier("b", SupplierDraft::at(0.0, 0.0).resource("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DanglingReference { .. }));
    }

    #[test]
    fn test_dangling_product_supplier() {
        let err = Catalog::builder()
            .product("p", 1.0, 1, "ghost")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DanglingReference { ref reference, .. } if reference == "ghost"));
    }

    #[test]
    fn test_negative_mass_rejected() {
        let err = Catalog::builder()
            .product("p", -5.0, 1, "s")
            .supplier("s", SupplierDraft::at(0.0, 0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidNumericInput { value, .. } if value == -5.0));
    }

    #[test]
    fn test_product_sharing_supplier_id_rejected() {
        let err = Catalog::builder()
            .material("flour")
            .product("bakery", 500.0, 1, "bakery")
            .supplier("bakery", SupplierDraft::at(0.0, 0.0).resource("flour"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IdConflict { ref id, first: NodeKind::Product, second: NodeKind::Supplier } if id == "bakery"
        ));
    }

    #[test]
    fn test_material_sharing_supplier_id_rejected() {
        let err = Catalog::builder()
            .material("quarry")
            .supplier("quarry", SupplierDraft::at(0.0, 0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::IdConflict { first: NodeKind::Material, .. }));
        assert_eq!(err.to_string(), "Identifier 'quarry' names both a material and a supplier");
    }

    #[test]
    fn test_bad_supplier_coordinates_rejected() {
        let err = Catalog::builder()
            .supplier("mill", SupplierDraft::at(0.0, 200.0))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidNumericInput { ref field, value } if field == "suppliers.mill.location.lon" && value == 200.0
        ));
    }

    #[test]
    fn test_supplier_without_site_rejected() {
        let err = Catalog::builder()
            .supplier("nowhere", SupplierDraft::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingLocation { .. }));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = Catalog::from_yaml_str("products: [not, a, map]").unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }
}
