//! Supply-chain walker.
//!
//! Recursive, post-order, depth-first descent from a root product:
//!
//! ```text
//! product  ──visit──▶ its supplier ──visit──▶ each resource (material | product)
//!    ◀── (origin, kg) ────────────◀── (origin, kg) per resource
//! ```
//!
//! - A material returns `(None, 0)`.
//! - A product returns whatever its supplier returned; it never adds emissions.
//! - A supplier prices the hop from every product resource's origin to
//!   itself, sums those with the resources' own totals, and returns itself
//!   as the new origin.
//!
//! Diagram elements are emitted into the sink during the same walk. Locations
//! are resolved lazily, once per supplier per walker.

use hashbrown::HashMap;

use crate::diagram::{DiagramEdge, DiagramNode, DiagramSink, EdgeLabel};
use crate::emissions::EmissionsPolicy;
use crate::locate::Locator;
use crate::model::{Catalog, Location, NodeKind, ResourceKind, Visit};
use crate::trace::{ProductEmissions, TransitHop};
use crate::{Error, Result};

/// One traversal over a catalog.
///
/// Borrows the catalog and locator, and the sink mutably, for its lifetime.
/// Use one walker per root: the root decides which edge gets an arrowhead.
pub struct Walker<'a, L: Locator + ?Sized, S: DiagramSink + ?Sized> {
    catalog: &'a Catalog,
    locator: &'a L,
    sink: &'a mut S,
    policy: EmissionsPolicy,
    root: Option<String>,
    /// supplier id → resolved location
    locations: HashMap<String, Location>,
    /// Nodes on the current descent path, for cycle detection.
    active: Vec<(NodeKind, String)>,
    hops: Vec<TransitHop>,
    products: Vec<ProductEmissions>,
}

impl<'a, L: Locator + ?Sized, S: DiagramSink + ?Sized> Walker<'a, L, S> {
    pub fn new(catalog: &'a Catalog, locator: &'a L, sink: &'a mut S) -> Self {
        Self {
            catalog,
            locator,
            sink,
            policy: EmissionsPolicy::default(),
            root: None,
            locations: HashMap::new(),
            active: Vec::new(),
            hops: Vec::new(),
            products: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: EmissionsPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Walk everything below the root product.
    pub fn walk(&mut self, root: &str) -> Result<Visit> {
        self.policy.validate()?;
        self.root = Some(root.to_string());
        let visit = self.visit(root, NodeKind::Product)?;
        tracing::info!(
            root,
            emissions_kg = visit.emissions_kg,
            hops = self.hops.len(),
            suppliers_located = self.locations.len(),
            "supply chain traced"
        );
        Ok(visit)
    }

    /// Visit one node and everything it depends on.
    pub fn visit(&mut self, id: &str, kind: NodeKind) -> Result<Visit> {
        if self.active.iter().any(|(k, n)| *k == kind && n == id) {
            let mut path: Vec<&str> = self.active.iter().map(|(_, n)| n.as_str()).collect();
            path.push(id);
            return Err(Error::CycleDetected { path: path.join(" -> ") });
        }

        tracing::debug!(%kind, id, depth = self.active.len(), "visit");
        self.active.push((kind, id.to_string()));
        let result = match kind {
            NodeKind::Material => self.visit_material(id),
            NodeKind::Product => self.visit_product(id),
            NodeKind::Supplier => self.visit_supplier(id),
        };
        self.active.pop();
        result
    }

    /// Priced hops and per-product totals collected so far.
    pub fn finish(self) -> (Vec<TransitHop>, Vec<ProductEmissions>) {
        (self.hops, self.products)
    }

    fn visit_material(&mut self, id: &str) -> Result<Visit> {
        if !self.catalog.is_material(id) {
            return Err(self.dangling(id));
        }
        self.sink.emit_node(DiagramNode::Material { id: id.to_string() })?;
        Ok(Visit::material())
    }

    fn visit_product(&mut self, id: &str) -> Result<Visit> {
        let catalog = self.catalog;
        let product = catalog.product(id).ok_or_else(|| self.dangling(id))?;

        let upstream = self.visit(&product.supplier, NodeKind::Supplier)?;

        self.sink.emit_node(DiagramNode::Product {
            id: id.to_string(),
            mass_g: product.mass_g,
            quantity: product.quantity,
            emissions_kg: upstream.emissions_kg,
        })?;
        let is_root = self.root.as_deref() == Some(id);
        self.sink.emit_edge(
            DiagramEdge::plain(product.supplier.as_str(), id).with_arrowhead(is_root),
        )?;

        if !self.products.iter().any(|p| p.product == id) {
            self.products.push(ProductEmissions {
                product: id.to_string(),
                emissions_kg: upstream.emissions_kg,
            });
        }

        Ok(upstream)
    }

    fn visit_supplier(&mut self, id: &str) -> Result<Visit> {
        let catalog = self.catalog;
        let supplier = catalog.supplier(id).ok_or_else(|| self.dangling(id))?;

        let country_code = match &supplier.country_code {
            Some(code) => Some(code.clone()),
            None => self.locate(id)?.country_code,
        };
        self.sink.emit_node(DiagramNode::Supplier {
            id: id.to_string(),
            country_code,
            processes: supplier.processes.clone(),
            high_impact: supplier.high_impact,
        })?;

        let mut total = 0.0;
        for resource in &supplier.resources {
            let upstream = self.visit(&resource.id, resource.kind.into())?;

            match (upstream.origin(), resource.kind) {
                (Some(origin), ResourceKind::Product) => {
                    let mass_g = catalog
                        .product(&resource.id)
                        .map(|p| p.mass_g)
                        .ok_or_else(|| self.dangling(&resource.id))?;
                    let here = self.locate(id)?;
                    let there = self.locate(origin)?;
                    let distance_km = here.distance_km(&there);
                    let estimate = self.policy.estimate(distance_km, mass_g);

                    tracing::trace!(
                        resource = %resource.id,
                        from = origin,
                        to = id,
                        distance_km,
                        mass_g,
                        mode = %estimate.mode,
                        emissions_kg = estimate.emissions_kg,
                        "transit hop"
                    );

                    self.hops.push(TransitHop {
                        resource: resource.id.clone(),
                        from_supplier: origin.to_string(),
                        to_supplier: id.to_string(),
                        distance_km,
                        mass_g,
                        mode: estimate.mode,
                        emissions_kg: estimate.emissions_kg,
                    });
                    total += estimate.emissions_kg + upstream.emissions_kg;

                    self.sink.emit_edge(
                        DiagramEdge::plain(resource.id.as_str(), id)
                            .with_label(EdgeLabel { distance_km, mode: estimate.mode }),
                    )?;
                }
                _ => {
                    total += upstream.emissions_kg;
                    self.sink.emit_edge(DiagramEdge::plain(resource.id.as_str(), id))?;
                }
            }
        }

        Ok(Visit::anchored(id, total))
    }

    /// Resolve a supplier's location, at most once per walker.
    fn locate(&mut self, supplier_id: &str) -> Result<Location> {
        if let Some(location) = self.locations.get(supplier_id) {
            return Ok(location.clone());
        }

        let catalog = self.catalog;
        let supplier = catalog
            .supplier(supplier_id)
            .ok_or_else(|| self.dangling(supplier_id))?;

        let location = match (&supplier.coordinates, &supplier.address) {
            (Some(coordinates), _) => Location {
                coordinates: *coordinates,
                country_code: supplier.country_code.clone(),
            },
            (None, Some(address)) => {
                let mut found = self.locator.locate(address)?.ok_or_else(|| {
                    Error::UnresolvableLocation {
                        supplier: supplier_id.to_string(),
                        address: address.clone(),
                    }
                })?;
                found.coordinates.validate(&format!("suppliers.{supplier_id}.location"))?;
                if supplier.country_code.is_some() {
                    found.country_code = supplier.country_code.clone();
                }
                found
            }
            (None, None) => {
                return Err(Error::MissingLocation { supplier: supplier_id.to_string() });
            }
        };

        tracing::debug!(
            supplier = supplier_id,
            lat = location.coordinates.lat,
            lon = location.coordinates.lon,
            "located supplier"
        );
        self.locations.insert(supplier_id.to_string(), location.clone());
        Ok(location)
    }

    fn dangling(&self, reference: &str) -> Error {
        // The failing node is already on the path; its parent is the referrer.
        let referrer = self.active
            .iter()
            .rev()
            .nth(1)
            .map(|(_, id)| id.clone())
            .unwrap_or_else(|| "<root>".to_string());
        Error::DanglingReference { referrer, reference: reference.to_string() }
    }
}
