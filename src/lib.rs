//! # supplygraph: Supply-Chain Diagrams with Transport CO2e
//!
//! Walks a declarative catalog of products, materials and suppliers from a
//! finished product down to its raw inputs, prices every supplier-to-supplier
//! transport hop in kg CO2e, and emits a dependency diagram in the same pass.
//!
//! ## Design Principles
//!
//! 1. **Classify once**: resource references are tagged material/product when
//!    the `Catalog` is built, never re-probed during the walk
//! 2. **Injected collaborators**: the `Locator` and the `DiagramSink` are
//!    explicit parameters of the `Walker`, not process-wide state
//! 3. **Pure emissions model**: `(distance, mass) -> (kg CO2e, mode)` with no I/O
//! 4. **No partial output**: renderers only ever see a completed `Trace`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use supplygraph::{SupplyChain, Gazetteer, DotStyle};
//!
//! # fn example() -> supplygraph::Result<()> {
//! let chain = SupplyChain::open("supply-chain-data.yml")?;
//! let trace = chain.trace("product1", &Gazetteer::new())?;
//!
//! println!("{} kg CO2e", trace.total_emissions_kg());
//! trace.render_dot(&DotStyle::default(), &mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Output Formats
//!
//! | Format | Function | Description |
//! |--------|----------|-------------|
//! | DOT | `render_dot` | Graphviz source with HTML-table labels |
//! | Cypher | `export_cypher` | `CREATE` script for a property graph database |
//! | JSON | `Trace::report` | Per-product totals and every priced hop |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod emissions;
pub mod locate;
pub mod diagram;
pub mod walker;
pub mod trace;
pub mod config;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Catalog, CatalogBuilder, Product, Supplier, SupplierDraft,
    ResourceRef, ResourceKind, NodeKind, Coordinates, Location, Visit,
};

// ============================================================================
// Re-exports: Emissions, location, diagram
// ============================================================================

pub use emissions::{
    EmissionsPolicy, TransitEstimate, TransportMode, estimate_transit_emissions,
};
pub use locate::{CachedLocator, Gazetteer, Locator};
pub use diagram::{
    Diagram, DiagramEdge, DiagramNode, DiagramSink, DotStyle, EdgeLabel,
    export_cypher, render_dot,
};
pub use walker::Walker;
pub use trace::{ProductEmissions, Report, Trace, TransitHop};
pub use config::Config;

use std::path::Path;

// ============================================================================
// Top-level SupplyChain handle
// ============================================================================

/// The primary entry point. A `SupplyChain` owns a validated catalog and the
/// emissions policy used to price transport hops.
#[derive(Debug, Clone)]
pub struct SupplyChain {
    catalog: Catalog,
    policy: EmissionsPolicy,
}

impl SupplyChain {
    /// Wrap an already-built catalog with the default emissions policy.
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog, policy: EmissionsPolicy::default() }
    }

    /// Load and validate a YAML catalog from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Catalog::load(path)?))
    }

    /// Replace the emissions policy.
    pub fn with_policy(mut self, policy: EmissionsPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Apply the settings of a loaded `Config`.
    pub fn configured(self, config: &Config) -> Self {
        self.with_policy(config.emissions)
    }

    /// Walk the chain below `root` and collect the diagram in memory.
    ///
    /// Fails without producing any diagram if a reference dangles, a
    /// location cannot be resolved, or the chain is cyclic.
    pub fn trace<L: Locator + ?Sized>(&self, root: &str, locator: &L) -> Result<Trace> {
        let mut diagram = Diagram::new();
        let mut walker = Walker::new(&self.catalog, locator, &mut diagram)
            .with_policy(self.policy);
        let result = walker.walk(root)?;
        let (hops, products) = walker.finish();

        Ok(Trace {
            root: root.to_string(),
            result,
            diagram,
            hops,
            products,
        })
    }

    /// Walk the chain below `root`, streaming diagram elements into `sink`.
    pub fn trace_into<L, S>(&self, root: &str, locator: &L, sink: &mut S) -> Result<Visit>
    where
        L: Locator + ?Sized,
        S: DiagramSink + ?Sized,
    {
        Walker::new(&self.catalog, locator, sink)
            .with_policy(self.policy)
            .walk(root)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> EmissionsPolicy {
        self.policy
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unresolvable location for supplier '{supplier}': no match for address '{address}'")]
    UnresolvableLocation { supplier: String, address: String },

    #[error("Dangling reference: '{referrer}' refers to unknown '{reference}'")]
    DanglingReference { referrer: String, reference: String },

    #[error("Invalid numeric input: {field} = {value}")]
    InvalidNumericInput { field: String, value: f64 },

    #[error("Cycle detected in supply chain: {path}")]
    CycleDetected { path: String },

    #[error("Identifier '{id}' names both a {first} and a {second}")]
    IdConflict { id: String, first: NodeKind, second: NodeKind },

    #[error("Supplier '{supplier}' declares neither an address nor coordinates")]
    MissingLocation { supplier: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Geocoder error: {0}")]
    Geocoder(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
