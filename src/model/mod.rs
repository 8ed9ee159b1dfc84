//! # Supply-Chain Model
//!
//! Plain data that crosses every boundary: catalog ↔ walker ↔ diagram ↔ report.
//!
//! Design rule: no rendering, no geocoding and no I/O beyond catalog loading.
//! The walker reads a `Catalog`, resolves `Location`s and returns `Visit`s.

pub mod catalog;
pub mod location;
pub mod visit;

pub use catalog::{
    Catalog, CatalogBuilder, Product, Supplier, SupplierDraft,
    ResourceRef, ResourceKind,
};
pub use location::{Coordinates, Location, EARTH_RADIUS_KM, flag_emoji};
pub use visit::{NodeKind, Visit};
