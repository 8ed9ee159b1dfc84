//! Node kinds and the per-node traversal result.

use serde::{Deserialize, Serialize};

/// What a visited identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Material,
    Product,
    Supplier,
}

impl NodeKind {
    /// Graph label used by the Cypher export.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Material => "Material",
            NodeKind::Product => "Product",
            NodeKind::Supplier => "Supplier",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Material => write!(f, "material"),
            NodeKind::Product => write!(f, "product"),
            NodeKind::Supplier => write!(f, "supplier"),
        }
    }
}

/// Result of visiting one node.
///
/// `origin` is the supplier the result is anchored to; the caller measures
/// the next transport hop from there. It is `None` only for materials,
/// which have no location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub origin: Option<String>,
    pub emissions_kg: f64,
}

impl Visit {
    /// The terminal result of a raw material.
    pub fn material() -> Self {
        Self { origin: None, emissions_kg: 0.0 }
    }

    pub fn anchored(origin: impl Into<String>, emissions_kg: f64) -> Self {
        Self { origin: Some(origin.into()), emissions_kg }
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_visit_has_no_origin() {
        let visit = Visit::material();
        assert_eq!(visit.origin(), None);
        assert_eq!(visit.emissions_kg, 0.0);
    }

    #[test]
    fn test_kind_display_and_label() {
        assert_eq!(NodeKind::Supplier.to_string(), "supplier");
        assert_eq!(NodeKind::Product.label(), "Product");
    }
}
