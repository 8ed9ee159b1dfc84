//! # Diagram Sink
//!
//! The walker describes the supply chain as nodes and edges pushed into a
//! `DiagramSink`. Emission is idempotent per key: a node is keyed by its id,
//! an edge by its `(from, to)` pair, and re-emitting a key replaces the
//! element in place. A supplier that feeds two downstream products is walked
//! twice and emits the same elements twice; that is expected.
//!
//! `Diagram` is the in-memory sink. Renderers read a finished `Diagram`:
//!
//! | Renderer | Module | Output |
//! |----------|--------|--------|
//! | `render_dot` | `dot` | Graphviz DOT |
//! | `export_cypher` | `cypher` | Cypher `CREATE` script |

pub mod dot;
pub mod cypher;

use std::fmt;

use hashbrown::HashMap;
use serde::Serialize;

use crate::emissions::TransportMode;
use crate::model::NodeKind;
use crate::Result;

pub use dot::{DotStyle, render_dot};
pub use cypher::export_cypher;

// ============================================================================
// Elements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiagramNode {
    Material {
        id: String,
    },
    Product {
        id: String,
        mass_g: f64,
        quantity: u32,
        /// Transport emissions of everything feeding this product.
        emissions_kg: f64,
    },
    Supplier {
        id: String,
        country_code: Option<String>,
        processes: Vec<String>,
        high_impact: bool,
    },
}

impl DiagramNode {
    pub fn id(&self) -> &str {
        match self {
            DiagramNode::Material { id }
            | DiagramNode::Product { id, .. }
            | DiagramNode::Supplier { id, .. } => id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            DiagramNode::Material { .. } => NodeKind::Material,
            DiagramNode::Product { .. } => NodeKind::Product,
            DiagramNode::Supplier { .. } => NodeKind::Supplier,
        }
    }
}

/// Distance and mode of a priced hop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeLabel {
    pub distance_km: f64,
    pub mode: TransportMode,
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} km ({})", self.distance_km, self.mode.glyph())
    }
}

/// A directed edge, drawn in the direction goods move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
    pub label: Option<EdgeLabel>,
    /// Only the edge into the traced root product shows an arrowhead.
    pub arrowhead: bool,
}

impl DiagramEdge {
    pub fn plain(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into(), label: None, arrowhead: true }
    }

    pub fn with_label(mut self, label: EdgeLabel) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_arrowhead(mut self, arrowhead: bool) -> Self {
        self.arrowhead = arrowhead;
        self
    }
}

// ============================================================================
// DiagramSink trait
// ============================================================================

/// Receives diagram elements as the walker discovers them.
pub trait DiagramSink {
    fn emit_node(&mut self, node: DiagramNode) -> Result<()>;

    fn emit_edge(&mut self, edge: DiagramEdge) -> Result<()>;
}

impl<S: DiagramSink + ?Sized> DiagramSink for &mut S {
    fn emit_node(&mut self, node: DiagramNode) -> Result<()> {
        (**self).emit_node(node)
    }

    fn emit_edge(&mut self, edge: DiagramEdge) -> Result<()> {
        (**self).emit_edge(edge)
    }
}

// ============================================================================
// Diagram (in-memory sink)
// ============================================================================

/// Nodes and edges in first-emission order, deduplicated by key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagram {
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    #[serde(skip)]
    edge_index: HashMap<(String, String), usize>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DiagramEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&DiagramEdge> {
        self.edge_index
            .get(&(from.to_string(), to.to_string()))
            .map(|&i| &self.edges[i])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl DiagramSink for Diagram {
    fn emit_node(&mut self, node: DiagramNode) -> Result<()> {
        match self.node_index.get(node.id()) {
            Some(&i) => self.nodes[i] = node,
            None => {
                self.node_index.insert(node.id().to_string(), self.nodes.len());
                self.nodes.push(node);
            }
        }
        Ok(())
    }

    fn emit_edge(&mut self, edge: DiagramEdge) -> Result<()> {
        let key = (edge.from.clone(), edge.to.clone());
        match self.edge_index.get(&key) {
            Some(&i) => self.edges[i] = edge,
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reemission_replaces_in_place() {
        let mut diagram = Diagram::new();
        diagram.emit_node(DiagramNode::Material { id: "steel".into() }).unwrap();
        diagram.emit_node(DiagramNode::Supplier {
            id: "mill".into(),
            country_code: None,
            processes: vec![],
            high_impact: false,
        }).unwrap();
        diagram.emit_node(DiagramNode::Material { id: "steel".into() }).unwrap();

        diagram.emit_edge(DiagramEdge::plain("steel", "mill")).unwrap();
        diagram.emit_edge(DiagramEdge::plain("steel", "mill").with_arrowhead(false)).unwrap();

        assert_eq!(diagram.nodes().len(), 2);
        assert_eq!(diagram.nodes()[0].id(), "steel");
        assert_eq!(diagram.edges().len(), 1);
        assert!(!diagram.edge("steel", "mill").unwrap().arrowhead);
    }

    #[test]
    fn test_edge_label_display() {
        let label = EdgeLabel { distance_km: 499.6, mode: TransportMode::Ground };
        assert_eq!(label.to_string(), "500 km (🚛)");
        let label = EdgeLabel { distance_km: 1234.2, mode: TransportMode::Air };
        assert_eq!(label.to_string(), "1234 km (✈)");
    }

    #[test]
    fn test_json_shape() {
        let mut diagram = Diagram::new();
        diagram.emit_node(DiagramNode::Material { id: "steel".into() }).unwrap();
        let json: serde_json::Value = serde_json::from_str(&diagram.to_json().unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["kind"], "material");
        assert_eq!(json["nodes"][0]["id"], "steel");
        assert!(json["edges"].as_array().unwrap().is_empty());
    }
}
