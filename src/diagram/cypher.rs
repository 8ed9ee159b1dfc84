//! Cypher export: serialize a traced supply chain as Cypher statements.
//!
//! Produces a script that loads the diagram into Neo4j or any
//! Cypher-compatible database, for querying a chain after it is traced.
//!
//! ```text
//! (:Material {id}) -[:SUPPLIES]-> (:Supplier {id, country_code, ...})
//! (:Supplier) -[:SUPPLIES]-> (:Product {id, mass_g, quantity, emissions_kg})
//! (:Product) -[:SUPPLIES {distance_km, mode}]-> (:Supplier)
//! ```

use std::io::Write;

use super::{Diagram, DiagramNode};
use crate::Result;

/// Export a diagram as a Cypher script.
///
/// Writes one `CREATE` per node, then one `MATCH ... CREATE` per edge.
/// Nodes are matched on their `id` property. `CatalogBuilder::build` rejects
/// a supplier sharing its id with a product or a material, so supplier nodes
/// never collide with the nodes around them.
pub fn export_cypher(diagram: &Diagram, writer: &mut dyn Write) -> Result<()> {
    // Header
    writeln!(writer, "// supplygraph Cypher export")?;
    writeln!(writer, "// Nodes: {}", diagram.nodes().len())?;
    writeln!(writer, "// Relationships: {}", diagram.edges().len())?;
    writeln!(writer)?;

    for node in diagram.nodes() {
        writeln!(
            writer,
            "CREATE (:{} {{{}}});",
            node.kind().label(),
            node_properties(node).join(", "),
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "// Relationships")?;

    for edge in diagram.edges() {
        let mut props = Vec::new();
        if let Some(label) = &edge.label {
            props.push(format!("distance_km: {}", format_float(label.distance_km)));
            props.push(format!("mode: {}", format_string(&label.mode.to_string())));
        }
        let props_part = if props.is_empty() {
            String::new()
        } else {
            format!(" {{{}}}", props.join(", "))
        };

        writeln!(
            writer,
            "MATCH (a {{id: {}}}), (b {{id: {}}}) CREATE (a)-[:SUPPLIES{}]->(b);",
            format_string(&edge.from),
            format_string(&edge.to),
            props_part,
        )?;
    }

    Ok(())
}

fn node_properties(node: &DiagramNode) -> Vec<String> {
    let mut props = vec![format!("id: {}", format_string(node.id()))];
    match node {
        DiagramNode::Material { .. } => {}
        DiagramNode::Product { mass_g, quantity, emissions_kg, .. } => {
            props.push(format!("mass_g: {}", format_float(*mass_g)));
            props.push(format!("quantity: {quantity}"));
            props.push(format!("emissions_kg: {}", format_float(*emissions_kg)));
        }
        DiagramNode::Supplier { country_code, processes, high_impact, .. } => {
            if let Some(cc) = country_code {
                props.push(format!("country_code: {}", format_string(cc)));
            }
            let list: Vec<String> = processes.iter().map(|p| format_string(p)).collect();
            props.push(format!("processes: [{}]", list.join(", ")));
            props.push(format!("high_impact: {high_impact}"));
        }
    }
    props
}

/// Format a string as a Cypher literal.
fn format_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Floats always carry a decimal point so Cypher reads them as FLOAT.
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{DiagramEdge, DiagramSink, EdgeLabel};
    use crate::emissions::TransportMode;

    #[test]
    fn test_format_literals() {
        assert_eq!(format_string("O'Brien Ltd"), "'O\\'Brien Ltd'");
        assert_eq!(format_float(200.0), "200.0");
        assert_eq!(format_float(0.0105), "0.0105");
    }

    #[test]
    fn test_node_properties() {
        let props = node_properties(&DiagramNode::Product {
            id: "wheel".into(),
            mass_g: 900.0,
            quantity: 2,
            emissions_kg: 0.5,
        });
        assert_eq!(props, vec!["id: 'wheel'", "mass_g: 900.0", "quantity: 2", "emissions_kg: 0.5"]);
    }

    #[test]
    fn test_export_script() {
        let mut diagram = Diagram::new();
        diagram.emit_node(DiagramNode::Material { id: "rubber".into() }).unwrap();
        diagram.emit_node(DiagramNode::Supplier {
            id: "works".into(),
            country_code: Some("DE".into()),
            processes: vec!["moulding".into()],
            high_impact: false,
        }).unwrap();
        diagram.emit_edge(DiagramEdge::plain("rubber", "works")).unwrap();
        diagram.emit_edge(DiagramEdge::plain("works", "bike").with_label(EdgeLabel {
            distance_km: 930.0,
            mode: TransportMode::Air,
        })).unwrap();

        let mut out = Vec::new();
        export_cypher(&diagram, &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("// Nodes: 2\n// Relationships: 2\n"));
        assert!(script.contains("CREATE (:Material {id: 'rubber'});"));
        assert!(script.contains(
            "CREATE (:Supplier {id: 'works', country_code: 'DE', processes: ['moulding'], high_impact: false});"
        ));
        assert!(script.contains("MATCH (a {id: 'rubber'}), (b {id: 'works'}) CREATE (a)-[:SUPPLIES]->(b);"));
        assert!(script.contains("CREATE (a)-[:SUPPLIES {distance_km: 930.0, mode: 'air'}]->(b);"));
    }
}
