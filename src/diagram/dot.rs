//! Graphviz DOT rendering.
//!
//! Every node is drawn as an HTML-like table with `shape=plain`:
//!
//! ```text
//! material   ┌───────┐              product  ┌──────┬─────────┬───┐
//!  (coral)   │ steel │   (cadet blue)        │ bike │ 12000 g │ 1 │
//!            └───────┘                       ├──────┴─────────┴───┤
//!                                            │ 0.4200 kg CO2e     │
//! supplier   ┌──────────────────┐            └────────────────────┘
//!  (white)   │ assembler 🇬🇧     │
//!            ├──────────────────┤
//!            │ welding<BR/>paint│
//!            └──────────────────┘
//! ```
//!
//! Pipe the output through `dot -Tsvg` to get an image.

use std::io::Write;

use serde::{Deserialize, Serialize};

use super::{Diagram, DiagramEdge, DiagramNode};
use crate::model::flag_emoji;
use crate::Result;

/// Presentation settings for `render_dot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotStyle {
    pub graph_name: String,
    /// A font with emoji glyphs, for flags and transport modes.
    pub font: String,
    /// Graphviz `rankdir`; `None` keeps the engine default (top to bottom).
    pub rankdir: Option<String>,
    pub material_color: String,
    pub product_color: String,
    pub supplier_color: String,
    /// Border color of suppliers flagged `high-impact`.
    pub high_impact_color: String,
}

impl Default for DotStyle {
    fn default() -> Self {
        Self {
            graph_name: "supply-chain-diagram".into(),
            font: "Segoe UI Emoji".into(),
            rankdir: None,
            material_color: "coral2".into(),
            product_color: "cadetblue2".into(),
            supplier_color: "white".into(),
            high_impact_color: "red".into(),
        }
    }
}

/// Write `diagram` as a Graphviz digraph.
pub fn render_dot(diagram: &Diagram, style: &DotStyle, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, "digraph {} {{", quote(&style.graph_name))?;
    if let Some(rankdir) = &style.rankdir {
        writeln!(writer, "    rankdir={}", quote(rankdir))?;
    }
    writeln!(writer, "    node [shape=plain fontname={}]", quote(&style.font))?;
    writeln!(writer, "    edge [fontname={}]", quote(&style.font))?;

    for node in diagram.nodes() {
        writeln!(writer, "    {} [label=<{}>]", quote(node.id()), node_label(node, style))?;
    }

    for edge in diagram.edges() {
        writeln!(writer, "    {}", edge_statement(edge))?;
    }

    writeln!(writer, "}}")?;
    Ok(())
}

fn node_label(node: &DiagramNode, style: &DotStyle) -> String {
    match node {
        DiagramNode::Material { id } => format!(
            "<TABLE ALIGN=\"CENTER\" BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" BGCOLOR=\"{}\">\
             <TR><TD><B>{}</B></TD></TR>\
             </TABLE>",
            style.material_color,
            escape_html(id),
        ),
        DiagramNode::Product { id, mass_g, quantity, emissions_kg } => format!(
            "<TABLE ALIGN=\"CENTER\" BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" BGCOLOR=\"{}\">\
             <TR><TD><B>{}</B></TD><TD>{} g</TD><TD>{}</TD></TR>\
             <TR><TD COLSPAN=\"3\">{} kg CO2e</TD></TR>\
             </TABLE>",
            style.product_color,
            escape_html(id),
            mass_g,
            quantity,
            format_emissions(*emissions_kg),
        ),
        DiagramNode::Supplier { id, country_code, processes, high_impact } => {
            let flag = country_code.as_deref().and_then(flag_emoji).unwrap_or_default();
            let processes = if processes.is_empty() {
                "N/A".to_string()
            } else {
                processes.iter().map(|p| escape_html(p)).collect::<Vec<_>>().join("<BR/>")
            };
            let border = if *high_impact {
                format!(" COLOR=\"{}\"", style.high_impact_color)
            } else {
                String::new()
            };
            format!(
                "<TABLE ALIGN=\"CENTER\" BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" BGCOLOR=\"{}\"{}>\
                 <TR><TD><B>{}</B> {}</TD></TR>\
                 <TR><TD>{}</TD></TR>\
                 </TABLE>",
                style.supplier_color,
                border,
                escape_html(id),
                flag,
                processes,
            )
        }
    }
}

fn edge_statement(edge: &DiagramEdge) -> String {
    let mut attrs = Vec::new();
    if let Some(label) = &edge.label {
        attrs.push(format!("label={}", quote(&label.to_string())));
    }
    if !edge.arrowhead {
        attrs.push("arrowhead=none".to_string());
    }

    if attrs.is_empty() {
        format!("{} -> {}", quote(&edge.from), quote(&edge.to))
    } else {
        format!("{} -> {} [{}]", quote(&edge.from), quote(&edge.to), attrs.join(" "))
    }
}

/// Four decimal places; nonzero values below 0.0001 switch to scientific
/// notation with four significant digits.
fn format_emissions(kg: f64) -> String {
    if kg != 0.0 && kg.abs() < 1e-4 {
        format!("{kg:.3e}")
    } else {
        format!("{kg:.4}")
    }
}

/// DOT double-quoted identifier.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{DiagramSink, EdgeLabel};
    use crate::emissions::TransportMode;

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("R&D <lab>"), "R&amp;D &lt;lab&gt;");
    }

    #[test]
    fn test_edge_statement() {
        let edge = DiagramEdge::plain("wheel", "assembler").with_label(EdgeLabel {
            distance_km: 930.4,
            mode: TransportMode::Air,
        });
        assert_eq!(edge_statement(&edge), "\"wheel\" -> \"assembler\" [label=\"930 km (✈)\"]");

        let edge = DiagramEdge::plain("assembler", "bike").with_arrowhead(false);
        assert_eq!(edge_statement(&edge), "\"assembler\" -> \"bike\" [arrowhead=none]");
    }

    #[test]
    fn test_format_emissions_keeps_small_values_visible() {
        assert_eq!(format_emissions(0.0), "0.0000");
        assert_eq!(format_emissions(0.0525), "0.0525");
        assert_eq!(format_emissions(2.5), "2.5000");
        // 10 g trucked 40 km
        assert_eq!(format_emissions(40.0 * 10.0 * 1.05e-7), "4.200e-5");
    }

    #[test]
    fn test_supplier_label_has_flag_and_placeholder() {
        let node = DiagramNode::Supplier {
            id: "mill".into(),
            country_code: Some("SE".into()),
            processes: vec![],
            high_impact: true,
        };
        let label = node_label(&node, &DotStyle::default());
        assert!(label.contains("<B>mill</B> 🇸🇪"));
        assert!(label.contains("<TD>N/A</TD>"));
        assert!(label.contains("COLOR=\"red\""));
    }

    #[test]
    fn test_render_header_and_footer() {
        let mut diagram = Diagram::new();
        diagram.emit_node(DiagramNode::Material { id: "steel".into() }).unwrap();
        let style = DotStyle { rankdir: Some("LR".into()), ..DotStyle::default() };

        let mut out = Vec::new();
        render_dot(&diagram, &style, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("digraph \"supply-chain-diagram\" {\n"));
        assert!(text.contains("    rankdir=\"LR\"\n"));
        assert!(text.contains("BGCOLOR=\"coral2\""));
        assert!(text.ends_with("}\n"));
    }
}
