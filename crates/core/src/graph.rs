use std::fmt::Write;

use quick_xml::escape::escape;
use serde::Deserialize;

use crate::layout::{ForceParams, Simulation};
use crate::types::{ElementType, GraphData};

/// Default element colors:
/// [stem, hairpin, interior_loop, multiloop, fiveprime, threeprime]
pub const DEFAULT_ELEMENT_COLORS: [&str; 6] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

/// Color for element types outside the palette
pub const FALLBACK_COLOR: &str = "#7f7f7f";

/// Options controlling the element-graph panel.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// Panel width in pixels (default: 800.0)
    pub width: f64,
    /// Panel height in pixels (default: 600.0)
    pub height: f64,
    /// Many-body strength, negative repels (default: -30.0)
    pub charge: f64,
    /// Link rest length (default: 30.0)
    pub link_distance: f64,
    /// Upper bound on layout ticks before drawing (default: 300)
    pub max_ticks: usize,
    /// Node radius before the length term (default: 5.0)
    pub base_radius: f64,
    /// Extra radius per sqrt(length) (default: 2.0)
    pub radius_per_length: f64,
    /// Per-element colors in `DEFAULT_ELEMENT_COLORS` order (default: None, uses the defaults)
    pub element_colors: Option<[String; 6]>,
    /// Link stroke color (default: "#999")
    pub link_color: String,
    /// Link stroke width (default: 1.5)
    pub link_width: f64,
    /// Node outline color (default: "#fff")
    pub node_stroke: String,
    /// Node outline width (default: 1.5)
    pub node_stroke_width: f64,
    /// Whether to draw node ids next to the circles (default: false)
    pub show_labels: bool,
    /// Label font size in pixels (default: 10.0)
    pub font_size: f64,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            charge: -30.0,
            link_distance: 30.0,
            max_ticks: 300,
            base_radius: 5.0,
            radius_per_length: 2.0,
            element_colors: None,
            link_color: "#999".into(),
            link_width: 1.5,
            node_stroke: "#fff".into(),
            node_stroke_width: 1.5,
            show_labels: false,
            font_size: 10.0,
        }
    }
}

impl GraphOptions {
    pub fn force_params(&self) -> ForceParams {
        ForceParams {
            charge: self.charge,
            link_distance: self.link_distance,
            center: (self.width / 2.0, self.height / 2.0),
        }
    }

    /// Palette lookup; never fails, unknown types get `FALLBACK_COLOR`.
    pub fn element_color(&self, element: ElementType) -> &str {
        let idx = match element {
            ElementType::Stem => 0,
            ElementType::Hairpin => 1,
            ElementType::InteriorLoop => 2,
            ElementType::Multiloop => 3,
            ElementType::FivePrime => 4,
            ElementType::ThreePrime => 5,
            ElementType::Unknown => return FALLBACK_COLOR,
        };
        match &self.element_colors {
            Some(colors) => &colors[idx],
            None => DEFAULT_ELEMENT_COLORS[idx],
        }
    }

    pub fn node_radius(&self, length: f64) -> f64 {
        self.base_radius + self.radius_per_length * length.max(0.0).sqrt()
    }
}

/// Lay out graph data and draw it as SVG.
pub fn draw(data: &GraphData, opts: &GraphOptions) -> String {
    let mut sim = Simulation::new(data, opts.force_params());
    sim.run(opts.max_ticks);
    render(&sim, opts)
}

/// Draw the current simulation state as SVG: one `<line>` per link, then
/// one `<circle>` per node on top.
pub fn render(sim: &Simulation, opts: &GraphOptions) -> String {
    let mut svg = String::with_capacity(256 + sim.nodes().len() * 160);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="rna-graph" viewBox="0 0 {:.2} {:.2}" width="100%" height="auto">"#,
        opts.width, opts.height
    );

    let nodes = sim.nodes();

    let _ = write!(
        svg,
        r#"<g class="links" stroke="{}" stroke-width="{}">"#,
        escape(opts.link_color.as_str()),
        opts.link_width
    );
    for link in sim.links() {
        let s = &nodes[link.source];
        let t = &nodes[link.target];
        let _ = write!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" />"#,
            s.x, s.y, t.x, t.y
        );
    }
    svg.push_str("</g>");

    let _ = write!(
        svg,
        r#"<g class="nodes" stroke="{}" stroke-width="{}">"#,
        escape(opts.node_stroke.as_str()),
        opts.node_stroke_width
    );
    for n in nodes {
        let id = escape(n.id.as_str());
        let kind = escape(n.kind.as_str());
        let _ = write!(
            svg,
            r#"<circle r="{:.2}" cx="{:.2}" cy="{:.2}" fill="{}" data-id="{id}" data-type="{kind}"><title>{id} ({kind}, {})</title></circle>"#,
            opts.node_radius(n.length),
            n.x,
            n.y,
            escape(opts.element_color(n.element)),
            n.length,
        );
    }
    svg.push_str("</g>");

    if opts.show_labels {
        svg.push_str(r#"<g class="labels">"#);
        for n in nodes {
            let _ = write!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{}" dominant-baseline="central">{}</text>"#,
                n.x + opts.node_radius(n.length) + 2.0,
                n.y,
                opts.font_size,
                escape(n.id.as_str())
            );
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphLink, GraphNode};

    fn sample() -> GraphData {
        serde_json::from_str(
            r#"{
              "nodes": [
                {"id": "f1", "type": "fiveprime", "length": 2},
                {"id": "s1", "type": "stem", "length": 4},
                {"id": "i1", "type": "interior_loop", "length": 3},
                {"id": "s2", "type": "stem", "length": 3},
                {"id": "h1", "type": "hairpin", "length": 5},
                {"id": "t1", "type": "threeprime", "length": 1}
              ],
              "links": [
                {"source": "f1", "target": "s1"},
                {"source": "s1", "target": "i1"},
                {"source": "i1", "target": "s2"},
                {"source": "s2", "target": "h1"},
                {"source": "s1", "target": "t1"}
              ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_element_counts() {
        let svg = draw(&sample(), &GraphOptions::default());
        assert_eq!(svg.matches("<circle").count(), 6);
        assert_eq!(svg.matches("<line").count(), 5);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_palette_colors() {
        let svg = draw(&sample(), &GraphOptions::default());
        assert!(svg.contains(r##"fill="#1f77b4" data-id="s1""##));
        assert!(svg.contains(r##"fill="#ff7f0e" data-id="h1""##));
        assert!(svg.contains(r##"fill="#2ca02c" data-id="i1""##));
        assert!(svg.contains(r##"fill="#9467bd" data-id="f1""##));
        assert!(svg.contains(r##"fill="#8c564b" data-id="t1""##));
    }

    #[test]
    fn test_unknown_type_falls_back() {
        let data = GraphData {
            nodes: vec![GraphNode {
                id: "pk".into(),
                kind: "pseudoknot".into(),
                length: 2.0,
            }],
            links: vec![],
        };
        let svg = draw(&data, &GraphOptions::default());
        assert!(svg.contains(&format!(r#"fill="{FALLBACK_COLOR}""#)));
    }

    #[test]
    fn test_custom_palette() {
        let opts = GraphOptions {
            element_colors: Some([
                "red".into(),
                "orange".into(),
                "yellow".into(),
                "green".into(),
                "blue".into(),
                "purple".into(),
            ]),
            ..GraphOptions::default()
        };
        assert_eq!(opts.element_color(ElementType::Multiloop), "green");
        assert_eq!(opts.element_color(ElementType::Unknown), FALLBACK_COLOR);
    }

    #[test]
    fn test_radius_grows_with_length() {
        let opts = GraphOptions::default();
        assert_eq!(opts.node_radius(0.0), 5.0);
        assert_eq!(opts.node_radius(4.0), 9.0);
        assert_eq!(opts.node_radius(-3.0), 5.0);
    }

    #[test]
    fn test_dangling_link_not_drawn() {
        let mut data = sample();
        data.links.push(GraphLink {
            source: "h1".into(),
            target: "missing".into(),
        });
        let svg = draw(&data, &GraphOptions::default());
        assert_eq!(svg.matches("<line").count(), 5);
    }

    #[test]
    fn test_ids_escaped() {
        let data = GraphData {
            nodes: vec![GraphNode {
                id: "<a&b>".into(),
                kind: "stem".into(),
                length: 1.0,
            }],
            links: vec![],
        };
        let opts = GraphOptions {
            show_labels: true,
            ..GraphOptions::default()
        };
        let svg = draw(&data, &opts);
        assert!(svg.contains("&lt;a&amp;b&gt;"));
        assert!(!svg.contains("<a&b>"));
    }

    #[test]
    fn test_configured_colors_escaped() {
        let data = GraphData {
            nodes: vec![GraphNode {
                id: "s0".into(),
                kind: "stem".into(),
                length: 1.0,
            }],
            links: vec![],
        };
        let quoted = r#"red" onload="x"#;
        let opts = GraphOptions {
            link_color: quoted.into(),
            node_stroke: "<b>".into(),
            element_colors: Some([
                quoted.to_string(),
                "b".into(),
                "c".into(),
                "d".into(),
                "e".into(),
                "f".into(),
            ]),
            ..GraphOptions::default()
        };
        let svg = draw(&data, &opts);
        assert!(svg.contains(r#"<g class="links" stroke="red&quot; onload=&quot;x""#));
        assert!(svg.contains(r#"<g class="nodes" stroke="&lt;b&gt;""#));
        assert!(svg.contains(r#"fill="red&quot; onload=&quot;x""#));
        assert!(!svg.contains(r#"onload="x""#));
    }
}
