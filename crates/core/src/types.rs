use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Point-in-time read of the form fields, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub fields: Vec<(String, String)>,
}

impl PredictionRequest {
    /// Request carrying only a `sequence` field.
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            fields: vec![("sequence".to_string(), sequence.into())],
        }
    }

    /// Snapshot arbitrary form fields.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn sequence(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == "sequence")
            .map(|(_, v)| v.as_str())
    }
}

/// Minimum free energy as the server sent it. Shown verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Mfe {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Mfe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mfe::Number(n) => write!(f, "{n}"),
            Mfe::Text(s) => f.write_str(s),
        }
    }
}

/// Structural element classification used to color graph nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Stem,
    Hairpin,
    InteriorLoop,
    Multiloop,
    FivePrime,
    ThreePrime,
    /// Anything the palette does not know about.
    Unknown,
}

impl ElementType {
    pub fn parse(s: &str) -> Self {
        match s {
            "stem" => ElementType::Stem,
            "hairpin" => ElementType::Hairpin,
            "interior_loop" => ElementType::InteriorLoop,
            "multiloop" => ElementType::Multiloop,
            "fiveprime" => ElementType::FivePrime,
            "threeprime" => ElementType::ThreePrime,
            _ => ElementType::Unknown,
        }
    }
}

/// Graph node. `id` may arrive as a string or a number
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GraphNode {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub length: f64,
}

impl GraphNode {
    pub fn element(&self) -> ElementType {
        ElementType::parse(&self.kind)
    }
}

/// Link between two node ids
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GraphLink {
    #[serde(deserialize_with = "id_string")]
    pub source: String,
    #[serde(deserialize_with = "id_string")]
    pub target: String,
}

/// Element graph description returned in `graph_data`
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Visualization payload, resolved once from the response.
#[derive(Clone, Debug, PartialEq)]
pub enum Visualization {
    /// Base64-encoded SVG markup
    Svg(String),
    /// Base64-encoded raster image
    Raster(String),
    Graph(GraphData),
    RasterWithGraph { plot: String, graph: GraphData },
}

impl Visualization {
    pub fn strategy(&self) -> Strategy {
        match self {
            Visualization::Svg(_) => Strategy::Svg,
            Visualization::Raster(_) | Visualization::RasterWithGraph { .. } => Strategy::Raster,
            Visualization::Graph(_) => Strategy::Graph,
        }
    }
}

/// Display strategies a host can enable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Svg,
    Raster,
    Graph,
}

/// A complete, validated prediction
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub sequence: String,
    pub structure: String,
    pub mfe: Mfe,
    pub visualization: Visualization,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(d)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
