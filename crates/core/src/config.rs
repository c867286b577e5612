use std::time::Duration;

use serde::Deserialize;

use crate::graph::GraphOptions;
use crate::types::Strategy;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/predict";

/// How `validate` decides that a field is present.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Key exists and is not null; strings must be non-empty. An MFE of 0 passes.
    #[default]
    Strict,
    /// Falsy check: `""`, `0`, `false` and `null` all count as missing.
    Truthy,
}

/// What to do with a visualization payload that cannot be used.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderErrorPolicy {
    /// Log a warning and show the results without (or with the raw) visualization.
    #[default]
    Degrade,
    /// Treat it like any other error and show the banner.
    Banner,
}

/// Controller configuration.
///
/// Deserialized with `#[serde(default)]`, so any omitted field keeps its default.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Prediction endpoint (default: `http://localhost:5000/predict`)
    pub endpoint: String,
    /// Request timeout in seconds (default: none, rely on the transport)
    pub timeout_secs: Option<u64>,
    pub presence: Presence,
    pub render_errors: RenderErrorPolicy,
    /// Display strategies accepted from the server (default: all three)
    pub strategies: Vec<Strategy>,
    pub graph: GraphOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_secs: None,
            presence: Presence::Strict,
            render_errors: RenderErrorPolicy::Degrade,
            strategies: vec![Strategy::Svg, Strategy::Raster, Strategy::Graph],
            graph: GraphOptions::default(),
        }
    }
}

impl ControllerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn accepts(&self, strategy: Strategy) -> bool {
        self.strategies.contains(&strategy)
    }
}
