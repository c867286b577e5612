use serde_json::Value;

use crate::config::{ControllerConfig, Presence};
use crate::error::PredictError;
use crate::types::*;

/// Check a parsed response body against the display contract.
///
/// Requires `sequence`, `structure`, `mfe` and at least one visualization
/// field among the enabled strategies. Nothing is partially accepted.
pub fn validate(body: &Value, config: &ControllerConfig) -> Result<PredictionResponse, PredictError> {
    if !body.is_object() {
        return Err(PredictError::IncompleteData(
            "response is not a JSON object".into(),
        ));
    }
    let presence = config.presence;

    let sequence = present(body, "sequence", presence);
    let structure = present(body, "structure", presence);
    let mfe = present(body, "mfe", presence);

    let missing: Vec<&str> = [("sequence", sequence), ("structure", structure), ("mfe", mfe)]
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect();
    if !missing.is_empty() {
        return Err(PredictError::IncompleteData(format!(
            "missing {}",
            missing.join(", ")
        )));
    }

    let sequence = as_text(sequence, "sequence")?;
    let structure = as_text(structure, "structure")?;
    let mfe = match mfe {
        Some(Value::Number(n)) => Mfe::Number(n.clone()),
        Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => Mfe::Text(s.clone()),
        _ => {
            return Err(PredictError::IncompleteData(
                "mfe must be a number or numeric string".into(),
            ))
        }
    };

    let visualization = resolve_visualization(body, config)?;

    Ok(PredictionResponse {
        sequence,
        structure,
        mfe,
        visualization,
    })
}

/// Pick the display variant once. Raster wins the primary panel; a graph
/// alongside it goes to the secondary panel; SVG is used only on its own.
fn resolve_visualization(
    body: &Value,
    config: &ControllerConfig,
) -> Result<Visualization, PredictError> {
    let presence = config.presence;

    let plot = if config.accepts(Strategy::Raster) {
        present(body, "plot", presence)
            .map(|v| as_text(Some(v), "plot"))
            .transpose()?
    } else {
        None
    };

    let graph = if config.accepts(Strategy::Graph) {
        present(body, "graph_data", presence)
            .map(|v| {
                serde_json::from_value::<GraphData>(v.clone()).map_err(|e| {
                    PredictError::IncompleteData(format!("graph_data is malformed: {e}"))
                })
            })
            .transpose()?
    } else {
        None
    };

    let svg = if config.accepts(Strategy::Svg) {
        present(body, "svg", presence)
            .map(|v| as_text(Some(v), "svg"))
            .transpose()?
    } else {
        None
    };

    match (plot, graph, svg) {
        (Some(plot), Some(graph), _) => Ok(Visualization::RasterWithGraph { plot, graph }),
        (Some(plot), None, _) => Ok(Visualization::Raster(plot)),
        (None, Some(graph), _) => Ok(Visualization::Graph(graph)),
        (None, None, Some(svg)) => Ok(Visualization::Svg(svg)),
        (None, None, None) => {
            let expected: Vec<&str> = config
                .strategies
                .iter()
                .map(|s| match s {
                    Strategy::Svg => "svg",
                    Strategy::Raster => "plot",
                    Strategy::Graph => "graph_data",
                })
                .collect();
            Err(PredictError::IncompleteData(format!(
                "missing visualization (expected one of: {})",
                expected.join(", ")
            )))
        }
    }
}

fn present<'a>(body: &'a Value, key: &str, presence: Presence) -> Option<&'a Value> {
    let v = body.get(key)?;
    let ok = match presence {
        Presence::Strict => match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        },
        Presence::Truthy => is_truthy(v),
    };
    ok.then_some(v)
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_text(v: Option<&Value>, key: &str) -> Result<String, PredictError> {
    match v {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(PredictError::IncompleteData(format!("{key} must be a string"))),
    }
}
