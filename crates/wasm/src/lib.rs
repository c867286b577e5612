use rnaview_core::graph::{self, GraphOptions};
use rnaview_core::layout::Simulation;
use rnaview_core::{
    ControllerConfig, GraphData, PredictError, PredictionController, PredictionRequest, Settled,
    Ticket, UiState, ViewState,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Decode a base64 SVG payload and size its root for inline display.
/// Returns an empty string when the payload is unusable.
#[wasm_bindgen]
pub fn prepare_svg(b64: &str) -> String {
    rnaview_core::svg::prepare(b64).unwrap_or_default()
}

fn form_request(fields_json: &str) -> Result<PredictionRequest, String> {
    let fields: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(fields_json).map_err(|e| format!("form fields: {e}"))?;
    Ok(PredictionRequest::from_fields(fields.into_iter().filter_map(
        |(name, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((name, s)),
            other => Some((name, other.to_string())),
        },
    )))
}

#[derive(Serialize)]
struct Snapshot<'a> {
    state: UiState,
    stale: bool,
    view: &'a ViewState,
}

/// Prediction form controller for a browser page.
///
/// The page calls `preventDefault()` on submit, then `begin_submit`, does
/// the `fetch` itself and hands the status and body to `settle` (or the
/// failure message to `fail`). Each call returns the view state as JSON for
/// the page to apply to its regions.
#[wasm_bindgen]
pub struct PredictionView {
    controller: PredictionController<ViewState>,
}

#[wasm_bindgen]
impl PredictionView {
    /// `config_json` is parsed as `ControllerConfig` with `#[serde(default)]`;
    /// malformed JSON falls back to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> PredictionView {
        let config = ControllerConfig::from_json(config_json).unwrap_or_default();
        PredictionView {
            controller: PredictionController::new(ViewState::default(), config),
        }
    }

    pub fn endpoint(&self) -> String {
        self.controller.config().endpoint.clone()
    }

    /// Enter loading and return the request id to settle later.
    ///
    /// `fields_json` is the form as a JSON object of field name to value,
    /// e.g. `{"sequence": "GGGAAACCC", "temperature": 37}`. Non-string values
    /// are sent in their JSON text form; `null` fields are left out.
    pub fn begin_submit(&mut self, fields_json: &str) -> Result<u32, JsValue> {
        let request = form_request(fields_json).map_err(|e| JsValue::from_str(&e))?;
        let pending = self.controller.begin_submit(request);
        u32::try_from(pending.ticket.id())
            .map_err(|_| JsValue::from_str("request id out of range"))
    }

    pub fn settle(&mut self, id: u32, status: u16, body: &str) -> String {
        let settled = self
            .controller
            .settle_reply(Ticket::from_id(u64::from(id)), status, body);
        self.snapshot(settled == Settled::Stale)
    }

    /// Report a fetch that never completed.
    pub fn fail(&mut self, id: u32, message: &str) -> String {
        let settled = self.controller.settle(
            Ticket::from_id(u64::from(id)),
            Err(PredictError::Transport(message.to_string())),
        );
        self.snapshot(settled == Settled::Stale)
    }

    pub fn view(&self) -> String {
        self.snapshot(false)
    }

    /// Markup of the displayed SVG for the page to save as
    /// `rna_structure.svg`, if the SVG strategy is active.
    pub fn download_svg(&self) -> Option<String> {
        self.controller.current_svg().ok()
    }

    fn snapshot(&self, stale: bool) -> String {
        serde_json::to_string(&Snapshot {
            state: self.controller.state(),
            stale,
            view: self.controller.surface(),
        })
        .unwrap_or_default()
    }
}

/// Interactive element graph: drive ticks from `requestAnimationFrame` and
/// forward pointer events as drag calls.
#[wasm_bindgen]
pub struct GraphView {
    sim: Simulation,
    opts: GraphOptions,
}

#[wasm_bindgen]
impl GraphView {
    #[wasm_bindgen(constructor)]
    pub fn new(graph_json: &str, opts_json: &str) -> Result<GraphView, JsValue> {
        let data: GraphData =
            serde_json::from_str(graph_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let opts: GraphOptions = serde_json::from_str(opts_json).unwrap_or_default();
        Ok(GraphView {
            sim: Simulation::new(&data, opts.force_params()),
            opts,
        })
    }

    /// Advance up to `n` ticks. Returns true once the layout has cooled.
    pub fn tick(&mut self, n: u32) -> bool {
        for _ in 0..n {
            if self.sim.is_settled() {
                break;
            }
            self.sim.tick();
        }
        self.sim.is_settled()
    }

    pub fn settle(&mut self) {
        self.sim.run(self.opts.max_ticks);
    }

    /// Current simulation heat, for progress display.
    pub fn alpha(&self) -> f64 {
        self.sim.alpha()
    }

    pub fn drag_start(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.sim.drag_start(id, x, y)
    }

    pub fn drag(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.sim.drag(id, x, y)
    }

    pub fn drag_end(&mut self, id: &str) -> bool {
        self.sim.drag_end(id)
    }

    pub fn svg(&self) -> String {
        graph::render(&self.sim, &self.opts)
    }

    /// Node positions as JSON: `[{id, type, length, x, y, vx, vy, fx, fy}]`.
    pub fn positions(&self) -> String {
        serde_json::to_string(self.sim.nodes()).unwrap_or_default()
    }
}
