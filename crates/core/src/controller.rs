//! Lifecycle of one prediction: `Idle → Loading → Success | Error`.
//!
//! The controller never touches a page directly; it drives the injected
//! [`UiSurface`]. Every transition shows exactly one of the loading, results
//! and error regions.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::parse_reply;
use crate::config::{ControllerConfig, RenderErrorPolicy};
use crate::download::{self, DownloadFile, DownloadHost};
use crate::error::{DownloadError, PredictError};
use crate::graph;
use crate::svg::{self, DOWNLOAD_FILE_NAME, SVG_MIME};
use crate::types::*;
use crate::ui::{Panel, Region, TextField, UiState, UiSurface};
use crate::validate::validate;

/// Identifies one submit. Only the newest ticket may settle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn from_id(id: u64) -> Self {
        Ticket(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What `begin_submit` hands back: the ticket and the form snapshot to send.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub request: PredictionRequest,
}

/// Result of settling a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    Applied(UiState),
    /// A newer submit superseded this one; the UI was left alone.
    Stale,
}

pub struct PredictionController<S: UiSurface> {
    surface: S,
    config: ControllerConfig,
    state: UiState,
    latest: u64,
    /// Markup of the SVG currently in the primary panel, if that is the
    /// active strategy.
    displayed_svg: Option<String>,
    current: Option<PredictionResponse>,
}

impl<S: UiSurface> PredictionController<S> {
    pub fn new(surface: S, config: ControllerConfig) -> Self {
        Self {
            surface,
            config,
            state: UiState::Idle,
            latest: 0,
            displayed_svg: None,
            current: None,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The response currently on display, if the last settle succeeded.
    pub fn response(&self) -> Option<&PredictionResponse> {
        self.current.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Enter `Loading` and snapshot the request. Must run before the
    /// network call is issued. Any earlier ticket becomes stale.
    pub fn begin_submit(&mut self, request: PredictionRequest) -> PendingRequest {
        self.latest += 1;
        self.displayed_svg = None;
        self.current = None;
        self.state = UiState::Loading;
        self.show_only(Region::Loading);
        debug!(ticket = self.latest, sequence = ?request.sequence(), "prediction submitted");
        PendingRequest {
            ticket: Ticket(self.latest),
            request,
        }
    }

    /// Apply the outcome of the request behind `ticket`.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<Value, PredictError>) -> Settled {
        if ticket.0 != self.latest {
            debug!(ticket = ticket.0, latest = self.latest, "ignoring stale response");
            return Settled::Stale;
        }
        let state = match outcome.and_then(|body| validate(&body, &self.config)) {
            Ok(response) => self.render(&response),
            Err(e) => self.show_error(&e),
        };
        Settled::Applied(state)
    }

    /// Settle from a raw status and body, for hosts that fetch themselves.
    pub fn settle_reply(&mut self, ticket: Ticket, status: u16, body: &str) -> Settled {
        self.settle(ticket, parse_reply(status, body))
    }

    /// Show a validated response and enter `Success`.
    ///
    /// An unusable visualization follows the configured render-error
    /// policy: degrade (warn, still succeed) or banner (enter `Error`).
    pub fn render(&mut self, response: &PredictionResponse) -> UiState {
        let (primary, secondary, displayed_svg) = match &response.visualization {
            Visualization::Svg(b64) => match self.svg_panel(b64) {
                Ok((markup, sized)) => {
                    let displayed = sized.then(|| markup.clone());
                    (Some(markup), None, displayed)
                }
                Err(e) => return self.show_error(&e),
            },
            Visualization::Raster(plot) => (Some(svg::raster_img(plot)), None, None),
            Visualization::Graph(data) => (None, Some(graph::draw(data, &self.config.graph)), None),
            Visualization::RasterWithGraph { plot, graph: data } => (
                Some(svg::raster_img(plot)),
                Some(graph::draw(data, &self.config.graph)),
                None,
            ),
        };

        self.surface.set_text(TextField::Sequence, &response.sequence);
        self.surface.set_text(TextField::Structure, &response.structure);
        self.surface.set_text(TextField::Mfe, &response.mfe.to_string());
        self.surface.set_panel(Panel::Primary, primary.as_deref());
        self.surface.set_panel(Panel::Secondary, secondary.as_deref());
        self.displayed_svg = displayed_svg;
        self.current = Some(response.clone());

        self.state = UiState::Success;
        self.show_only(Region::Results);
        info!(
            strategy = ?response.visualization.strategy(),
            length = response.sequence.len(),
            mfe = %response.mfe,
            "prediction displayed"
        );
        self.state
    }

    /// Enter `Error` with the templated banner message.
    pub fn show_error(&mut self, error: &PredictError) -> UiState {
        warn!(%error, "prediction failed");
        self.displayed_svg = None;
        self.current = None;
        self.surface.set_error_message(&format!(
            "An error occurred while predicting the structure: {error}"
        ));
        self.state = UiState::Error;
        self.show_only(Region::Error);
        self.state
    }

    /// Markup of the displayed SVG, serialized from its root element.
    pub fn current_svg(&self) -> Result<String, DownloadError> {
        let markup = self.displayed_svg.as_deref().ok_or(DownloadError::NoSvg)?;
        svg::serialize_root(markup).map_err(|e| DownloadError::Serialize(e.to_string()))
    }

    /// Save the displayed SVG as `rna_structure.svg` through the host.
    pub fn download_current_visualization<H: DownloadHost>(
        &self,
        host: &mut H,
    ) -> Result<(), DownloadError> {
        let markup = self.current_svg()?;
        let file = DownloadFile {
            file_name: DOWNLOAD_FILE_NAME.into(),
            mime: SVG_MIME.into(),
            bytes: markup.into_bytes(),
        };
        download::save(host, &file)
    }

    /// Decode and size the SVG payload. `Ok((markup, true))` when the root
    /// was found and sized; `Ok((raw, false))` for a degraded render.
    fn svg_panel(&self, b64: &str) -> Result<(String, bool), PredictError> {
        let degrade = self.config.render_errors == RenderErrorPolicy::Degrade;
        let markup = match svg::decode_svg(b64) {
            Ok(m) => m,
            Err(e) if degrade => {
                warn!(error = %e, "SVG payload unusable, showing results without it");
                return Ok((String::new(), false));
            }
            Err(e) => return Err(e),
        };
        match svg::make_responsive(&markup) {
            Ok(sized) => Ok((sized, true)),
            Err(e) if degrade => {
                warn!(error = %e, "SVG markup could not be sized, injecting it as is");
                Ok((markup, false))
            }
            Err(e) => Err(e),
        }
    }

    fn show_only(&mut self, region: Region) {
        for r in [Region::Loading, Region::Results, Region::Error] {
            self.surface.set_visible(r, r == region);
        }
    }
}

#[cfg(feature = "http")]
impl<S: UiSurface> PredictionController<S> {
    /// Full cycle against a service: enter `Loading`, await the one network
    /// call, then settle.
    pub async fn submit<P>(&mut self, service: &P, request: PredictionRequest) -> Settled
    where
        P: crate::client::PredictionService + ?Sized,
    {
        let pending = self.begin_submit(request);
        let outcome = service.submit(&pending.request).await;
        self.settle(pending.ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::ViewState;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;

    fn controller() -> PredictionController<ViewState> {
        PredictionController::new(ViewState::default(), ControllerConfig::default())
    }

    #[test]
    fn test_begin_submit_shows_only_loading() {
        let mut c = controller();
        assert_eq!(c.state(), UiState::Idle);
        assert!(c.surface().visible_regions().is_empty());
        let pending = c.begin_submit(PredictionRequest::new("GCGC"));
        assert_eq!(pending.request.sequence(), Some("GCGC"));
        assert_eq!(c.state(), UiState::Loading);
        assert_eq!(c.surface().visible_regions(), vec![Region::Loading]);
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let mut c = controller();
        let first = c.begin_submit(PredictionRequest::new("GCGC"));
        let second = c.begin_submit(PredictionRequest::new("GGGAAACCC"));
        let svg = STANDARD.encode("<svg/>");
        let body = json!({"sequence": "GCGC", "structure": "(())", "mfe": -1.2, "svg": svg});
        assert_eq!(c.settle(first.ticket, Ok(body)), Settled::Stale);
        assert_eq!(c.state(), UiState::Loading);
        assert_eq!(c.surface().sequence, "");

        let settled = c.settle(second.ticket, Err(PredictError::HttpStatus { status: 503 }));
        assert_eq!(settled, Settled::Applied(UiState::Error));
    }

    #[test]
    fn test_degraded_svg_still_succeeds() {
        let mut c = controller();
        let p = c.begin_submit(PredictionRequest::new("GCGC"));
        let body = json!({
            "sequence": "GCGC", "structure": "(())", "mfe": -1.2,
            "svg": STANDARD.encode("not svg at all")
        });
        assert_eq!(c.settle(p.ticket, Ok(body)), Settled::Applied(UiState::Success));
        assert_eq!(c.surface().primary.as_deref(), Some("not svg at all"));
        assert_eq!(c.surface().visible_regions(), vec![Region::Results]);
        assert_eq!(c.current_svg(), Err(DownloadError::NoSvg));
    }

    #[test]
    fn test_truncated_svg_is_not_offered_for_download() {
        let truncated = r#"<svg width="10"><g><circle r="1"/>"#;
        let mut c = controller();
        let p = c.begin_submit(PredictionRequest::new("GCGC"));
        let body = json!({
            "sequence": "GCGC", "structure": "(())", "mfe": -1.2,
            "svg": STANDARD.encode(truncated)
        });
        assert_eq!(c.settle(p.ticket, Ok(body.clone())), Settled::Applied(UiState::Success));
        assert_eq!(c.surface().primary.as_deref(), Some(truncated));
        assert_eq!(c.current_svg(), Err(DownloadError::NoSvg));

        let config = ControllerConfig {
            render_errors: RenderErrorPolicy::Banner,
            ..ControllerConfig::default()
        };
        let mut c = PredictionController::new(ViewState::default(), config);
        let p = c.begin_submit(PredictionRequest::new("GCGC"));
        assert_eq!(c.settle(p.ticket, Ok(body)), Settled::Applied(UiState::Error));
        assert!(c.surface().error_message.contains("unclosed elements"));
    }

    #[test]
    fn test_banner_policy_for_render_errors() {
        let config = ControllerConfig {
            render_errors: RenderErrorPolicy::Banner,
            ..ControllerConfig::default()
        };
        let mut c = PredictionController::new(ViewState::default(), config);
        let p = c.begin_submit(PredictionRequest::new("GCGC"));
        let body = json!({
            "sequence": "GCGC", "structure": "(())", "mfe": -1.2,
            "svg": STANDARD.encode("not svg at all")
        });
        assert_eq!(c.settle(p.ticket, Ok(body)), Settled::Applied(UiState::Error));
        assert!(c.surface().error_message.contains("no <svg> root element"));
        assert!(!c.surface().results_visible);
    }

    #[test]
    fn test_error_message_template() {
        let mut c = controller();
        let p = c.begin_submit(PredictionRequest::new("GCGC"));
        c.settle(p.ticket, Err(PredictError::Transport("connection refused".into())));
        assert_eq!(
            c.surface().error_message,
            "An error occurred while predicting the structure: network request failed: connection refused"
        );
        assert_eq!(c.surface().visible_regions(), vec![Region::Error]);
    }

    #[test]
    fn test_download_unavailable_for_raster() {
        let mut c = controller();
        let p = c.begin_submit(PredictionRequest::new("GCGC"));
        let body = json!({"sequence": "GCGC", "structure": "(())", "mfe": -1.2, "plot": "iVBORw0KGgo="});
        c.settle(p.ticket, Ok(body));
        assert_eq!(c.state(), UiState::Success);
        assert_eq!(c.current_svg(), Err(DownloadError::NoSvg));
    }
}
