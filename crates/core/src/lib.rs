//! Client core for an RNA secondary-structure prediction service.
//!
//! Submits a sequence to `POST /predict`, validates the JSON reply and
//! renders sequence, dot-bracket structure, MFE and one visualization
//! (inline SVG, raster plot, force-directed element graph) onto a host
//! supplied [`UiSurface`].

pub mod client;
pub mod config;
pub mod controller;
pub mod download;
mod error;
pub mod graph;
pub mod layout;
pub mod svg;
mod types;
pub mod ui;
mod validate;

pub use client::parse_reply;
#[cfg(feature = "http")]
pub use client::{HttpPredictionService, PredictionService};
pub use config::{ControllerConfig, Presence, RenderErrorPolicy};
pub use controller::{PendingRequest, PredictionController, Settled, Ticket};
pub use download::{DownloadFile, DownloadHost};
pub use error::{DownloadError, PredictError};
pub use types::*;
pub use ui::{Panel, Region, TextField, UiState, UiSurface, ViewState};
pub use validate::validate;
