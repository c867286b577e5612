use serde::Serialize;

/// The three mutually exclusive regions of the prediction page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Loading,
    Results,
    Error,
}

/// Text fields inside the results region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    Sequence,
    Structure,
    Mfe,
}

/// Visualization panels inside the results region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    /// SVG or raster drawing
    Primary,
    /// Element graph
    Secondary,
}

/// Controller lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Handles to the host page's UI regions, injected into the controller.
///
/// A browser host maps these to DOM elements; the CLI and tests use
/// [`ViewState`].
pub trait UiSurface {
    fn set_visible(&mut self, region: Region, visible: bool);
    fn set_text(&mut self, field: TextField, text: &str);
    /// Replace the panel content. `None` clears it.
    fn set_panel(&mut self, panel: Panel, markup: Option<&str>);
    fn set_error_message(&mut self, message: &str);
}

/// In-memory UI surface. Serializes to the JSON handed to browser hosts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub loading_visible: bool,
    pub results_visible: bool,
    pub error_visible: bool,
    pub sequence: String,
    pub structure: String,
    pub mfe: String,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub error_message: String,
}

impl ViewState {
    /// Regions currently shown.
    pub fn visible_regions(&self) -> Vec<Region> {
        let mut out = Vec::with_capacity(1);
        if self.loading_visible {
            out.push(Region::Loading);
        }
        if self.results_visible {
            out.push(Region::Results);
        }
        if self.error_visible {
            out.push(Region::Error);
        }
        out
    }
}

impl UiSurface for ViewState {
    fn set_visible(&mut self, region: Region, visible: bool) {
        match region {
            Region::Loading => self.loading_visible = visible,
            Region::Results => self.results_visible = visible,
            Region::Error => self.error_visible = visible,
        }
    }

    fn set_text(&mut self, field: TextField, text: &str) {
        let slot = match field {
            TextField::Sequence => &mut self.sequence,
            TextField::Structure => &mut self.structure,
            TextField::Mfe => &mut self.mfe,
        };
        text.clone_into(slot);
    }

    fn set_panel(&mut self, panel: Panel, markup: Option<&str>) {
        let slot = match panel {
            Panel::Primary => &mut self.primary,
            Panel::Secondary => &mut self.secondary,
        };
        *slot = markup.map(str::to_owned);
    }

    fn set_error_message(&mut self, message: &str) {
        message.clone_into(&mut self.error_message);
    }
}

impl<S: UiSurface + ?Sized> UiSurface for &mut S {
    fn set_visible(&mut self, region: Region, visible: bool) {
        (**self).set_visible(region, visible)
    }

    fn set_text(&mut self, field: TextField, text: &str) {
        (**self).set_text(field, text)
    }

    fn set_panel(&mut self, panel: Panel, markup: Option<&str>) {
        (**self).set_panel(panel, markup)
    }

    fn set_error_message(&mut self, message: &str) {
        (**self).set_error_message(message)
    }
}
