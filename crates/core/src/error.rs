use thiserror::Error;

/// Everything that can go wrong between pressing submit and showing a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// The request never completed (DNS, connection refused, timeout).
    #[error("network request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status. The body is ignored.
    #[error("server responded with status {status}")]
    HttpStatus { status: u16 },

    /// A 2xx answer whose body is not JSON.
    #[error("invalid JSON in response: {0}")]
    Parse(String),

    /// Well-formed JSON that lacks fields the display needs.
    #[error("incomplete data received from server: {0}")]
    IncompleteData(String),

    /// A visualization payload was present but could not be used.
    #[error("could not render visualization: {0}")]
    Render(String),
}

impl From<serde_json::Error> for PredictError {
    fn from(e: serde_json::Error) -> Self {
        PredictError::Parse(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for PredictError {
    fn from(e: reqwest::Error) -> Self {
        PredictError::Transport(e.to_string())
    }
}

/// Failures of the SVG download path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DownloadError {
    #[error("no SVG visualization is currently displayed")]
    NoSvg,

    #[error("could not serialize displayed SVG: {0}")]
    Serialize(String),

    #[error("download host failed: {0}")]
    Host(String),
}
