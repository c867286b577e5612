//! The `POST /predict` contract.
//!
//! [`parse_reply`] classifies a raw status/body pair and is usable from any
//! host (a browser binding does its own fetch). With the `http` feature,
//! [`HttpPredictionService`] performs the request with `reqwest`.

use serde_json::Value;

use crate::error::PredictError;

/// Classify a completed HTTP exchange.
///
/// Any non-2xx status is an error regardless of the body; a 2xx body must
/// be JSON. Field completeness is checked later by `validate`.
pub fn parse_reply(status: u16, body: &str) -> Result<Value, PredictError> {
    if !(200..300).contains(&status) {
        return Err(PredictError::HttpStatus { status });
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(feature = "http")]
pub use http::{HttpPredictionService, PredictionService};

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use serde_json::Value;
    use tracing::debug;

    use super::parse_reply;
    use crate::config::ControllerConfig;
    use crate::error::PredictError;
    use crate::types::PredictionRequest;

    /// Anything that can answer a prediction request with a JSON body.
    #[async_trait]
    pub trait PredictionService: Send + Sync {
        async fn submit(&self, request: &PredictionRequest) -> Result<Value, PredictError>;
    }

    /// Form-encoded `POST` to a prediction endpoint.
    pub struct HttpPredictionService {
        client: Client,
        endpoint: String,
    }

    impl HttpPredictionService {
        /// `timeout: None` waits as long as the transport does.
        pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, PredictError> {
            let mut builder = Client::builder();
            if let Some(t) = timeout {
                builder = builder.timeout(t);
            }
            Ok(Self {
                client: builder.build()?,
                endpoint: endpoint.into(),
            })
        }

        pub fn from_config(config: &ControllerConfig) -> Result<Self, PredictError> {
            Self::new(config.endpoint.clone(), config.timeout())
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    #[async_trait]
    impl PredictionService for HttpPredictionService {
        async fn submit(&self, request: &PredictionRequest) -> Result<Value, PredictError> {
            debug!(endpoint = %self.endpoint, fields = request.fields.len(), "submitting prediction");

            let response = self
                .client
                .post(&self.endpoint)
                .form(&request.fields)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(PredictError::HttpStatus {
                    status: status.as_u16(),
                });
            }

            let body = response.text().await?;
            parse_reply(status.as_u16(), &body)
        }
    }
}
