//! The external correction service seam.
//!
//! The pipeline talks to a [`CorrectionService`]; embedders plug in an
//! on-device model, the HTTP client below, or a closure via [`FnService`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::correction::span::CorrectionSpan;

/// What the service returned for one text block. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofreadResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrections: Option<Vec<CorrectionSpan>>,
}

impl ProofreadResult {
    pub fn corrected(text: impl Into<String>) -> Self {
        Self {
            corrected_text: Some(text.into()),
            corrections: None,
        }
    }

    pub fn spans(spans: Vec<CorrectionSpan>) -> Self {
        Self {
            corrected_text: None,
            corrections: Some(spans),
        }
    }

    pub fn with_spans(mut self, spans: Vec<CorrectionSpan>) -> Self {
        self.corrections = Some(spans);
        self
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("correction service rejected the request: {0}")]
    Rejected(String),
    #[error("correction service returned malformed data: {0}")]
    Malformed(String),
    #[error("correction service unreachable: {0}")]
    Transport(String),
}

/// Proofreads one block of text.
///
/// Calls are sequential; implementations may hold per-session state.
pub trait CorrectionService {
    fn proofread(&mut self, text: &str) -> Result<ProofreadResult, ServiceError>;
}

/// Adapter turning a closure into a [`CorrectionService`].
pub struct FnService<F>(pub F);

impl<F> FnService<F>
where
    F: FnMut(&str) -> Result<ProofreadResult, ServiceError>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> CorrectionService for FnService<F>
where
    F: FnMut(&str) -> Result<ProofreadResult, ServiceError>,
{
    fn proofread(&mut self, text: &str) -> Result<ProofreadResult, ServiceError> {
        (self.0)(text)
    }
}

#[cfg(feature = "http")]
pub use http::HttpCorrectionService;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use log::debug;
    use serde::Serialize;

    use super::{CorrectionService, ProofreadResult, ServiceError};
    use crate::config::ServiceConfig;

    #[derive(Serialize)]
    struct ProofreadRequest<'a> {
        text: &'a str,
    }

    /// Blocking JSON client: POST `{"text": ...}`, expect a [`ProofreadResult`] body.
    pub struct HttpCorrectionService {
        client: reqwest::blocking::Client,
        endpoint: String,
    }

    impl HttpCorrectionService {
        pub fn new(endpoint: &str, config: &ServiceConfig) -> Result<Self, ServiceError> {
            let endpoint = url::Url::parse(endpoint)
                .map_err(|e| ServiceError::Transport(format!("invalid endpoint: {e}")))?;
            let client = reqwest::blocking::Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| ServiceError::Transport(format!("client error: {e}")))?;
            Ok(Self {
                client,
                endpoint: endpoint.to_string(),
            })
        }
    }

    impl CorrectionService for HttpCorrectionService {
        fn proofread(&mut self, text: &str) -> Result<ProofreadResult, ServiceError> {
            debug!("POST {} ({} bytes)", self.endpoint, text.len());
            let response = self
                .client
                .post(&self.endpoint)
                .json(&ProofreadRequest { text })
                .send()
                .map_err(|e| ServiceError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(ServiceError::Rejected(format!("HTTP {status}: {body}")));
            }

            let body = response
                .text()
                .map_err(|e| ServiceError::Transport(e.to_string()))?;
            serde_json::from_str(&body).map_err(|e| ServiceError::Malformed(e.to_string()))
        }
    }
}
