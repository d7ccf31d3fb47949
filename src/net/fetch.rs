use std::time::Duration;

use log::debug;
use thiserror::Error;
use url::Url;

use crate::config::ServiceConfig;

/// Result of fetching a URL
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub html: String,
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub content_type: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Prefix scheme-less input with `https://`.
pub fn normalize_url(input: &str) -> Result<Url, FetchError> {
    let trimmed = input.trim();
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    Url::parse(&candidate).map_err(|source| FetchError::InvalidUrl {
        url: input.to_string(),
        source,
    })
}

/// Fetch a page's HTML (blocking).
pub fn fetch_url(url: &str, config: &ServiceConfig) -> Result<FetchResult, FetchError> {
    let parsed = normalize_url(url)?;

    let client = reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(FetchError::Client)?;

    debug!("GET {parsed}");
    let response = client
        .get(parsed.as_str())
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .send()
        .map_err(|source| FetchError::Request {
            url: parsed.to_string(),
            source,
        })?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: final_url,
            status,
        });
    }
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    let html = response.text().map_err(|source| FetchError::Request {
        url: final_url.clone(),
        source,
    })?;

    Ok(FetchResult {
        html,
        url: final_url,
        status,
        content_type,
    })
}
