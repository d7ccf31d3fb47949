//! Run configuration, loadable from TOML.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```toml
//! max_elements_per_run = 10
//!
//! [selector]
//! max_candidates = 10
//!
//! [service]
//! endpoint = "http://localhost:8080/proofread"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::correction::span::OffsetUnit;

const PRIMARY_CONTAINERS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".article-body",
    ".post-body",
    ".story-body",
    "#content",
    ".content",
    "#main-content",
    ".markdown-body",
    ".mw-parser-output",
];

const SECONDARY_CONTAINERS: &[&str] = &[
    "section",
    ".container",
    ".page",
    "#main",
    "[role=\"article\"]",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofreadConfig {
    /// Layout viewport width in CSS pixels
    pub viewport_width: f32,
    /// Upper bound on elements proofread by one run
    pub max_elements_per_run: usize,
    /// Pause between scrolling an element into view and proofreading it
    pub scroll_settle_ms: u64,
    pub selector: SelectorConfig,
    pub render: RenderConfig,
    pub service: ServiceConfig,
}

impl Default for ProofreadConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            max_elements_per_run: 20,
            scroll_settle_ms: 0,
            selector: SelectorConfig::default(),
            render: RenderConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl ProofreadConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

/// Thresholds of the content selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Container selectors tried first, in order
    pub primary_containers: Vec<String>,
    /// Tried only when no primary container qualifies
    pub secondary_containers: Vec<String>,
    pub min_container_width: f32,
    pub min_container_height: f32,
    pub min_container_chars: usize,
    pub min_lengths: CategoryLengths,
    /// Elements with more block-level children than this are layout wrappers
    pub max_child_elements: usize,
    pub min_element_width: f32,
    pub min_element_height: f32,
    /// How far outside the viewport an element may sit before it counts as off-canvas
    pub offscreen_margin: f32,
    /// Candidates whose tops differ by less than this share a row
    pub same_row_threshold: f32,
    pub max_uppercase_ratio: f32,
    pub min_words: usize,
    /// Text at least this long must contain sentence punctuation
    pub punctuation_check_length: usize,
    pub max_candidates: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            primary_containers: PRIMARY_CONTAINERS.iter().map(|s| s.to_string()).collect(),
            secondary_containers: SECONDARY_CONTAINERS.iter().map(|s| s.to_string()).collect(),
            min_container_width: 200.0,
            min_container_height: 50.0,
            min_container_chars: 100,
            min_lengths: CategoryLengths::default(),
            max_child_elements: 5,
            min_element_width: 20.0,
            min_element_height: 10.0,
            offscreen_margin: 1000.0,
            same_row_threshold: 5.0,
            max_uppercase_ratio: 0.7,
            min_words: 3,
            punctuation_check_length: 80,
            max_candidates: 20,
        }
    }
}

/// Minimum trimmed text length per content category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryLengths {
    pub heading: usize,
    pub paragraph: usize,
    pub quote: usize,
    pub caption: usize,
    pub definition: usize,
    pub summary: usize,
    pub list_item: usize,
}

impl Default for CategoryLengths {
    fn default() -> Self {
        Self {
            heading: 10,
            paragraph: 30,
            quote: 20,
            caption: 15,
            definition: 15,
            summary: 10,
            list_item: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Annotations per element before the rest are folded into "+N more changes"
    pub max_annotations: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { max_annotations: 80 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// How the service counts `startIndex`/`endIndex`
    pub offsets: OffsetUnit,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
            user_agent: format!("proofread-overlay/{}", env!("CARGO_PKG_VERSION")),
            offsets: OffsetUnit::Utf8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProofreadConfig::default();
        assert_eq!(config.max_elements_per_run, 20);
        assert_eq!(config.selector.max_candidates, 20);
        assert_eq!(config.selector.min_lengths.paragraph, 30);
        assert_eq!(config.render.max_annotations, 80);
        assert_eq!(config.scroll_settle(), Duration::ZERO);
        assert_eq!(config.selector.primary_containers[0], "main");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ProofreadConfig::from_toml_str(
            r#"
            scroll_settle_ms = 250

            [selector]
            max_candidates = 5

            [selector.min_lengths]
            heading = 4

            [service]
            endpoint = "http://localhost:9000/proofread"
            "#,
        )
        .unwrap();
        assert_eq!(config.scroll_settle(), Duration::from_millis(250));
        assert_eq!(config.selector.max_candidates, 5);
        assert_eq!(config.selector.min_lengths.heading, 4);
        assert_eq!(config.selector.min_lengths.paragraph, 30);
        assert_eq!(config.selector.min_container_chars, 100);
        assert_eq!(
            config.service.endpoint.as_deref(),
            Some("http://localhost:9000/proofread")
        );
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.service.offsets, OffsetUnit::Utf8);
    }

    #[test]
    fn utf16_offsets_are_configurable() {
        let config = ProofreadConfig::from_toml_str("[service]\noffsets = \"utf16\"").unwrap();
        assert_eq!(config.service.offsets, OffsetUnit::Utf16);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(ProofreadConfig::from_toml_str("max_elements_per_run = \"lots\"").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ProofreadConfig::load("/nonexistent/proofread.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
