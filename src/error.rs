use thiserror::Error;

use crate::config::ConfigError;
use crate::correction::service::ServiceError;
use crate::dom::{MarkupError, SelectorError};

/// Any failure surfaced by the crate's entry points.
///
/// Inside a run none of these are fatal; they are logged per element.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[cfg(feature = "http")]
    #[error(transparent)]
    Fetch(#[from] crate::net::fetch::FetchError),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
