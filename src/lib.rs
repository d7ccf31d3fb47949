pub mod config;
pub mod correction;
pub mod dom;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod net;
pub mod render;
pub mod select;
pub mod text;

pub use config::ProofreadConfig;
pub use correction::service::{CorrectionService, FnService, ProofreadResult, ServiceError};
pub use dom::{Document, NodeId};
pub use engine::pipeline::{ElementOutcome, NoopObserver, ProgressObserver, RunSummary, Session, StopHandle};
pub use error::{Error, Result};
