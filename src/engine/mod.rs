pub mod pipeline;

pub use pipeline::{ElementOutcome, NoopObserver, ProgressObserver, RunSummary, Session, StopHandle};
