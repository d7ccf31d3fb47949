pub mod service;
pub mod span;

pub use service::{CorrectionService, FnService, ProofreadResult, ServiceError};
pub use span::{
    apply_spans, normalize, to_byte_offsets, validate_spans, CorrectionSpan, CorrectionType,
    OffsetUnit, SpanIndex,
};
