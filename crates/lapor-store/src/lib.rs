#![forbid(unsafe_code)]
//! Document-store abstraction for the lapor workspace.
//!
//! The remote collection is reached through the [`DocumentStore`] trait:
//! equality/range filters, single-field ordering with a document-id
//! tie-break, limits, resume-after, batched reads, and an aggregate count.
//! Every operation can fail with a distinguishable missing-index error,
//! which is the signal the query engine's fallback machinery keys on.
//!
//! [`MemoryStore`] is a complete in-process backend with a registrable
//! composite-index set, so missing-index conditions are reproducible in
//! tests without a remote service.

mod backend;
mod document;
mod error;
mod ports;
mod query;

pub mod backends;

pub use backend::DocumentStore;
pub use backends::memory::MemoryStore;
pub use document::{value_cmp, DocumentSnapshot};
pub use error::{message_indicates_missing_index, StoreError, StoreErrorCode};
pub use ports::{ObjectRef, ObjectUploader, ReportSubmitter};
pub use query::{
    Direction, FieldFilter, FilterOp, OrderBy, ResumePoint, StructuredQuery, DOC_ID_FIELD,
};

pub const CRATE_NAME: &str = "lapor-store";
