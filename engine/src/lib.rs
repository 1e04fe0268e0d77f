//! # engine
//!
//! Embeddable in-process full-text search engine. Indexes short text
//! documents carrying an integer rating and a lifecycle status, and answers
//! ranked top-K queries using TF-IDF relevance with plus/minus word
//! filtering. Designed for many concurrent reads against a corpus that
//! changes comparatively rarely; the hot search, match, removal, and batch
//! paths all come in sequential and rayon-parallel flavors that produce
//! identical results.

/// Batch query processing: fan a query list across the engine in parallel.
pub mod batch;
/// Sharded lock-per-bucket accumulator used by the parallel search path.
pub mod concurrent_map;
/// Removal of documents whose word sets duplicate an earlier document.
pub mod dedup;
mod document;
mod error;
/// Fixed-size display windows over an already-computed result list.
pub mod paginate;
mod query;
/// Bounded request history that records which searches came back empty.
pub mod request_log;
mod search;
/// Whitespace splitting and token validation.
pub mod tokenizer;

pub use batch::{process_queries, process_queries_joined};
pub use concurrent_map::ConcurrentMap;
pub use dedup::remove_duplicates;
pub use document::{Document, DocumentId, DocumentStatus};
pub use error::{Result, SearchError};
pub use paginate::paginate;
pub use request_log::RequestLog;
pub use search::{SearchEngine, MAX_RESULT_COUNT, RELEVANCE_EPSILON};
