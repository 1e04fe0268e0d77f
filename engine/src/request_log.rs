//! A bounded-history wrapper over the engine's search entry points that
//! remembers only whether each call came back empty.

use crate::document::{Document, DocumentId, DocumentStatus};
use crate::error::Result;
use crate::search::SearchEngine;
use std::collections::VecDeque;

/// Sliding-window length: one slot per minute of a day.
const HISTORY_LIMIT: usize = 1440;

/// Records the emptiness of recent search results, evicting the oldest
/// record once [`HISTORY_LIMIT`] is exceeded. A failed (malformed) query is
/// not recorded.
pub struct RequestLog<'a> {
    engine: &'a SearchEngine,
    requests: VecDeque<bool>,
}

impl<'a> RequestLog<'a> {
    pub fn new(engine: &'a SearchEngine) -> Self {
        Self {
            engine,
            requests: VecDeque::new(),
        }
    }

    /// Searches with the default filter and records the result's emptiness.
    pub fn find(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        let documents = self.engine.find_top_documents(raw_query)?;
        self.record(documents.is_empty());
        Ok(documents)
    }

    /// Searches filtered by status and records the result's emptiness.
    pub fn find_with_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        let documents = self
            .engine
            .find_top_documents_with_status(raw_query, status)?;
        self.record(documents.is_empty());
        Ok(documents)
    }

    /// Searches with a caller predicate and records the result's emptiness.
    pub fn find_by<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let documents = self.engine.find_top_documents_by(raw_query, predicate)?;
        self.record(documents.is_empty());
        Ok(documents)
    }

    /// Number of empty results still inside the history window.
    pub fn no_result_count(&self) -> usize {
        self.requests.iter().filter(|&&empty| empty).count()
    }

    fn record(&mut self, empty: bool) {
        if self.requests.len() == HISTORY_LIMIT {
            self.requests.pop_front();
        }
        self.requests.push_back(empty);
    }
}
