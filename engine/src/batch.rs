//! Batch query processing. Queries only read the index, so a list of them
//! fans across the default search path in parallel.

use crate::document::Document;
use crate::error::Result;
use crate::search::SearchEngine;
use rayon::prelude::*;

/// Runs every query through [`SearchEngine::find_top_documents`] in
/// parallel. Slot `i` of the output always holds the result of
/// `queries[i]`, regardless of which worker finishes first.
pub fn process_queries(engine: &SearchEngine, queries: &[String]) -> Result<Vec<Vec<Document>>> {
    queries
        .par_iter()
        .map(|query| engine.find_top_documents(query))
        .collect()
}

/// Same per-query computation, flattened by move into one sequence that
/// preserves the per-query grouping order: all of query 0's hits, then all
/// of query 1's, and so on.
pub fn process_queries_joined(engine: &SearchEngine, queries: &[String]) -> Result<Vec<Document>> {
    Ok(process_queries(engine, queries)?
        .into_iter()
        .flatten()
        .collect())
}
