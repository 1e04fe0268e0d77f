use serde::{Deserialize, Serialize};
use std::fmt;

/// Document identifier. Ids are caller-assigned, non-negative, and unique
/// for the lifetime of the index; the signed type lets the engine reject
/// negative ids instead of silently wrapping them.
pub type DocumentId = i32;

/// Lifecycle tag attached to a document at add time. Statuses are opaque
/// filter values: the engine never transitions a document from one status
/// to another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// One ranked search hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub relevance: f64,
    pub rating: i32,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ document_id = {}, relevance = {}, rating = {} }}",
            self.id, self.relevance, self.rating
        )
    }
}
