//! Removal of documents whose distinct word sets duplicate an earlier
//! document's. Consumes only the engine's public interface.

use crate::document::DocumentId;
use crate::search::SearchEngine;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

/// Groups documents by their distinct word sets and removes every member of
/// a group except the lowest id. Returns the removed ids in ascending
/// order; each removal is also reported through `tracing`.
pub fn remove_duplicates(engine: &mut SearchEngine) -> Vec<DocumentId> {
    let mut keeper_by_words: HashMap<Vec<String>, DocumentId> = HashMap::new();
    let mut duplicates: BTreeSet<DocumentId> = BTreeSet::new();

    for id in engine.document_ids() {
        // Map keys are already sorted and distinct, so equal word sets
        // produce equal key vectors.
        let words: Vec<String> = engine.word_frequencies(id).keys().cloned().collect();
        match keeper_by_words.entry(words) {
            Entry::Occupied(mut kept) => {
                if *kept.get() > id {
                    duplicates.insert(kept.insert(id));
                } else {
                    duplicates.insert(id);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
    }

    let removed: Vec<DocumentId> = duplicates.into_iter().collect();
    for &id in &removed {
        tracing::info!(id, "removing duplicate document");
        engine.remove_document(id);
    }
    removed
}
