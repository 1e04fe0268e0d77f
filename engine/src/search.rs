//! The engine proper: document store, dual-mapped inverted index, and
//! TF-IDF ranking in sequential and parallel flavors.

use crate::concurrent_map::ConcurrentMap;
use crate::document::{Document, DocumentId, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::query::Query;
use crate::tokenizer::{is_valid_word, split_into_words};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Ranked results are cut off at this many entries.
pub const MAX_RESULT_COUNT: usize = 5;

/// Relevance deltas below this threshold count as a tie, broken by rating.
pub const RELEVANCE_EPSILON: f64 = 1e-6;

/// Bucket count of the relevance accumulator on the parallel search path.
const ACCUMULATOR_BUCKETS: usize = 64;

static EMPTY_FREQUENCIES: BTreeMap<String, f64> = BTreeMap::new();

#[derive(Debug, Clone, Copy)]
struct DocumentData {
    rating: i32,
    status: DocumentStatus,
}

/// In-memory TF-IDF search engine.
///
/// The inverted index is stored twice: `word -> {id -> tf}` for query-time
/// lookup and `id -> {word -> tf}` for cheap removal and per-document
/// introspection. The two maps hold the same `(word, id, tf)` relation and
/// are only ever mutated together, inside [`add_document`] and
/// [`remove_document`]. Documents are immutable once added: an "edit" is a
/// caller-side remove-then-add.
///
/// [`add_document`]: SearchEngine::add_document
/// [`remove_document`]: SearchEngine::remove_document
#[derive(Debug, Default)]
pub struct SearchEngine {
    stop_words: HashSet<String>,
    word_to_document_freqs: BTreeMap<String, BTreeMap<DocumentId, f64>>,
    document_to_word_freqs: BTreeMap<DocumentId, BTreeMap<String, f64>>,
    documents: HashMap<DocumentId, DocumentData>,
    insertion_order: Vec<DocumentId>,
}

impl SearchEngine {
    /// Builds an engine from any collection of stop words. The whole batch
    /// is validated before a single word is inserted; empty strings are
    /// ignored and duplicates collapse.
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut engine = Self::default();
        engine.insert_stop_words(stop_words)?;
        Ok(engine)
    }

    /// Builds an engine from a whitespace-delimited stop-word string.
    pub fn from_text(stop_words: &str) -> Result<Self> {
        Self::new(split_into_words(stop_words))
    }

    /// Extends the stop-word set of a live engine from a whitespace-delimited
    /// string. Validation is all-or-nothing: on failure the previous set is
    /// left untouched.
    pub fn add_stop_words(&mut self, text: &str) -> Result<()> {
        self.insert_stop_words(split_into_words(text))
    }

    /// Indexes a document. Fails on a negative id, an id already present,
    /// or a text token with control characters; a failed call leaves the
    /// index in its prior state.
    ///
    /// `ratings` are averaged with integer truncation toward zero; an empty
    /// slice yields a rating of 0.
    pub fn add_document(
        &mut self,
        id: DocumentId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if id < 0 {
            return Err(SearchError::InvalidArgument(format!(
                "document id {id} is negative"
            )));
        }
        if self.documents.contains_key(&id) {
            return Err(SearchError::InvalidArgument(format!(
                "document id {id} is already indexed"
            )));
        }
        let words = self.split_into_words_no_stop(text)?;

        let inverse_word_count = 1.0 / words.len() as f64;
        let mut frequencies: BTreeMap<String, f64> = BTreeMap::new();
        for word in words {
            *frequencies.entry(word).or_insert(0.0) += inverse_word_count;
        }
        for (word, frequency) in &frequencies {
            self.word_to_document_freqs
                .entry(word.clone())
                .or_default()
                .insert(id, *frequency);
        }
        self.document_to_word_freqs.insert(id, frequencies);
        self.documents.insert(
            id,
            DocumentData {
                rating: average_rating(ratings),
                status,
            },
        );
        self.insertion_order.push(id);
        Ok(())
    }

    /// Removes a document and every trace of it in both index maps. Removing
    /// an absent id is a no-op.
    pub fn remove_document(&mut self, id: DocumentId) {
        let Some(word_frequencies) = self.document_to_word_freqs.remove(&id) else {
            return;
        };
        for word in word_frequencies.keys() {
            if let Some(postings) = self.word_to_document_freqs.get_mut(word) {
                postings.remove(&id);
                if postings.is_empty() {
                    self.word_to_document_freqs.remove(word);
                }
            }
        }
        self.finish_removal(id);
    }

    /// Parallel twin of [`remove_document`](SearchEngine::remove_document):
    /// the per-word forward entries are independent, so their fate is
    /// decided in a parallel read-only pass before the erasures are applied.
    pub fn remove_document_par(&mut self, id: DocumentId) {
        let Some(word_frequencies) = self.document_to_word_freqs.remove(&id) else {
            return;
        };
        let dying: Vec<(&String, bool)> = word_frequencies
            .par_iter()
            .map(|(word, _)| {
                let last_document = self
                    .word_to_document_freqs
                    .get(word)
                    .is_some_and(|postings| postings.len() == 1);
                (word, last_document)
            })
            .collect();
        for (word, last_document) in dying {
            if last_document {
                self.word_to_document_freqs.remove(word);
            } else if let Some(postings) = self.word_to_document_freqs.get_mut(word) {
                postings.remove(&id);
            }
        }
        self.finish_removal(id);
    }

    /// Top-K search with the default filter, `status == Actual`.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with_status(raw_query, DocumentStatus::Actual)
    }

    /// Top-K search keeping only documents with the given status.
    pub fn find_top_documents_with_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    /// Top-K search with a caller-supplied predicate over
    /// `(id, status, rating)`. Results are sorted by relevance descending;
    /// deltas under [`RELEVANCE_EPSILON`] count as ties and fall back to
    /// rating descending; the list is cut to [`MAX_RESULT_COUNT`] entries.
    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let query = Query::parse(raw_query, &self.stop_words)?;
        let mut documents = self.find_all_documents(&query, predicate);
        documents.sort_by(compare_ranked);
        documents.truncate(MAX_RESULT_COUNT);
        Ok(documents)
    }

    /// Parallel twin of [`find_top_documents`](SearchEngine::find_top_documents).
    pub fn find_top_documents_par(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with_status_par(raw_query, DocumentStatus::Actual)
    }

    /// Parallel twin of
    /// [`find_top_documents_with_status`](SearchEngine::find_top_documents_with_status).
    pub fn find_top_documents_with_status_par(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by_par(raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    /// Parallel twin of
    /// [`find_top_documents_by`](SearchEngine::find_top_documents_by):
    /// same contract, same results, with relevance accumulation fanned over
    /// plus words into a sharded [`ConcurrentMap`].
    pub fn find_top_documents_by_par<P>(
        &self,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = Query::parse(raw_query, &self.stop_words)?;
        let mut documents = self.find_all_documents_par(&query, predicate);
        documents.par_sort_by(compare_ranked);
        documents.truncate(MAX_RESULT_COUNT);
        Ok(documents)
    }

    /// Reports which query words occur in the given document, along with the
    /// document's status. Any minus-word hit short-circuits to an empty word
    /// list. The returned words are sorted and deduplicated. Statuses are
    /// not filtered here: the true match set is reported for any known id.
    pub fn match_document(
        &self,
        raw_query: &str,
        id: DocumentId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        let data = self.document_data(id)?;
        let query = Query::parse(raw_query, &self.stop_words)?;
        let word_frequencies = self.word_frequencies(id);
        for word in &query.minus_words {
            if word_frequencies.contains_key(word) {
                return Ok((Vec::new(), data.status));
            }
        }
        let matched = query
            .plus_words
            .iter()
            .filter(|word| word_frequencies.contains_key(*word))
            .cloned()
            .collect();
        Ok((matched, data.status))
    }

    /// Parallel twin of [`match_document`](SearchEngine::match_document).
    pub fn match_document_par(
        &self,
        raw_query: &str,
        id: DocumentId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        let data = self.document_data(id)?;
        let query = Query::parse(raw_query, &self.stop_words)?;
        let word_frequencies = self.word_frequencies(id);
        if query
            .minus_words
            .par_iter()
            .any(|word| word_frequencies.contains_key(word))
        {
            return Ok((Vec::new(), data.status));
        }
        let matched = query
            .plus_words
            .par_iter()
            .filter(|word| word_frequencies.contains_key(*word))
            .cloned()
            .collect();
        Ok((matched, data.status))
    }

    /// Number of currently indexed documents.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Id of the document at the given ordinal position of the insertion
    /// order.
    pub fn document_id_at(&self, ordinal: usize) -> Result<DocumentId> {
        self.insertion_order
            .get(ordinal)
            .copied()
            .ok_or(SearchError::OutOfRange(ordinal))
    }

    /// Per-word term frequencies of one document. Unknown ids yield an
    /// empty map, never an error.
    pub fn word_frequencies(&self, id: DocumentId) -> &BTreeMap<String, f64> {
        self.document_to_word_freqs
            .get(&id)
            .unwrap_or(&EMPTY_FREQUENCIES)
    }

    /// All current document ids in insertion order.
    pub fn document_ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.insertion_order.iter().copied()
    }

    fn insert_stop_words<I, S>(&mut self, words: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<S> = words.into_iter().collect();
        for word in &words {
            if !is_valid_word(word.as_ref()) {
                return Err(SearchError::InvalidArgument(format!(
                    "stop word {:?} contains control characters",
                    word.as_ref()
                )));
            }
        }
        for word in words {
            let word = word.as_ref();
            if !word.is_empty() {
                self.stop_words.insert(word.to_string());
            }
        }
        Ok(())
    }

    fn split_into_words_no_stop(&self, text: &str) -> Result<Vec<String>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidArgument(format!(
                    "word {word:?} contains control characters"
                )));
            }
            if !self.stop_words.contains(word) {
                words.push(word.to_string());
            }
        }
        Ok(words)
    }

    fn document_data(&self, id: DocumentId) -> Result<DocumentData> {
        self.documents.get(&id).copied().ok_or_else(|| {
            SearchError::InvalidArgument(format!("document id {id} is not indexed"))
        })
    }

    fn finish_removal(&mut self, id: DocumentId) {
        self.documents.remove(&id);
        self.insertion_order.retain(|&other| other != id);
        tracing::debug!(id, "removed document");
    }

    fn inverse_document_frequency(&self, documents_containing: usize) -> f64 {
        (self.document_count() as f64 / documents_containing as f64).ln()
    }

    fn find_all_documents<P>(&self, query: &Query, predicate: P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let mut relevance: BTreeMap<DocumentId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.word_to_document_freqs.get(word) else {
                continue;
            };
            let idf = self.inverse_document_frequency(postings.len());
            for (&id, &term_frequency) in postings {
                let data = self.documents[&id];
                if predicate(id, data.status, data.rating) {
                    *relevance.entry(id).or_insert(0.0) += term_frequency * idf;
                }
            }
        }
        for word in &query.minus_words {
            let Some(postings) = self.word_to_document_freqs.get(word) else {
                continue;
            };
            for &id in postings.keys() {
                relevance.remove(&id);
            }
        }
        relevance
            .into_iter()
            .map(|(id, relevance)| Document {
                id,
                relevance,
                rating: self.documents[&id].rating,
            })
            .collect()
    }

    fn find_all_documents_par<P>(&self, query: &Query, predicate: P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let accumulator: ConcurrentMap<DocumentId, f64> =
            ConcurrentMap::new(ACCUMULATOR_BUCKETS);
        query.plus_words.par_iter().for_each(|word| {
            let Some(postings) = self.word_to_document_freqs.get(word) else {
                return;
            };
            let idf = self.inverse_document_frequency(postings.len());
            for (&id, &term_frequency) in postings {
                let data = self.documents[&id];
                if predicate(id, data.status, data.rating) {
                    accumulator.update(id, |relevance| *relevance += term_frequency * idf);
                }
            }
        });

        // Writers are joined by the for_each above; moving the accumulator
        // flattens it into one ordered map.
        let mut relevance = accumulator.into_ordinary_map();
        let excluded: Vec<DocumentId> = query
            .minus_words
            .par_iter()
            .flat_map_iter(|word| {
                self.word_to_document_freqs
                    .get(word)
                    .into_iter()
                    .flat_map(|postings| postings.keys().copied())
            })
            .collect();
        for id in excluded {
            relevance.remove(&id);
        }
        relevance
            .into_par_iter()
            .map(|(id, relevance)| Document {
                id,
                relevance,
                rating: self.documents[&id].rating,
            })
            .collect()
    }
}

/// Insertion-order iteration over document ids, for consumers such as the
/// duplicate detector.
impl<'a> IntoIterator for &'a SearchEngine {
    type Item = DocumentId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, DocumentId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.insertion_order.iter().copied()
    }
}

fn compare_ranked(lhs: &Document, rhs: &Document) -> Ordering {
    if (lhs.relevance - rhs.relevance).abs() < RELEVANCE_EPSILON {
        rhs.rating.cmp(&lhs.rating)
    } else {
        rhs.relevance.total_cmp(&lhs.relevance)
    }
}

fn average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&rating| i64::from(rating)).sum();
    (sum / ratings.len() as i64) as i32
}
