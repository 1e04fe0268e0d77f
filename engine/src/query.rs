use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words};
use std::collections::HashSet;

/// A parsed query. Plus words raise a document's relevance; a single minus
/// word present in a document excludes it from the results outright. Both
/// lists are sorted and deduplicated, so the sequential and parallel
/// execution paths iterate the exact same membership.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Query {
    pub(crate) plus_words: Vec<String>,
    pub(crate) minus_words: Vec<String>,
}

impl Query {
    /// Parses `raw` against the given stop-word set.
    ///
    /// Per token: one leading `-` marks a minus word and is stripped; a
    /// bare `-` or a doubled leading `--` is malformed; control characters
    /// are invalid anywhere; stop words are dropped from both classes.
    /// A `-` in any other position is an ordinary word character.
    pub(crate) fn parse(raw: &str, stop_words: &HashSet<String>) -> Result<Self> {
        let mut query = Query::default();
        for token in split_into_words(raw) {
            let (word, is_minus) = match token.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (token, false),
            };
            if word.is_empty() || word.starts_with('-') {
                return Err(SearchError::InvalidArgument(format!(
                    "malformed minus word {token:?} in query"
                )));
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidArgument(format!(
                    "query word {word:?} contains control characters"
                )));
            }
            if stop_words.contains(word) {
                continue;
            }
            if is_minus {
                query.minus_words.push(word.to_string());
            } else {
                query.plus_words.push(word.to_string());
            }
        }
        query.plus_words.sort_unstable();
        query.plus_words.dedup();
        query.minus_words.sort_unstable();
        query.minus_words.dedup();
        Ok(query)
    }
}
