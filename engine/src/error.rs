use thiserror::Error;

/// Errors surfaced by the engine. All failures are synchronous validation
/// or lookup errors raised at the call that discovered them; nothing is
/// retried or recovered internally.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed input: a negative or duplicate document id, control
    /// characters (code points 0..=31) in a word, or broken minus-word
    /// syntax in a query.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An ordinal position outside `[0, document_count)`.
    #[error("ordinal {0} is out of range")]
    OutOfRange(usize),
}

pub type Result<T> = std::result::Result<T, SearchError>;
