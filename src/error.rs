use thiserror::Error;

/// Failure taxonomy for the whole crate. Every variant carries enough
/// context to name the offending token, record or model in its message.
#[derive(Debug, Error)]
pub enum Error {
    /// Token absent from the store's vocabulary (store-level lookup).
    #[error("'{0}' is not in the vocabulary")]
    NotFound(String),

    /// An analogy/arithmetic input word is out of vocabulary.
    #[error("'{0}' is out of vocabulary")]
    MissingToken(String),

    /// Zero-magnitude vector where cosine similarity is undefined.
    #[error("invalid vector: {0}")]
    InvalidVector(String),

    #[error("vector for '{word}' has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        word: String,
        expected: usize,
        actual: usize,
    },

    /// Dataset record with the wrong number of fields.
    #[error("malformed record on line {line}: expected {expected} fields, found {found}")]
    MalformedRecord {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("model '{name}' unavailable: {reason}")]
    ModelUnavailable { name: String, reason: String },

    #[error("unparseable value for '{word}' on line {line}")]
    ParseFloat { word: String, line: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
