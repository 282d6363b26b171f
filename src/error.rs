//! Error types shared by the codec, the mutation engine and the document store.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reading, annotating or saving a document.
///
/// None of these are fatal to the process: each is scoped to one operation and
/// the previously persisted body stays authoritative.
#[derive(Error, Debug)]
pub enum Error {
    /// A `<!--comment` block lacks the `author:`/`date:`/`id:` sequence or its close token.
    #[error("Malformed comment marker at line {line}: {text}")]
    MalformedMarker {
        /// 1-based line of the offending open token.
        line: usize,
        /// Raw text of the offending block.
        text: String,
    },

    /// A section index that the current body does not have.
    #[error("Section {index} out of range ({count} sections)")]
    SectionOutOfRange {
        /// Requested section index.
        index: usize,
        /// Number of sections in the scanned body.
        count: usize,
    },

    /// No marker with this id exists in the body.
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    /// Comment text was empty after trimming.
    #[error("Comment text is empty")]
    EmptyComment,

    /// A value that cannot be embedded in a marker without breaking its grammar.
    #[error("Invalid marker field: {0}")]
    InvalidField(String),

    /// The requested document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A document path that escapes the docs root or is otherwise unusable.
    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    /// An operation that needs an open document was called without one.
    #[error("No document is open")]
    NoDocument,

    /// No section is selected to attach a comment to.
    #[error("No section selected")]
    NoSelection,

    /// The configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    /// Underlying read or write failure.
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    /// Serialisation failure when emitting JSON output.
    Json(#[from] serde_json::Error),
}
