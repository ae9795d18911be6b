//! Error types for document extraction and citation mapping.
//!
//! "Citation not found" is deliberately absent: lookups return `None` or an
//! empty `Vec` for that, and only structural problems become errors.

use thiserror::Error;

/// Errors raised by the citation-mapping library.
#[derive(Error, Debug)]
pub enum CiteError {
    /// The source bytes are not a parseable PDF, or a page failed to decode.
    #[error("document unreadable: {0}")]
    DocumentUnreadable(String),

    /// The PDF parsed but contains zero pages.
    #[error("document has no pages")]
    EmptyDocument,

    /// Caller supplied a reversed or out-of-document character range.
    #[error("invalid character range {start}..{end} (document length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// The pdfium dynamic library could not be bound.
    #[error("pdfium library unavailable: {0}")]
    PdfiumUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CiteError>;
