//! Error types for the PDF normalizer library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF normalizer library
///
/// Per-page box problems are not errors: they are collected as
/// [`PageBoxError`](crate::boxes::PageBoxError) values and returned alongside
/// a best-effort result. The variants here abort an operation (or, for
/// [`Error::Geometry`], a single page of it).
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyDocument(PathBuf),

    /// No page carries a usable media or crop box
    #[error("No page in {} has a valid page box", .0.display())]
    NoValidBox(PathBuf),

    /// Computed scale is zero, negative or not finite
    #[error("Page {page_index}: {message}")]
    Geometry { page_index: usize, message: String },

    /// Rotation is not a multiple of 90 degrees
    #[error("Unsupported rotation: {0} degrees (expected 0, 90, 180 or 270)")]
    UnsupportedRotation(i64),

    /// The staged output could not replace the destination
    #[error("Could not replace {} after {attempts} attempts: {source}", .path.display())]
    IoContention {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// The caller's cancel token was triggered
    #[error("Operation cancelled")]
    Cancelled,

    /// Insert position outside the document
    #[error("Invalid insert position {position} for a document with {page_count} pages")]
    InvalidInsertPosition { position: i64, page_count: usize },

    /// The staged output failed its re-open check
    #[error("Output validation failed: {0}")]
    Validation(String),

    /// General error
    #[error("{0}")]
    General(String),
}
