//! PDF Normalizer Library
//!
//! Brings the pages of a PDF into one consistent geometry so overlays land
//! where they are meant to. This library provides functionality to:
//! - Resolve each page's effective box from its five page boxes
//! - Pick the dominant page size of a document by majority vote
//! - Re-project every page into that size without copying its content
//! - Rewrite page boxes to one size, or rotate every page
//! - Insert pages with centered, wrapped, rotation-aware text
//! - Draw bleed/trim guides and registration marks
//!
//! # Example
//!
//! ```no_run
//! use pdf_normalizer::pdf::{normalize_document, DocumentOptions};
//! use std::path::{Path, PathBuf};
//!
//! let options = DocumentOptions {
//!     output_path: Some(PathBuf::from("normalized.pdf")),
//!     ..Default::default()
//! };
//!
//! let report = normalize_document(Path::new("mixed-sizes.pdf"), &options)
//!     .expect("Failed to normalize PDF");
//! println!("{} pages now {} x {} pt", report.page_count, report.container.width, report.container.height);
//! ```

pub mod error;
pub mod geometry;
pub mod boxes;
pub mod container;
pub mod coords;
pub mod transform;
pub mod metrics;
pub mod layout;
pub mod cancel;
pub mod batch;
pub mod pdf;

// Re-export commonly used items
pub use error::{Error, Result};
pub use cancel::CancelToken;
pub use pdf::{
    analyze_box_consistency, insert_overlay_page, normalize_document, rotate_all_pages,
    unify_boxes_only, DocumentOptions, OverlayOptions,
};
