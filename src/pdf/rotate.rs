//! Whole-document rotation

use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{info, warn};
use crate::error::Result;
use crate::geometry::Rotation;
use crate::pdf::normalize::DocumentOptions;
use crate::pdf::output::write_document;
use crate::pdf::page;
use crate::pdf::session::Session;

/// Outcome of [`rotate_all_pages`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RotateOutcome {
    /// The rotation was a whole turn; nothing was read or written
    Unchanged,
    Rotated { output: PathBuf, pages: usize, by: Rotation },
}

/// Add a clockwise rotation to every page.
///
/// `degrees` may be negative or larger than a turn; it is normalized into
/// `[0, 360)` first. A whole turn returns [`RotateOutcome::Unchanged`] without
/// touching the file system. Anything not a multiple of 90 is rejected with
/// [`Error::UnsupportedRotation`](crate::error::Error::UnsupportedRotation).
pub fn rotate_all_pages(path: &Path, degrees: i64, options: &DocumentOptions) -> Result<RotateOutcome> {
    let by = Rotation::from_degrees(degrees)?;
    if by == Rotation::R0 {
        info!(path = %path.display(), degrees, "rotation is a whole turn, nothing to do");
        return Ok(RotateOutcome::Unchanged);
    }

    let mut session = Session::open(path, options.cancel.clone())?;
    let page_ids = session.page_ids();

    for (index, id) in page_ids.iter().enumerate() {
        let raw = page::read_rotation(session.doc(), *id);
        let current = Rotation::from_degrees(raw).unwrap_or_else(|_| {
            warn!(page = index + 1, rotate = raw, "invalid /Rotate treated as 0");
            Rotation::R0
        });
        page::set_rotation(session.doc_mut(), *id, current.add(by))?;
        session.checkpoint()?;
    }

    let output = options.target(path);
    let pages = page_ids.len();
    write_document(session.into_document(), &output, pages, &options.replace)?;

    info!(path = %path.display(), pages, degrees = by.degrees(), "rotated pages");
    Ok(RotateOutcome::Rotated { output, pages, by })
}
