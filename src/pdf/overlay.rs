//! Insertion of text overlay pages

use std::path::{Path, PathBuf};
use lopdf::{dictionary, Object, ObjectId};
use serde::Serialize;
use tracing::{info, warn};
use crate::coords::{self, CoordinateInfo};
use crate::error::{Error, Result};
use crate::layout::{layout_text, LayoutParams, TextBlock};
use crate::metrics::{clean_text, FontKind, StandardMetrics};
use crate::pdf::canvas::Canvas;
use crate::pdf::normalize::DocumentOptions;
use crate::pdf::output::write_document;
use crate::pdf::page::{self, Placement};
use crate::pdf::session::{PageGeometry, Session};

/// Options for inserted overlay pages
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Text to center on each page; empty text inserts blank pages
    pub text: String,
    /// Font size in points
    pub font_size: f64,
    /// Distance kept from every edge of the usable area
    pub margin: f64,
    /// Raw position: 0 before the first page, -1 after the last, N after page N
    pub position: i64,
    /// Number of identical pages to insert
    pub page_count: usize,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 12.0,
            margin: 10.0,
            position: -1,
            page_count: 1,
        }
    }
}

/// Where overlay pages go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertPosition {
    BeforeFirst,
    AfterLast,
    /// After the given 1-based page
    AfterPage(usize),
}

impl InsertPosition {
    /// Decode a raw position for a document of `page_count` pages.
    pub fn from_raw(raw: i64, page_count: usize) -> Result<Self> {
        match raw {
            0 => Ok(InsertPosition::BeforeFirst),
            -1 => Ok(InsertPosition::AfterLast),
            n if n > 0 && (n as u64) <= page_count as u64 => Ok(InsertPosition::AfterPage(n as usize)),
            _ => Err(Error::InvalidInsertPosition { position: raw, page_count }),
        }
    }

    /// 0-based index of the page the new pages are placed next to, and on
    /// which side. That page also supplies their size and rotation.
    fn anchor(self, page_count: usize) -> (usize, Placement) {
        match self {
            InsertPosition::BeforeFirst => (0, Placement::Before),
            InsertPosition::AfterLast => (page_count.saturating_sub(1), Placement::After),
            InsertPosition::AfterPage(n) => (n - 1, Placement::After),
        }
    }

    /// 1-based number of the first inserted page
    fn first_new_page(self, page_count: usize) -> usize {
        match self {
            InsertPosition::BeforeFirst => 1,
            InsertPosition::AfterLast => page_count + 1,
            InsertPosition::AfterPage(n) => n + 1,
        }
    }
}

/// Outcome of [`insert_overlay_page`]
#[derive(Debug, Clone, Serialize)]
pub struct InsertReport {
    pub output: PathBuf,
    pub position: InsertPosition,
    /// 1-based numbers of the new pages in the output
    pub inserted_pages: Vec<usize>,
    pub page_count: usize,
    pub lines: usize,
    pub truncated: bool,
}

/// Insert pages carrying centered text next to an existing page.
///
/// New pages copy the boxes and rotation of the page they are inserted
/// next to; the text is laid out in that page's usable area as the reader
/// sees it, so it appears upright on rotated pages.
///
/// # Example
///
/// ```no_run
/// use pdf_normalizer::pdf::{insert_overlay_page, DocumentOptions, OverlayOptions};
/// use std::path::Path;
///
/// let overlay = OverlayOptions {
///     text: "Batch 42".to_string(),
///     position: 0,
///     ..Default::default()
/// };
/// insert_overlay_page(Path::new("order.pdf"), &overlay, &DocumentOptions::default())
///     .expect("Failed to insert page");
/// ```
pub fn insert_overlay_page(path: &Path, overlay: &OverlayOptions, options: &DocumentOptions) -> Result<InsertReport> {
    if overlay.page_count == 0 {
        return Err(Error::General("page_count must be at least 1".to_string()));
    }

    let mut session = Session::open(path, options.cancel.clone())?;
    let pages = session.read_geometry()?;
    let original_count = pages.len();

    let position = InsertPosition::from_raw(overlay.position, original_count)?;
    let (anchor_index, placement) = position.anchor(original_count);
    let reference = &pages[anchor_index];
    for issue in &reference.analysis.errors {
        warn!(page = anchor_index + 1, "{}", issue.message);
    }

    let info = coords::resolve(&reference.boxes, &reference.analysis.effective, reference.analysis.rotation);
    let text = clean_text(&overlay.text);
    let kind = FontKind::for_text(&text);
    let block = layout_text(
        &text,
        &StandardMetrics::new(kind),
        &LayoutParams {
            usable_width: info.usable_width,
            usable_height: info.usable_height,
            rotation: reference.analysis.rotation.degrees(),
            font_size: overlay.font_size,
            margin: overlay.margin,
        },
    )
    .map_err(|e| match e {
        Error::Geometry { message, .. } => Error::Geometry { page_index: anchor_index, message },
        other => other,
    })?;

    let mut new_pages = Vec::with_capacity(overlay.page_count);
    for _ in 0..overlay.page_count {
        new_pages.push(build_page(&mut session, reference, &info, &block, kind)?);
        session.checkpoint()?;
    }
    page::insert_pages(session.doc_mut(), reference.id, placement, &new_pages)?;

    let first = position.first_new_page(original_count);
    let page_count = original_count + new_pages.len();
    let output = options.target(path);
    write_document(session.into_document(), &output, page_count, &options.replace)?;

    info!(
        path = %path.display(),
        at = first,
        pages = new_pages.len(),
        lines = block.lines.len(),
        truncated = block.truncated,
        "inserted overlay pages"
    );
    Ok(InsertReport {
        output,
        position,
        inserted_pages: (first..first + new_pages.len()).collect(),
        page_count,
        lines: block.lines.len(),
        truncated: block.truncated,
    })
}

/// One new page object, not yet linked into the page tree
fn build_page(
    session: &mut Session,
    reference: &PageGeometry,
    info: &CoordinateInfo,
    block: &TextBlock,
    kind: FontKind,
) -> Result<ObjectId> {
    let page_id = session.doc_mut().add_object(dictionary! { "Type" => "Page" });
    let boxes = reference.boxes.materialized(reference.analysis.effective);
    page::set_boxes(session.doc_mut(), page_id, &boxes)?;
    page::set_rotation(session.doc_mut(), page_id, reference.analysis.rotation)?;

    if block.is_blank() {
        let dict = session.doc_mut().get_object_mut(page_id)?.as_dict_mut()?;
        dict.set("Contents", Object::Array(Vec::new()));
        dict.set("Resources", dictionary! {});
        return Ok(page_id);
    }

    let font_id = session.font(kind);
    let (_, _, frame) = info.text_frame();

    let mut canvas = Canvas::new();
    canvas.save_state().concat_matrix(&frame).set_fill_color(0.0, 0.0, 0.0).begin_text();
    canvas.set_font(kind.resource_name(), block.font_size);
    for line in &block.lines {
        canvas
            .text_position(line.x, line.baseline)
            .show_text(kind.encode(&line.text));
    }
    canvas.end_text().restore_state();
    let contents = canvas.finish(session.doc_mut())?;

    let dict = session.doc_mut().get_object_mut(page_id)?.as_dict_mut()?;
    dict.set("Contents", Object::Array(contents));
    dict.set(
        "Resources",
        dictionary! {
            "Font" => dictionary! { kind.resource_name() => font_id },
        },
    );
    Ok(page_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_raw() {
        assert_eq!(InsertPosition::from_raw(0, 3).unwrap(), InsertPosition::BeforeFirst);
        assert_eq!(InsertPosition::from_raw(-1, 3).unwrap(), InsertPosition::AfterLast);
        assert_eq!(InsertPosition::from_raw(3, 3).unwrap(), InsertPosition::AfterPage(3));
        assert!(matches!(
            InsertPosition::from_raw(4, 3),
            Err(Error::InvalidInsertPosition { position: 4, page_count: 3 })
        ));
        assert!(InsertPosition::from_raw(-2, 3).is_err());
    }

    #[test]
    fn test_anchor_and_numbering() {
        assert_eq!(InsertPosition::BeforeFirst.anchor(5), (0, Placement::Before));
        assert_eq!(InsertPosition::AfterLast.anchor(5), (4, Placement::After));
        assert_eq!(InsertPosition::AfterPage(2).anchor(5), (1, Placement::After));
        assert_eq!(InsertPosition::AfterPage(2).first_new_page(5), 3);
        assert_eq!(InsertPosition::AfterLast.first_new_page(5), 6);
    }
}
