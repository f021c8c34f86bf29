//! Printer's marks: bleed and trim guides plus corner registration marks
//!
//! Marks are drawn in default page space. The page's own content is wrapped
//! in `q … Q` first so a transformation it leaves behind cannot move them.

use std::path::{Path, PathBuf};
use lopdf::{Dictionary, Stream};
use serde::Serialize;
use tracing::info;
use crate::boxes::BoxType;
use crate::error::Result;
use crate::geometry::Rect;
use crate::pdf::canvas::Canvas;
use crate::pdf::normalize::DocumentOptions;
use crate::pdf::output::write_document;
use crate::pdf::page;
use crate::pdf::session::Session;

/// Which marks to draw
#[derive(Debug, Clone)]
pub struct MarkOptions {
    /// Dashed outline of the bleed box
    pub bleed_guides: bool,
    /// Solid outline of the trim box
    pub trim_guides: bool,
    /// Circle and cross hair on each trim box corner
    pub registration: bool,
    /// Cross hair length in points
    pub mark_size: f64,
    pub line_width: f64,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            bleed_guides: true,
            trim_guides: true,
            registration: true,
            mark_size: 12.0,
            line_width: 0.25,
        }
    }
}

/// Outcome of [`add_print_marks`]
#[derive(Debug, Clone, Serialize)]
pub struct MarksReport {
    pub output: PathBuf,
    pub page_count: usize,
}

/// Draw the marks of every page from its own box set.
pub fn add_print_marks(path: &Path, marks: &MarkOptions, options: &DocumentOptions) -> Result<MarksReport> {
    let mut session = Session::open(path, options.cancel.clone())?;
    let pages = session.read_geometry()?;

    for geometry in &pages {
        let boxes = geometry.boxes.materialized(geometry.analysis.effective);
        let bleed = boxes.get(BoxType::Bleed).unwrap_or(geometry.analysis.effective);
        let trim = boxes.get(BoxType::Trim).unwrap_or(bleed);

        let mut canvas = Canvas::new();
        draw_marks(&mut canvas, &bleed, &trim, marks);
        let mut contents = canvas.finish(session.doc_mut())?;

        let doc = session.doc_mut();
        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        page::prepend_content(doc, geometry.id, open_id)?;
        for stream in contents.drain(..) {
            page::append_content(doc, geometry.id, stream.as_reference()?)?;
        }
        session.checkpoint()?;
    }

    let output = options.target(path);
    let page_count = pages.len();
    write_document(session.into_document(), &output, page_count, &options.replace)?;

    info!(path = %path.display(), pages = page_count, "added print marks");
    Ok(MarksReport { output, page_count })
}

/// Marks in page space. Closes the `q` prepended to the page first.
fn draw_marks(canvas: &mut Canvas, bleed: &Rect, trim: &Rect, marks: &MarkOptions) {
    canvas.restore_state().save_state().set_line_width(marks.line_width);

    if marks.bleed_guides {
        canvas
            .set_stroke_color(0.0, 0.6, 1.0)
            .set_dash(&[3.0, 2.0])
            .rectangle(bleed)
            .set_dash(&[]);
    }
    if marks.trim_guides {
        canvas.set_stroke_color(1.0, 0.0, 1.0).rectangle(trim);
    }
    if marks.registration {
        canvas.set_stroke_color(0.0, 0.0, 0.0);
        let half = marks.mark_size / 2.0;
        let radius = marks.mark_size * 0.3;
        for (x, y) in [
            (trim.left, trim.bottom),
            (trim.right, trim.bottom),
            (trim.left, trim.top),
            (trim.right, trim.top),
        ] {
            canvas
                .ellipse(&Rect::new(x - radius, y - radius, x + radius, y + radius))
                .move_to(x - half, y)
                .line_to(x + half, y)
                .move_to(x, y - half)
                .line_to(x, y + half)
                .stroke();
        }
    }

    canvas.restore_state();
}
