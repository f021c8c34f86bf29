//! Document-level normalization passes
//!
//! - [`normalize_document`]: project every page into the dominant page size
//! - [`unify_boxes_only`]: rewrite all page boxes to one size, content untouched
//! - [`analyze_box_consistency`]: report box problems without writing anything

use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{info, warn};
use crate::boxes::{BoxAnalysis, BoxIssue, BoxType, PageBoxError};
use crate::cancel::CancelToken;
use crate::container::{choose_unified_box, mismatched_pages, select_container, CanonicalContainer};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::pdf::output::{write_document, ReplacePolicy};
use crate::pdf::page;
use crate::pdf::project::project_page;
use crate::pdf::session::{PageGeometry, Session};
use crate::transform::{compose, PageTransform};

/// Options shared by every operation that writes a document
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// Write here instead of replacing the input
    pub output_path: Option<PathBuf>,
    /// Retry settings for the final replace
    pub replace: ReplacePolicy,
    /// Checked between pages
    pub cancel: CancelToken,
}

impl DocumentOptions {
    /// Where the result of processing `input` is written
    pub fn target(&self, input: &Path) -> PathBuf {
        self.output_path.clone().unwrap_or_else(|| input.to_path_buf())
    }
}

/// Outcome of [`normalize_document`]
#[derive(Debug, Clone, Serialize)]
pub struct NormalizeReport {
    pub output: PathBuf,
    pub page_count: usize,
    pub container: CanonicalContainer,
    /// Transforms of the pages that were projected, in page order
    pub transforms: Vec<PageTransform>,
    /// Pages left as they were because no transform could be derived
    pub skipped: Vec<usize>,
    pub issues: Vec<PageBoxError>,
}

impl NormalizeReport {
    /// Pages whose content actually moved
    pub fn projected_count(&self) -> usize {
        self.transforms.iter().filter(|t| !t.is_identity()).count()
    }
}

/// Outcome of [`unify_boxes_only`]
#[derive(Debug, Clone, Serialize)]
pub struct UnifyReport {
    pub output: PathBuf,
    pub page_count: usize,
    pub unified_box: Rect,
    pub issues: Vec<PageBoxError>,
}

/// Outcome of [`analyze_box_consistency`]
#[derive(Debug, Clone, Serialize)]
pub struct BoxReport {
    pub path: PathBuf,
    pub page_count: usize,
    /// Dominant page size, if any page has a valid box
    pub container: Option<CanonicalContainer>,
    pub pages: Vec<BoxAnalysis>,
    /// Every problem found, size mismatches included
    pub errors: Vec<PageBoxError>,
}

impl BoxReport {
    pub fn is_consistent(&self) -> bool {
        self.errors.is_empty()
    }
}

fn collect_issues(pages: &[PageGeometry]) -> Vec<PageBoxError> {
    let issues: Vec<PageBoxError> = pages
        .iter()
        .flat_map(|p| p.analysis.errors.iter().cloned())
        .collect();
    for issue in &issues {
        warn!(page = issue.page_index + 1, box_type = issue.box_type.key(), "{}", issue.message);
    }
    issues
}

fn analyses(pages: &[PageGeometry]) -> Vec<BoxAnalysis> {
    pages.iter().map(|p| p.analysis.clone()).collect()
}

/// Project every page into the document's dominant page size.
///
/// Pages already at that size are left untouched apart from their boxes.
/// A page whose transform cannot be derived is kept as is and listed in
/// [`NormalizeReport::skipped`]. The result is staged and validated before it
/// replaces the destination.
///
/// # Example
///
/// ```no_run
/// use pdf_normalizer::pdf::{normalize_document, DocumentOptions};
/// use std::path::Path;
///
/// let report = normalize_document(Path::new("scan.pdf"), &DocumentOptions::default())
///     .expect("Failed to normalize");
/// println!("{} x {}", report.container.width, report.container.height);
/// ```
pub fn normalize_document(path: &Path, options: &DocumentOptions) -> Result<NormalizeReport> {
    let mut session = Session::open(path, options.cancel.clone())?;
    let pages = session.read_geometry()?;
    let issues = collect_issues(&pages);

    let container = select_container(&analyses(&pages))
        .ok_or_else(|| Error::NoValidBox(path.to_path_buf()))?;

    let mut transforms = Vec::with_capacity(pages.len());
    let mut skipped = Vec::new();

    for geometry in &pages {
        let analysis = &geometry.analysis;
        match compose(analysis.page_index, &analysis.effective, &container, analysis.rotation) {
            Ok(transform) => {
                project_page(session.doc_mut(), geometry.id, &transform, &container)?;
                transforms.push(transform);
            }
            Err(e @ Error::Geometry { .. }) => {
                warn!(page = analysis.page_index + 1, "skipping page: {}", e);
                skipped.push(analysis.page_index);
            }
            Err(e) => return Err(e),
        }
        session.checkpoint()?;
    }

    let output = options.target(path);
    let page_count = pages.len();
    write_document(session.into_document(), &output, page_count, &options.replace)?;

    let report = NormalizeReport {
        output,
        page_count,
        container,
        transforms,
        skipped,
        issues,
    };
    info!(
        path = %path.display(),
        pages = page_count,
        width = container.width,
        height = container.height,
        projected = report.projected_count(),
        "normalized document"
    );
    Ok(report)
}

/// Rewrite all five boxes of every page to the dominant box.
///
/// Content placement is not changed. Fails without writing anything when no
/// page has a valid box.
pub fn unify_boxes_only(path: &Path, options: &DocumentOptions) -> Result<UnifyReport> {
    let mut session = Session::open(path, options.cancel.clone())?;
    let pages = session.read_geometry()?;
    let issues = collect_issues(&pages);

    let unified_box = choose_unified_box(&analyses(&pages))
        .ok_or_else(|| Error::NoValidBox(path.to_path_buf()))?;

    for geometry in &pages {
        page::set_all_boxes(session.doc_mut(), geometry.id, &unified_box)?;
        session.checkpoint()?;
    }

    let output = options.target(path);
    let page_count = pages.len();
    write_document(session.into_document(), &output, page_count, &options.replace)?;

    info!(
        path = %path.display(),
        pages = page_count,
        width = unified_box.width(),
        height = unified_box.height(),
        "unified page boxes"
    );
    Ok(UnifyReport {
        output,
        page_count,
        unified_box,
        issues,
    })
}

/// Report box problems and pages that differ from the dominant size.
pub fn analyze_box_consistency(path: &Path) -> Result<BoxReport> {
    let session = Session::open(path, CancelToken::new())?;
    let pages = session.read_geometry()?;
    let analyses = analyses(&pages);
    let container = select_container(&analyses);

    let mut errors: Vec<PageBoxError> = analyses.iter().flat_map(|a| a.errors.iter().cloned()).collect();
    if let Some(container) = &container {
        errors.extend(mismatched_pages(&analyses, container).map(|a| {
            PageBoxError::new(
                a.page_index,
                BoxType::Media,
                BoxIssue::SizeMismatch,
                Some(a.effective),
                format!(
                    "page is {:.3} x {:.3}, document is {:.3} x {:.3}",
                    a.effective.width(),
                    a.effective.height(),
                    container.width,
                    container.height
                ),
            )
        }));
    }
    errors.sort_by_key(|e| e.page_index);

    info!(path = %path.display(), pages = pages.len(), issues = errors.len(), "analyzed page boxes");
    Ok(BoxReport {
        path: path.to_path_buf(),
        page_count: pages.len(),
        container,
        pages: analyses,
        errors,
    })
}
