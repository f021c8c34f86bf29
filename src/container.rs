//! Canonical container selection by majority vote
//!
//! Pages are grouped by their effective box size rounded to three decimals.
//! The largest group wins; ties go to the group seen first. Using the
//! dominant size rather than page 1 keeps a single malformed first page from
//! distorting the whole document.

use serde::Serialize;
use crate::boxes::BoxAnalysis;
use crate::geometry::{round3, Rect};

/// Target page size for one normalization pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanonicalContainer {
    pub width: f64,
    pub height: f64,
}

impl CanonicalContainer {
    /// The container as a box anchored at the origin
    pub fn rect(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }
}

struct SizeGroup {
    key: (i64, i64),
    count: usize,
    first: Rect,
}

/// Group rectangles by rounded size and return the winning group's first
/// member. Pages whose effective box did not come from the page itself are
/// not eligible.
fn majority_box(analyses: &[BoxAnalysis]) -> Option<Rect> {
    let mut groups: Vec<SizeGroup> = Vec::new();

    for analysis in analyses.iter().filter(|a| a.source.is_own()) {
        let rect = analysis.effective;
        // Milli-point integers make the rounded sizes exact hash keys.
        let key = (
            (round3(rect.width()) * 1000.0).round() as i64,
            (round3(rect.height()) * 1000.0).round() as i64,
        );
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.count += 1,
            None => groups.push(SizeGroup { key, count: 1, first: rect }),
        }
    }

    let mut best: Option<&SizeGroup> = None;
    for group in &groups {
        // Strictly greater: earlier groups keep ties.
        if best.map_or(true, |b| group.count > b.count) {
            best = Some(group);
        }
    }
    best.map(|g| g.first)
}

/// Pick the container every page of the document is projected into.
///
/// Returns `None` when no page has a valid box of its own.
pub fn select_container(analyses: &[BoxAnalysis]) -> Option<CanonicalContainer> {
    majority_box(analyses).map(|rect| CanonicalContainer {
        width: round3(rect.width()),
        height: round3(rect.height()),
    })
}

/// Pick the one box every page's five boxes are rewritten to.
///
/// Same vote as [`select_container`], but keeps the winning box's origin so
/// content placement is not disturbed.
pub fn choose_unified_box(analyses: &[BoxAnalysis]) -> Option<Rect> {
    majority_box(analyses)
}

/// Pages whose effective size differs from the container.
pub fn mismatched_pages<'a>(
    analyses: &'a [BoxAnalysis],
    container: &'a CanonicalContainer,
) -> impl Iterator<Item = &'a BoxAnalysis> + 'a {
    analyses.iter().filter(move |a| {
        round3(a.effective.width()) != container.width
            || round3(a.effective.height()) != container.height
    })
}
