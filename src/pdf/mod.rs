//! PDF reading, re-projection and writing using lopdf

pub mod page;
pub mod canvas;
pub mod fonts;
pub mod session;
pub mod output;
pub mod project;
pub mod normalize;
pub mod overlay;
pub mod rotate;
pub mod marks;

// Re-export commonly used items
pub use normalize::{
    analyze_box_consistency, normalize_document, unify_boxes_only, BoxReport, DocumentOptions,
    NormalizeReport, UnifyReport,
};
pub use overlay::{insert_overlay_page, InsertPosition, InsertReport, OverlayOptions};
pub use rotate::{rotate_all_pages, RotateOutcome};
pub use marks::{add_print_marks, MarkOptions, MarksReport};
pub use output::{ReplacePolicy, StagedOutput};
pub use page::ContentHandle;
