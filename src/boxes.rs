//! Page box model and effective-box resolution
//!
//! A page may carry up to five boxes. Only `MediaBox` is mandatory; the others
//! inherit from the next enclosing box when they are absent or unusable:
//! crop ← media, bleed ← crop, trim ← bleed, art ← trim.

use serde::Serialize;
use crate::geometry::{Rect, Rotation};

/// The five PDF page boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoxType {
    Media,
    Crop,
    Trim,
    Bleed,
    Art,
}

impl BoxType {
    /// All box types, outermost first
    pub const ALL: [BoxType; 5] = [
        BoxType::Media,
        BoxType::Crop,
        BoxType::Bleed,
        BoxType::Trim,
        BoxType::Art,
    ];

    /// Dictionary key of this box on a page object
    pub fn key(self) -> &'static str {
        match self {
            BoxType::Media => "MediaBox",
            BoxType::Crop => "CropBox",
            BoxType::Trim => "TrimBox",
            BoxType::Bleed => "BleedBox",
            BoxType::Art => "ArtBox",
        }
    }

    /// Box this one falls back to when it is missing or invalid.
    pub fn parent(self) -> Option<BoxType> {
        match self {
            BoxType::Media => None,
            BoxType::Crop => Some(BoxType::Media),
            BoxType::Bleed => Some(BoxType::Crop),
            BoxType::Trim => Some(BoxType::Bleed),
            BoxType::Art => Some(BoxType::Trim),
        }
    }
}

/// Raw boxes of one page, as read from the document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageBoxSet {
    pub media: Option<Rect>,
    pub crop: Option<Rect>,
    pub trim: Option<Rect>,
    pub bleed: Option<Rect>,
    pub art: Option<Rect>,
}

impl PageBoxSet {
    /// A set with only a media box
    pub fn with_media(media: Rect) -> Self {
        Self { media: Some(media), ..Default::default() }
    }

    /// Every box set to the same rectangle
    pub fn uniform(rect: Rect) -> Self {
        Self {
            media: Some(rect),
            crop: Some(rect),
            trim: Some(rect),
            bleed: Some(rect),
            art: Some(rect),
        }
    }

    pub fn get(&self, box_type: BoxType) -> Option<Rect> {
        *self.slot(box_type)
    }

    pub fn set(&mut self, box_type: BoxType, rect: Option<Rect>) {
        *self.slot_mut(box_type) = rect;
    }

    fn slot(&self, box_type: BoxType) -> &Option<Rect> {
        match box_type {
            BoxType::Media => &self.media,
            BoxType::Crop => &self.crop,
            BoxType::Trim => &self.trim,
            BoxType::Bleed => &self.bleed,
            BoxType::Art => &self.art,
        }
    }

    fn slot_mut(&mut self, box_type: BoxType) -> &mut Option<Rect> {
        match box_type {
            BoxType::Media => &mut self.media,
            BoxType::Crop => &mut self.crop,
            BoxType::Trim => &mut self.trim,
            BoxType::Bleed => &mut self.bleed,
            BoxType::Art => &mut self.art,
        }
    }

    /// The box as a viewer would use it, following the inheritance chain.
    /// Returns `None` only when no box up to the media box is valid.
    pub fn resolved(&self, box_type: BoxType) -> Option<Rect> {
        match self.get(box_type).filter(Rect::is_valid) {
            Some(rect) => Some(rect),
            None => box_type.parent().and_then(|parent| self.resolved(parent)),
        }
    }

    /// All five boxes with inheritance applied, falling back to `fallback`.
    pub fn materialized(&self, fallback: Rect) -> PageBoxSet {
        let mut out = PageBoxSet::default();
        for box_type in BoxType::ALL {
            out.set(box_type, Some(self.resolved(box_type).unwrap_or(fallback)));
        }
        out
    }
}

/// What went wrong with a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoxIssue {
    /// The box is required but absent
    Missing,
    /// The entry is not an array of four numbers
    Malformed,
    /// Width or height is too small (or not finite)
    Invalid,
    /// The crop box extends beyond the media box
    NotNested,
    /// The page differs from the document's dominant page size
    SizeMismatch,
    /// The page's /Rotate is not a quarter turn
    Rotation,
}

/// A box validation problem. Produced, never thrown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBoxError {
    pub page_index: usize,
    pub box_type: BoxType,
    pub kind: BoxIssue,
    pub message: String,
    pub width: f64,
    pub height: f64,
}

impl PageBoxError {
    pub fn new(page_index: usize, box_type: BoxType, kind: BoxIssue, rect: Option<Rect>, message: impl Into<String>) -> Self {
        Self {
            page_index,
            box_type,
            kind,
            message: message.into(),
            width: rect.map(|r| r.width()).unwrap_or(0.0),
            height: rect.map(|r| r.height()).unwrap_or(0.0),
        }
    }
}

/// Which link of the fallback chain produced the effective box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoxSource {
    Crop,
    Media,
    PreviousPage,
    Default,
}

impl BoxSource {
    /// Whether the box came from the page itself
    pub fn is_own(self) -> bool {
        matches!(self, BoxSource::Crop | BoxSource::Media)
    }
}

/// Result of analysing one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxAnalysis {
    pub page_index: usize,
    pub effective: Rect,
    pub source: BoxSource,
    pub rotation: Rotation,
    pub errors: Vec<PageBoxError>,
}

/// Resolve the effective box and rotation of a page.
///
/// Never fails: the crop box is used when it is valid and nested inside the
/// media box, then the media box, then `previous` (the effective box of the
/// page before), then A4. Every problem met on the way is recorded in
/// [`BoxAnalysis::errors`].
pub fn analyze_page(
    page_index: usize,
    boxes: &PageBoxSet,
    raw_rotation: i64,
    previous: Option<&Rect>,
) -> BoxAnalysis {
    let mut errors = Vec::new();

    let media = match boxes.media {
        Some(media) if media.is_valid() => Some(media),
        Some(media) => {
            errors.push(PageBoxError::new(
                page_index,
                BoxType::Media,
                BoxIssue::Invalid,
                Some(media),
                format!("MediaBox {:.3} x {:.3} is too small", media.width(), media.height()),
            ));
            None
        }
        None => {
            errors.push(PageBoxError::new(
                page_index,
                BoxType::Media,
                BoxIssue::Missing,
                None,
                "MediaBox is missing",
            ));
            None
        }
    };

    let crop = boxes.crop.and_then(|crop| {
        if !crop.is_valid() {
            errors.push(PageBoxError::new(
                page_index,
                BoxType::Crop,
                BoxIssue::Invalid,
                Some(crop),
                format!("CropBox {:.3} x {:.3} is too small", crop.width(), crop.height()),
            ));
            return None;
        }
        match media {
            Some(media) if crop.is_within(&media) => Some(crop),
            Some(_) => {
                errors.push(PageBoxError::new(
                    page_index,
                    BoxType::Crop,
                    BoxIssue::NotNested,
                    Some(crop),
                    "CropBox extends beyond MediaBox",
                ));
                None
            }
            None => None,
        }
    });

    for box_type in [BoxType::Bleed, BoxType::Trim, BoxType::Art] {
        if let Some(rect) = boxes.get(box_type).filter(|r| !r.is_valid()) {
            errors.push(PageBoxError::new(
                page_index,
                box_type,
                BoxIssue::Invalid,
                Some(rect),
                format!("{} {:.3} x {:.3} is too small", box_type.key(), rect.width(), rect.height()),
            ));
        }
    }

    let (effective, source) = match (crop, media, previous) {
        (Some(crop), _, _) => (crop, BoxSource::Crop),
        (None, Some(media), _) => (media, BoxSource::Media),
        (None, None, Some(previous)) => (*previous, BoxSource::PreviousPage),
        (None, None, None) => (Rect::a4(), BoxSource::Default),
    };

    let rotation = Rotation::from_degrees(raw_rotation).unwrap_or_else(|_| {
        errors.push(PageBoxError::new(
            page_index,
            BoxType::Media,
            BoxIssue::Rotation,
            None,
            format!("Rotate {} is not a multiple of 90; treated as 0", raw_rotation),
        ));
        Rotation::R0
    });

    BoxAnalysis { page_index, effective, source, rotation, errors }
}

/// Analyse every page in order, threading the previous effective box through.
pub fn analyze_pages<'a, I>(pages: I) -> Vec<BoxAnalysis>
where
    I: IntoIterator<Item = (&'a PageBoxSet, i64)>,
{
    let mut analyses: Vec<BoxAnalysis> = Vec::new();
    for (index, (boxes, rotation)) in pages.into_iter().enumerate() {
        let previous = analyses.last().map(|a| a.effective);
        analyses.push(analyze_page(index, boxes, rotation, previous.as_ref()));
    }
    analyses
}
