//! Per-page coordinate system analysis for placing new content

use serde::Serialize;
use crate::boxes::{BoxType, PageBoxSet};
use crate::geometry::{rotate_about, Matrix, Rect, Rotation};

/// Bottom offset, as a fraction of the page height, beyond which the page is
/// assumed to use a non-standard (top-down) coordinate system.
const INVERTED_ORIGIN_RATIO: f64 = 0.1;

/// Where new content may be drawn on a page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateInfo {
    pub page_width: f64,
    pub page_height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub usable_width: f64,
    pub usable_height: f64,
    pub rotation: Rotation,
    pub is_inverted_y: bool,
    /// Center of the effective box, the pivot for rotation
    #[serde(skip)]
    center: (f64, f64),
}

/// Innermost boxes first
const USABLE_ORDER: [BoxType; 5] = [
    BoxType::Art,
    BoxType::Trim,
    BoxType::Bleed,
    BoxType::Crop,
    BoxType::Media,
];

/// Derive the coordinate info of a page from its boxes.
///
/// The usable area is the innermost valid box the page declares, clipped to
/// the effective box so it can never be larger than the page.
pub fn resolve(boxes: &PageBoxSet, effective: &Rect, rotation: Rotation) -> CoordinateInfo {
    let usable = USABLE_ORDER
        .iter()
        .filter_map(|box_type| boxes.get(*box_type))
        .filter(Rect::is_valid)
        .find_map(|rect| rect.intersection(effective))
        .unwrap_or(*effective);

    let bottom_drift = (usable.bottom - effective.bottom).abs();
    let is_inverted_y =
        rotation.is_quarter_turn() || bottom_drift > INVERTED_ORIGIN_RATIO * effective.height();

    CoordinateInfo {
        page_width: effective.width(),
        page_height: effective.height(),
        origin_x: usable.left,
        origin_y: usable.bottom,
        usable_width: usable.width(),
        usable_height: usable.height(),
        rotation,
        is_inverted_y,
        center: effective.center(),
    }
}

impl CoordinateInfo {
    /// Usable area in page space
    pub fn usable_rect(&self) -> Rect {
        Rect::new(
            self.origin_x,
            self.origin_y,
            self.origin_x + self.usable_width,
            self.origin_y + self.usable_height,
        )
    }

    /// Map a point given relative to the usable area into page space:
    /// offset by the origin, flip Y inside the usable area when the page is
    /// treated as inverted, then rotate about the page center.
    ///
    /// This is a point mapping for callers placing single marks. Overlay
    /// text is drawn through [`text_frame`](Self::text_frame) instead, which
    /// keeps whole text blocks upright on rotated pages.
    pub fn transform_coordinates(&self, x: f64, y: f64) -> (f64, f64) {
        let px = self.origin_x + x;
        let py = if self.is_inverted_y {
            self.origin_y + self.usable_height - y
        } else {
            self.origin_y + y
        };
        rotate_about((px, py), self.center, self.rotation)
    }

    /// The usable area as the reader sees it on screen, and the matrix that
    /// carries that frame onto the page.
    ///
    /// Returns `(frame_width, frame_height, matrix)`. Quarter turns swap the
    /// frame's extents; content laid out in the frame and drawn through the
    /// matrix appears upright.
    pub fn text_frame(&self) -> (f64, f64, Matrix) {
        let (frame_width, frame_height) = if self.rotation.is_quarter_turn() {
            (self.usable_height, self.usable_width)
        } else {
            (self.usable_width, self.usable_height)
        };
        let matrix = self
            .rotation
            .frame_matrix(frame_width, frame_height)
            .then(&Matrix::translate(self.origin_x, self.origin_y));
        (frame_width, frame_height, matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> Rect {
        Rect::from_size(210.0, 297.0)
    }

    #[test]
    fn test_usable_defaults_to_media() {
        let info = resolve(&PageBoxSet::with_media(media()), &media(), Rotation::R0);
        assert_eq!(info.usable_width, 210.0);
        assert_eq!(info.usable_height, 297.0);
        assert_eq!((info.origin_x, info.origin_y), (0.0, 0.0));
        assert!(!info.is_inverted_y);
    }

    #[test]
    fn test_innermost_box_wins() {
        let boxes = PageBoxSet {
            trim: Some(Rect::new(10.0, 10.0, 200.0, 287.0)),
            bleed: Some(Rect::new(5.0, 5.0, 205.0, 292.0)),
            ..PageBoxSet::with_media(media())
        };
        let info = resolve(&boxes, &media(), Rotation::R0);
        assert_eq!(info.usable_rect(), Rect::new(10.0, 10.0, 200.0, 287.0));
        assert!(info.usable_width <= info.page_width);
    }

    #[test]
    fn test_usable_is_clipped_to_page() {
        let boxes = PageBoxSet {
            art: Some(Rect::new(-20.0, 0.0, 100.0, 100.0)),
            ..PageBoxSet::with_media(media())
        };
        let info = resolve(&boxes, &media(), Rotation::R0);
        assert_eq!(info.usable_rect(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_quarter_turn_marks_inverted() {
        let info = resolve(&PageBoxSet::with_media(media()), &media(), Rotation::R90);
        assert!(info.is_inverted_y);
        let info = resolve(&PageBoxSet::with_media(media()), &media(), Rotation::R180);
        assert!(!info.is_inverted_y);
    }

    #[test]
    fn test_shifted_bottom_marks_inverted() {
        let boxes = PageBoxSet {
            art: Some(Rect::new(0.0, 60.0, 210.0, 297.0)),
            ..PageBoxSet::with_media(media())
        };
        let info = resolve(&boxes, &media(), Rotation::R0);
        assert!(info.is_inverted_y);
    }

    #[test]
    fn test_transform_coordinates_offsets_and_flips() {
        let boxes = PageBoxSet {
            art: Some(Rect::new(10.0, 50.0, 200.0, 297.0)),
            ..PageBoxSet::with_media(media())
        };
        let info = resolve(&boxes, &media(), Rotation::R0);
        assert!(info.is_inverted_y);
        let (x, y) = info.transform_coordinates(5.0, 0.0);
        assert!((x - 15.0).abs() < 1e-9);
        assert!((y - 297.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_coordinates_rotates_last() {
        let square = Rect::from_size(100.0, 100.0);
        let info = resolve(&PageBoxSet::with_media(square), &square, Rotation::R180);
        let (x, y) = info.transform_coordinates(10.0, 20.0);
        assert!((x - 90.0).abs() < 1e-9);
        assert!((y - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_frame_swaps_for_quarter_turns() {
        let boxes = PageBoxSet {
            art: Some(Rect::new(10.0, 10.0, 200.0, 287.0)),
            ..PageBoxSet::with_media(media())
        };
        let info = resolve(&boxes, &media(), Rotation::R90);
        let (w, h, matrix) = info.text_frame();
        assert_eq!((w, h), (277.0, 190.0));
        let placed = Rect::from_size(w, h).transformed(&matrix);
        assert_eq!(placed, info.usable_rect());
    }
}
