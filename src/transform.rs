//! Per-page transform into the canonical container
//!
//! The transform is a uniform scale plus a centering translation. Rotation
//! travels alongside as a page attribute and is never folded into the
//! matrix, so the scale/translate derivation stays rotation-agnostic.

use serde::Serialize;
use crate::container::CanonicalContainer;
use crate::error::{Error, Result};
use crate::geometry::{round6, Matrix, Rect, Rotation};

/// Scales within this distance of 1.0 are treated as exactly 1.0.
const UNIT_SCALE_EPSILON: f64 = 1e-6;

/// How one source page maps into the canonical container
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageTransform {
    pub source_page_index: usize,
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotation: Rotation,
    pub source_box: Rect,
    pub target_box: Rect,
}

impl PageTransform {
    /// The `cm` matrix placing source content inside the target box
    pub fn matrix(&self) -> Matrix {
        Matrix {
            a: self.scale_x,
            b: 0.0,
            c: 0.0,
            d: self.scale_y,
            e: self.translate_x,
            f: self.translate_y,
        }
    }

    /// True when the source already matches the container exactly.
    pub fn is_identity(&self) -> bool {
        self.matrix().is_identity()
    }
}

/// Derive the transform for one page.
///
/// Intermediate values are rounded to six decimals so long documents do not
/// accumulate drift.
pub fn compose(
    source_page_index: usize,
    source_box: &Rect,
    container: &CanonicalContainer,
    rotation: Rotation,
) -> Result<PageTransform> {
    let source_width = source_box.width();
    let source_height = source_box.height();

    let scale_x = round6(container.width / source_width);
    let scale_y = round6(container.height / source_height);
    let mut scale = scale_x.min(scale_y);

    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Geometry {
            page_index: source_page_index,
            message: format!(
                "cannot scale a {:.3} x {:.3} box into {:.3} x {:.3}",
                source_width, source_height, container.width, container.height
            ),
        });
    }
    if (scale - 1.0).abs() < UNIT_SCALE_EPSILON {
        scale = 1.0;
    }

    let scaled_width = round6(source_width * scale);
    let scaled_height = round6(source_height * scale);

    let translate_x = round6((container.width - scaled_width) / 2.0 - source_box.left * scale);
    let translate_y = round6((container.height - scaled_height) / 2.0 - source_box.bottom * scale);

    Ok(PageTransform {
        source_page_index,
        scale_x: scale,
        scale_y: scale,
        translate_x,
        translate_y,
        rotation,
        source_box: *source_box,
        target_box: container.rect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4_container() -> CanonicalContainer {
        CanonicalContainer { width: 210.0, height: 297.0 }
    }

    #[test]
    fn test_matching_page_is_identity() {
        let t = compose(0, &Rect::from_size(210.0, 297.0), &a4_container(), Rotation::R0).unwrap();
        assert_eq!(t.scale_x, 1.0);
        assert_eq!((t.translate_x, t.translate_y), (0.0, 0.0));
        assert!(t.is_identity());
    }

    #[test]
    fn test_landscape_page_is_letterboxed() {
        let t = compose(1, &Rect::from_size(297.0, 210.0), &a4_container(), Rotation::R0).unwrap();
        assert!((t.scale_x - 0.707071).abs() < 1e-6);
        assert_eq!(t.scale_x, t.scale_y);
        assert!(t.translate_x.abs() < 1e-4);
        assert!((t.translate_y - 74.25).abs() < 1e-2);
        assert!(!t.is_identity());
    }

    #[test]
    fn test_origin_offset_is_cancelled() {
        let source = Rect::new(50.0, 100.0, 260.0, 397.0);
        let t = compose(0, &source, &a4_container(), Rotation::R0).unwrap();
        assert_eq!(t.scale_x, 1.0);
        assert_eq!((t.translate_x, t.translate_y), (-50.0, -100.0));
        let placed = source.transformed(&t.matrix());
        assert_eq!(placed, a4_container().rect());
    }

    #[test]
    fn test_rotation_is_carried_not_applied() {
        let t = compose(0, &Rect::from_size(210.0, 297.0), &a4_container(), Rotation::R90).unwrap();
        assert_eq!(t.rotation, Rotation::R90);
        assert!(t.is_identity());
    }

    #[test]
    fn test_degenerate_source_is_geometry_error() {
        let result = compose(4, &Rect::from_size(0.0, 297.0), &a4_container(), Rotation::R0);
        assert!(matches!(result, Err(Error::Geometry { page_index: 4, .. })));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: scale is always uniform
        #[test]
        fn scale_is_uniform(
            sw in 1.0f64..5000.0, sh in 1.0f64..5000.0,
            cw in 1.0f64..5000.0, ch in 1.0f64..5000.0,
        ) {
            let container = CanonicalContainer { width: cw, height: ch };
            let t = compose(0, &Rect::from_size(sw, sh), &container, Rotation::R0).unwrap();
            prop_assert_eq!(t.scale_x, t.scale_y);
        }

        /// Property: scaled content is centered inside the container
        #[test]
        fn content_is_centered(
            left in -500.0f64..500.0, bottom in -500.0f64..500.0,
            sw in 10.0f64..2000.0, sh in 10.0f64..2000.0,
            cw in 10.0f64..2000.0, ch in 10.0f64..2000.0,
        ) {
            let source = Rect::new(left, bottom, left + sw, bottom + sh);
            let container = CanonicalContainer { width: cw, height: ch };
            let t = compose(0, &source, &container, Rotation::R0).unwrap();
            let placed = source.transformed(&t.matrix());

            let left_margin = placed.left;
            let right_margin = cw - placed.right;
            let bottom_margin = placed.bottom;
            let top_margin = ch - placed.top;
            prop_assert!((left_margin - right_margin).abs() < 1e-4);
            prop_assert!((bottom_margin - top_margin).abs() < 1e-4);
        }
    }
}
