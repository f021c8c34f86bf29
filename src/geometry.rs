//! Rectangles, affine matrices and page rotation
//!
//! All values are in PDF points (1/72 inch) with the PDF convention of a
//! bottom-left origin.

use serde::Serialize;
use crate::error::{Error, Result};

/// Smallest width/height a box may have and still count as valid.
pub const MIN_BOX_EXTENT: f64 = 0.1;

/// Tolerance used for edge comparisons between boxes.
pub const EDGE_EPSILON: f64 = 1e-6;

/// Round to 6 decimal places.
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Round to 3 decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1e3).round() / 1e3
}

/// An axis-aligned rectangle `{left, bottom, right, top}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Rect {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self { left, bottom, right, top }
    }

    /// Build a rectangle from two arbitrary corners, the way viewers read
    /// box arrays whose corners are swapped.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }
    }

    /// Rectangle with its origin at (0, 0)
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// A4 (210mm × 297mm) in points, the last-resort page size.
    pub fn a4() -> Self {
        Self::from_size(595.0, 842.0)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.bottom + self.top) / 2.0)
    }

    /// Finite coordinates and both extents above [`MIN_BOX_EXTENT`].
    pub fn is_valid(&self) -> bool {
        [self.left, self.bottom, self.right, self.top]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > MIN_BOX_EXTENT
            && self.height() > MIN_BOX_EXTENT
    }

    /// True when `self` lies entirely inside `outer`.
    pub fn is_within(&self, outer: &Rect) -> bool {
        self.left >= outer.left - EDGE_EPSILON
            && self.bottom >= outer.bottom - EDGE_EPSILON
            && self.right <= outer.right + EDGE_EPSILON
            && self.top <= outer.top + EDGE_EPSILON
    }

    /// Overlap of two rectangles, if it is itself a valid box.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let rect = Rect::new(
            self.left.max(other.left),
            self.bottom.max(other.bottom),
            self.right.min(other.right),
            self.top.min(other.top),
        );
        rect.is_valid().then_some(rect)
    }

    /// Bounding box of this rectangle after an affine transform.
    pub fn transformed(&self, matrix: &Matrix) -> Rect {
        let corners = [
            matrix.apply(self.left, self.bottom),
            matrix.apply(self.right, self.bottom),
            matrix.apply(self.left, self.top),
            matrix.apply(self.right, self.top),
        ];
        let xs = corners.iter().map(|p| p.0);
        let ys = corners.iter().map(|p| p.1);
        Rect::new(
            xs.clone().fold(f64::INFINITY, f64::min),
            ys.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
            ys.fold(f64::NEG_INFINITY, f64::max),
        )
    }
}

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    /// Identity matrix (no transformation)
    pub fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self { e: tx, f: ty, ..Self::identity() }
    }

    /// Uniform scale followed by a translation
    pub fn scale_translate(scale: f64, tx: f64, ty: f64) -> Self {
        Self { a: scale, b: 0.0, c: 0.0, d: scale, e: tx, f: ty }
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Calculate the inverse of this transformation matrix
    pub fn inverse(&self) -> Option<Self> {
        // | a  c  e |
        // | b  d  f |
        // | 0  0  1 |
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 {
            return None;
        }

        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Check if this is (approximately) the identity matrix
    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 1e-6
            && self.b.abs() < 1e-6
            && self.c.abs() < 1e-6
            && (self.d - 1.0).abs() < 1e-6
            && self.e.abs() < 1e-6
            && self.f.abs() < 1e-6
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Clockwise page rotation, restricted to quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Normalize raw degrees into `[0, 360)` and map onto a quarter turn.
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            _ => Err(Error::UnsupportedRotation(degrees)),
        }
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Rotation that undoes this one (360 − R mod 360).
    pub fn inverse(self) -> Self {
        match self {
            Rotation::R0 => Rotation::R0,
            Rotation::R90 => Rotation::R270,
            Rotation::R180 => Rotation::R180,
            Rotation::R270 => Rotation::R90,
        }
    }

    /// Adds another rotation (clockwise).
    pub fn add(self, other: Rotation) -> Self {
        match (self.degrees() + other.degrees()) % 360 {
            90 => Rotation::R90,
            180 => Rotation::R180,
            270 => Rotation::R270,
            _ => Rotation::R0,
        }
    }

    /// True for 90 and 270, where width and height trade places on screen.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }

    /// Exact (cos, sin) of the clockwise angle.
    fn cos_sin(self) -> (f64, f64) {
        match self {
            Rotation::R0 => (1.0, 0.0),
            Rotation::R90 => (0.0, 1.0),
            Rotation::R180 => (-1.0, 0.0),
            Rotation::R270 => (0.0, -1.0),
        }
    }

    /// Clockwise rotation about `(cx, cy)`.
    pub fn about(self, cx: f64, cy: f64) -> Matrix {
        let (cos, sin) = self.cos_sin();
        let rotate = Matrix { a: cos, b: -sin, c: sin, d: cos, e: 0.0, f: 0.0 };
        Matrix::translate(-cx, -cy)
            .then(&rotate)
            .then(&Matrix::translate(cx, cy))
    }

    /// Maps a frame as the viewer shows it (`frame_width` × `frame_height`,
    /// after this rotation was applied for display) back onto the unrotated
    /// page, whose extent is the frame with the axes swapped for quarter
    /// turns. Content drawn through this matrix appears upright on screen.
    pub fn frame_matrix(self, frame_width: f64, frame_height: f64) -> Matrix {
        match self {
            Rotation::R0 => Matrix::identity(),
            Rotation::R90 => Matrix { a: 0.0, b: 1.0, c: -1.0, d: 0.0, e: frame_height, f: 0.0 },
            Rotation::R180 => Matrix { a: -1.0, b: 0.0, c: 0.0, d: -1.0, e: frame_width, f: frame_height },
            Rotation::R270 => Matrix { a: 0.0, b: -1.0, c: 1.0, d: 0.0, e: 0.0, f: frame_width },
        }
    }
}

/// Rotate a point clockwise about `center`.
pub fn rotate_about(point: (f64, f64), center: (f64, f64), rotation: Rotation) -> (f64, f64) {
    let matrix = rotation.about(center.0, center.1);
    matrix.apply(point.0, point.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let rect = Rect::new(10.0, 20.0, 50.0, 80.0);
        assert_eq!(rect.width(), 40.0);
        assert_eq!(rect.height(), 60.0);
        assert_eq!(rect.center(), (30.0, 50.0));
    }

    #[test]
    fn test_rect_from_swapped_corners() {
        let rect = Rect::from_corners(210.0, 297.0, 0.0, 0.0);
        assert_eq!(rect, Rect::from_size(210.0, 297.0));
    }

    #[test]
    fn test_rect_validity() {
        assert!(Rect::from_size(210.0, 297.0).is_valid());
        assert!(!Rect::from_size(0.1, 297.0).is_valid());
        assert!(!Rect::from_size(210.0, 0.0).is_valid());
        assert!(!Rect::new(f64::NAN, 0.0, 10.0, 10.0).is_valid());
    }

    #[test]
    fn test_rect_nesting() {
        let media = Rect::from_size(210.0, 297.0);
        assert!(Rect::new(5.0, 5.0, 205.0, 292.0).is_within(&media));
        assert!(media.is_within(&media));
        assert!(!Rect::new(-5.0, 0.0, 215.0, 297.0).is_within(&media));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::from_size(100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 150.0, 150.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 50.0, 100.0, 100.0)));
        assert_eq!(a.intersection(&Rect::new(200.0, 200.0, 300.0, 300.0)), None);
    }

    #[test]
    fn test_matrix_inverse() {
        let m = Matrix::scale_translate(0.5, 10.0, 20.0);
        let inv = m.inverse().expect("invertible");
        assert!(m.then(&inv).is_identity());
        assert!(Matrix { a: 0.0, d: 0.0, ..Matrix::identity() }.inverse().is_none());
    }

    #[test]
    fn test_matrix_then_order() {
        let scale = Matrix::scale_translate(2.0, 0.0, 0.0);
        let shift = Matrix::translate(10.0, 0.0);
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 2.0));
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0).unwrap(), Rotation::R0);
        assert_eq!(Rotation::from_degrees(450).unwrap(), Rotation::R90);
        assert_eq!(Rotation::from_degrees(-90).unwrap(), Rotation::R270);
        assert!(matches!(
            Rotation::from_degrees(45),
            Err(Error::UnsupportedRotation(45))
        ));
    }

    #[test]
    fn test_rotation_round_trip() {
        let center = (105.0, 148.5);
        let point = (12.5, 280.25);
        for rotation in [Rotation::R90, Rotation::R180, Rotation::R270] {
            let turned = rotate_about(point, center, rotation);
            let back = rotate_about(turned, center, rotation.inverse());
            assert!((back.0 - point.0).abs() < 1e-3);
            assert!((back.1 - point.1).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rotate_about_is_clockwise() {
        // Point above the center ends up to its right after a clockwise quarter turn.
        let p = rotate_about((0.0, 10.0), (0.0, 0.0), Rotation::R90);
        assert!((p.0 - 10.0).abs() < 1e-9);
        assert!(p.1.abs() < 1e-9);
    }

    #[test]
    fn test_frame_matrix_covers_unrotated_page() {
        // A 90° page of 200×300 is shown as 300×200.
        let m = Rotation::R90.frame_matrix(300.0, 200.0);
        let bounds = Rect::from_size(300.0, 200.0).transformed(&m);
        assert_eq!(bounds, Rect::from_size(200.0, 300.0));

        let m = Rotation::R270.frame_matrix(300.0, 200.0);
        assert_eq!(Rect::from_size(300.0, 200.0).transformed(&m), Rect::from_size(200.0, 300.0));

        let m = Rotation::R180.frame_matrix(200.0, 300.0);
        assert_eq!(Rect::from_size(200.0, 300.0).transformed(&m), Rect::from_size(200.0, 300.0));
    }

    #[test]
    fn test_frame_round_trip() {
        let m = Rotation::R90.frame_matrix(300.0, 200.0);
        let back = Rotation::R270.frame_matrix(200.0, 300.0);
        let (x, y) = m.then(&back).apply(17.0, 42.0);
        assert!((x - 17.0).abs() < 1e-9 && (y - 42.0).abs() < 1e-9);
    }
}
