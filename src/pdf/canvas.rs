//! Content stream builder
//!
//! A canvas is a list of segments: runs of drawing operations, and existing
//! content streams drawn by reference. Finishing the canvas turns each run
//! into a new stream object and returns the page's /Contents array, with the
//! referenced streams spliced in unchanged.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use crate::error::Result;
use crate::geometry::{Matrix, Rect};
use crate::pdf::page::{number, ContentHandle};

/// Bezier control distance for a quarter circle of radius 1
const KAPPA: f64 = 0.552_284_75;

#[derive(Debug)]
enum Segment {
    Operations(Vec<Operation>),
    Streams(Vec<lopdf::ObjectId>),
}

/// Builds the /Contents of one page
#[derive(Debug, Default)]
pub struct Canvas {
    segments: Vec<Segment>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) -> &mut Self {
        let op = Operation::new(operator, operands);
        match self.segments.last_mut() {
            Some(Segment::Operations(ops)) => ops.push(op),
            _ => self.segments.push(Segment::Operations(vec![op])),
        }
        self
    }

    /// `q`
    pub fn save_state(&mut self) -> &mut Self {
        self.push("q", vec![])
    }

    /// `Q`
    pub fn restore_state(&mut self) -> &mut Self {
        self.push("Q", vec![])
    }

    /// `cm`
    pub fn concat_matrix(&mut self, matrix: &Matrix) -> &mut Self {
        let operands = matrix.to_array().iter().map(|v| number(*v)).collect();
        self.push("cm", operands)
    }

    /// Intersect the clip path with a rectangle: `re W n`
    pub fn clip_rect(&mut self, rect: &Rect) -> &mut Self {
        self.push("re", rect_operands(rect));
        self.push("W", vec![]);
        self.push("n", vec![])
    }

    /// Draw another page's content in the current graphics state.
    ///
    /// Only the stream ids are recorded; the bytes are never touched.
    pub fn draw_reference(&mut self, handle: &ContentHandle) -> &mut Self {
        if !handle.is_empty() {
            self.segments.push(Segment::Streams(handle.streams().to_vec()));
        }
        self
    }

    /// DeviceRGB stroke color, components in `[0, 1]`
    pub fn set_stroke_color(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.push("RG", vec![number(r), number(g), number(b)])
    }

    /// DeviceRGB fill color, components in `[0, 1]`
    pub fn set_fill_color(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.push("rg", vec![number(r), number(g), number(b)])
    }

    pub fn set_line_width(&mut self, width: f64) -> &mut Self {
        self.push("w", vec![number(width)])
    }

    /// Dash pattern `[on off] 0 d`; an empty pattern gives a solid line.
    pub fn set_dash(&mut self, pattern: &[f64]) -> &mut Self {
        let array = pattern.iter().map(|v| number(*v)).collect();
        self.push("d", vec![Object::Array(array), 0.into()])
    }

    /// Stroke the outline of a rectangle
    pub fn rectangle(&mut self, rect: &Rect) -> &mut Self {
        self.push("re", rect_operands(rect));
        self.push("S", vec![])
    }

    /// Stroke an ellipse inscribed in `rect`, as four Bezier arcs.
    pub fn ellipse(&mut self, rect: &Rect) -> &mut Self {
        let (cx, cy) = rect.center();
        let rx = rect.width() / 2.0;
        let ry = rect.height() / 2.0;
        let ox = rx * KAPPA;
        let oy = ry * KAPPA;

        self.move_to(cx + rx, cy);
        self.curve_to((cx + rx, cy + oy), (cx + ox, cy + ry), (cx, cy + ry));
        self.curve_to((cx - ox, cy + ry), (cx - rx, cy + oy), (cx - rx, cy));
        self.curve_to((cx - rx, cy - oy), (cx - ox, cy - ry), (cx, cy - ry));
        self.curve_to((cx + ox, cy - ry), (cx + rx, cy - oy), (cx + rx, cy));
        self.push("h", vec![]);
        self.stroke()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push("m", vec![number(x), number(y)])
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push("l", vec![number(x), number(y)])
    }

    fn curve_to(&mut self, c1: (f64, f64), c2: (f64, f64), end: (f64, f64)) -> &mut Self {
        self.push(
            "c",
            vec![
                number(c1.0),
                number(c1.1),
                number(c2.0),
                number(c2.1),
                number(end.0),
                number(end.1),
            ],
        )
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.push("S", vec![])
    }

    /// `BT`
    pub fn begin_text(&mut self) -> &mut Self {
        self.push("BT", vec![])
    }

    /// `Tf` with a font resource name
    pub fn set_font(&mut self, resource_name: &str, size: f64) -> &mut Self {
        self.push("Tf", vec![Object::Name(resource_name.as_bytes().to_vec()), number(size)])
    }

    /// Absolute text position: `1 0 0 1 x y Tm`
    pub fn text_position(&mut self, x: f64, y: f64) -> &mut Self {
        let operands = Matrix::translate(x, y).to_array().iter().map(|v| number(*v)).collect();
        self.push("Tm", operands)
    }

    /// `Tj` with already-encoded bytes, written as a hex string.
    pub fn show_text(&mut self, encoded: Vec<u8>) -> &mut Self {
        self.push("Tj", vec![Object::String(encoded, StringFormat::Hexadecimal)])
    }

    /// `ET`
    pub fn end_text(&mut self) -> &mut Self {
        self.push("ET", vec![])
    }

    /// Number of operation runs and referenced stream groups
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Write every operation run as a new stream and return the /Contents
    /// array in drawing order.
    pub fn finish(self, doc: &mut Document) -> Result<Vec<Object>> {
        let mut contents = Vec::new();
        for segment in self.segments {
            match segment {
                Segment::Operations(operations) => {
                    let bytes = Content { operations }.encode()?;
                    let id = doc.add_object(Stream::new(Dictionary::new(), bytes));
                    contents.push(Object::Reference(id));
                }
                Segment::Streams(ids) => {
                    contents.extend(ids.into_iter().map(Object::Reference));
                }
            }
        }
        Ok(contents)
    }
}

fn rect_operands(rect: &Rect) -> Vec<Object> {
    vec![
        number(rect.left),
        number(rect.bottom),
        number(rect.width()),
        number(rect.height()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops_of(doc: &Document, obj: &Object) -> Vec<String> {
        let stream = doc.get_object(obj.as_reference().unwrap()).unwrap().as_stream().unwrap();
        Content::decode(&stream.content)
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn test_runs_become_streams() {
        let mut doc = Document::with_version("1.5");
        let mut canvas = Canvas::new();
        canvas
            .save_state()
            .concat_matrix(&Matrix::scale_translate(0.5, 10.0, 20.0))
            .clip_rect(&Rect::from_size(100.0, 100.0))
            .restore_state();
        assert_eq!(canvas.segment_count(), 1);

        let contents = canvas.finish(&mut doc).unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(ops_of(&doc, &contents[0]), vec!["q", "cm", "re", "W", "n", "Q"]);
    }

    #[test]
    fn test_reference_splits_runs() {
        let mut doc = Document::with_version("1.5");
        let original = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m 1 1 l S".to_vec()));
        let page = doc.add_object(lopdf::dictionary! { "Type" => "Page", "Contents" => original });
        let handle = crate::pdf::page::copy_content_as_reference(&mut doc, page).unwrap();

        let mut canvas = Canvas::new();
        canvas.save_state().draw_reference(&handle).restore_state();
        let contents = canvas.finish(&mut doc).unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], Object::Reference(original));
        assert_eq!(ops_of(&doc, &contents[0]), vec!["q"]);
        assert_eq!(ops_of(&doc, &contents[2]), vec!["Q"]);
    }

    #[test]
    fn test_text_and_shapes() {
        let mut doc = Document::with_version("1.5");
        let mut canvas = Canvas::new();
        canvas
            .set_stroke_color(1.0, 0.0, 0.0)
            .set_line_width(0.5)
            .ellipse(&Rect::from_size(10.0, 10.0))
            .begin_text()
            .set_font("F1", 12.0)
            .text_position(10.0, 20.0)
            .show_text(b"Hi".to_vec())
            .end_text();
        let contents = canvas.finish(&mut doc).unwrap();
        let ops = ops_of(&doc, &contents[0]);
        assert_eq!(ops.iter().filter(|op| *op == "c").count(), 4);
        assert!(ops.ends_with(&["BT".to_string(), "Tf".to_string(), "Tm".to_string(), "Tj".to_string(), "ET".to_string()]));
    }
}
