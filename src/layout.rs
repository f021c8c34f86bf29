//! Overlay text layout
//!
//! Lays out word-wrapped, centered text inside a page's usable area. Lines
//! are wrapped greedily, the line height shrinks from 1.2 to 0.8 times the
//! font size when the text does not fit, and as a last resort the text is
//! truncated with an ellipsis. On rotated pages the layout happens in the
//! frame the reader sees and the whole block is turned by one matrix.

use crate::error::{Error, Result};
use crate::geometry::{Matrix, Rotation};
use crate::metrics::FontMetrics;

/// Line height as a multiple of the font size
pub const LINE_SPACING: f64 = 1.2;

/// Smallest line height still considered readable
pub const MIN_LINE_SPACING: f64 = 0.8;

/// Appended to the last line when text is truncated
pub const ELLIPSIS: char = '\u{2026}';

/// Inputs of a layout run
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    /// Width of the usable area on the unrotated page
    pub usable_width: f64,
    /// Height of the usable area on the unrotated page
    pub usable_height: f64,
    /// Page rotation in degrees; only quarter turns are accepted
    pub rotation: i64,
    pub font_size: f64,
    pub margin: f64,
}

/// One laid out line. `x` and `baseline` are in the block's frame with a
/// bottom-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub width: f64,
    pub x: f64,
    pub baseline: f64,
}

/// A laid out text block, ready for centered rendering
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<Line>,
    pub font_size: f64,
    pub line_height: f64,
    /// Distance from the top of the frame to the first baseline
    pub start_y: f64,
    pub frame_width: f64,
    pub frame_height: f64,
    pub rotation: Rotation,
    /// Maps the frame onto the unrotated usable area
    pub placement: Matrix,
    pub truncated: bool,
}

impl TextBlock {
    pub fn is_blank(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Lay out `text` for an overlay page.
///
/// Empty (or whitespace-only) text yields a blank block.
pub fn layout_text<M>(text: &str, metrics: &M, params: &LayoutParams) -> Result<TextBlock>
where
    M: FontMetrics + ?Sized,
{
    let rotation = match params.rotation {
        0 => Rotation::R0,
        90 => Rotation::R90,
        180 => Rotation::R180,
        270 => Rotation::R270,
        other => return Err(Error::UnsupportedRotation(other)),
    };

    let (frame_width, frame_height) = if rotation.is_quarter_turn() {
        (params.usable_height, params.usable_width)
    } else {
        (params.usable_width, params.usable_height)
    };
    let placement = rotation.frame_matrix(frame_width, frame_height);

    let max_width = frame_width - 2.0 * params.margin;
    let vertical_usable = frame_height - 2.0 * params.margin;
    if max_width <= 0.0 || vertical_usable <= 0.0 || params.font_size <= 0.0 {
        return Err(Error::Geometry {
            page_index: 0,
            message: format!(
                "no room for text: {:.3} x {:.3} frame with {:.3} margin",
                frame_width, frame_height, params.margin
            ),
        });
    }

    let blank = TextBlock {
        lines: Vec::new(),
        font_size: params.font_size,
        line_height: params.font_size * LINE_SPACING,
        start_y: 0.0,
        frame_width,
        frame_height,
        rotation,
        placement,
        truncated: false,
    };
    if text.trim().is_empty() {
        return Ok(blank);
    }

    // Every glyph, and the ellipsis, must fit a line on its own.
    let widest = text
        .chars()
        .filter(|ch| *ch != '\n' && *ch != '\r')
        .chain(std::iter::once(ELLIPSIS))
        .map(|ch| metrics.advance(ch) * params.font_size / 1000.0)
        .fold(0.0, f64::max);
    if widest > max_width {
        return Err(Error::Geometry {
            page_index: 0,
            message: format!(
                "no room for one glyph: {:.3} pt wide in a {:.3} pt line",
                widest, max_width
            ),
        });
    }

    let wrapper = Wrapper { metrics, font_size: params.font_size, max_width };
    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.lines() {
        wrapper.wrap(paragraph, &mut lines);
    }

    let mut line_height = params.font_size * LINE_SPACING;
    let mut truncated = false;
    if lines.len() as f64 * line_height > vertical_usable {
        line_height = params.font_size * MIN_LINE_SPACING;
        if lines.len() as f64 * line_height > vertical_usable {
            let max_lines = (vertical_usable / line_height).floor() as usize;
            if max_lines == 0 {
                return Err(Error::Geometry {
                    page_index: 0,
                    message: format!("{:.3} pt is too little height for one line", vertical_usable),
                });
            }
            lines.truncate(max_lines);
            if let Some(last) = lines.last_mut() {
                *last = wrapper.with_ellipsis(last);
            }
            truncated = true;
        }
    }

    let total_height = lines.len() as f64 * line_height;
    let start_y = params.margin + (vertical_usable - total_height) / 2.0 + line_height;

    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = metrics.measure(&text, params.font_size);
            Line {
                x: (frame_width - width) / 2.0,
                baseline: frame_height - (start_y + i as f64 * line_height),
                width,
                text,
            }
        })
        .collect();

    Ok(TextBlock { lines, line_height, start_y, truncated, ..blank })
}

struct Wrapper<'a, M: FontMetrics + ?Sized> {
    metrics: &'a M,
    font_size: f64,
    max_width: f64,
}

impl<M: FontMetrics + ?Sized> Wrapper<'_, M> {
    fn fits(&self, text: &str) -> bool {
        self.metrics.measure(text, self.font_size) <= self.max_width
    }

    /// Greedy wrap of one paragraph. Breaks at the last space of an
    /// overflowing line, or mid-token when the line has no space.
    fn wrap(&self, paragraph: &str, out: &mut Vec<String>) {
        let mut line = String::new();

        for ch in paragraph.chars() {
            line.push(ch);
            if self.fits(&line) {
                continue;
            }
            line.pop();

            match line.rfind(' ') {
                Some(idx) if idx > 0 && !line[..idx].trim_end().is_empty() => {
                    let rest = line[idx + 1..].to_string();
                    out.push(line[..idx].trim_end().to_string());
                    line = rest;
                }
                _ => {
                    if !line.is_empty() {
                        out.push(std::mem::take(&mut line));
                    }
                }
            }

            if !(line.is_empty() && ch == ' ') {
                line.push(ch);
            }
            // The carried-over word plus `ch` may still overflow.
            while !self.fits(&line) && line.chars().count() > 1 {
                if let Some(last) = line.pop() {
                    out.push(std::mem::replace(&mut line, last.to_string()));
                }
            }
        }

        let line = line.trim_end();
        if !line.is_empty() || paragraph.trim().is_empty() {
            out.push(line.to_string());
        }
    }

    /// `line` with an ellipsis appended, shortened until it fits.
    fn with_ellipsis(&self, line: &str) -> String {
        let mut kept: Vec<char> = line.trim_end().chars().collect();
        loop {
            let candidate: String = kept.iter().chain(std::iter::once(&ELLIPSIS)).collect();
            if self.fits(&candidate) || kept.is_empty() {
                return candidate;
            }
            kept.pop();
            while kept.last() == Some(&' ') {
                kept.pop();
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::metrics::{FontKind, StandardMetrics};
    use proptest::prelude::*;

    proptest! {
        /// Property: every wrapped line fits the available width
        #[test]
        fn lines_fit_max_width(
            text in "[a-zA-Z ]{0,200}",
            width in 80.0f64..600.0,
            font_size in 6.0f64..24.0,
        ) {
            let metrics = StandardMetrics::new(FontKind::Helvetica);
            let p = LayoutParams { usable_width: width, usable_height: 10_000.0, rotation: 0, font_size, margin: 10.0 };
            let block = layout_text(&text, &metrics, &p).unwrap();
            for line in &block.lines {
                prop_assert!(line.width <= width - 20.0 + 1e-9);
            }
        }

        /// Property: truncated output fits the available height
        #[test]
        fn truncated_block_fits_height(lines in 10usize..80, height in 60.0f64..200.0) {
            let text = vec!["word"; lines].join("\n");
            let p = LayoutParams { usable_width: 200.0, usable_height: height, rotation: 0, font_size: 10.0, margin: 10.0 };
            let block = layout_text(&text, &|_: char| 500.0, &p).unwrap();
            let vertical = height - 20.0;
            if block.truncated {
                prop_assert!(block.lines.len() as f64 * block.line_height <= vertical);
                prop_assert!(block.lines.last().unwrap().text.ends_with(ELLIPSIS));
            } else {
                prop_assert!(block.lines.len() as f64 * block.line_height <= vertical);
            }
        }
    }
}
