//! Font metrics and text encoding for overlay text
//!
//! Two non-embedded fonts cover overlay pages: Helvetica (WinAnsiEncoding)
//! for Western text and the Adobe CJK font STSong-Light (UniGB-UTF16-H) for
//! everything else. Widths are in 1/1000ths of the em square.

/// Character advance widths
pub trait FontMetrics {
    /// Advance of `ch` in 1/1000 em
    fn advance(&self, ch: char) -> f64;

    /// Width of `text` at `font_size` points
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.advance(ch)).sum::<f64>() * font_size / 1000.0
    }
}

impl<F> FontMetrics for F
where
    F: Fn(char) -> f64,
{
    fn advance(&self, ch: char) -> f64 {
        self(ch)
    }
}

/// The fonts overlay text can be set in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontKind {
    Helvetica,
    SongCjk,
}

/// Overlay text with tabs turned into spaces and other control characters
/// dropped. Line breaks are kept.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter_map(|ch| match ch {
            '\t' => Some(' '),
            '\n' | '\r' => Some(ch),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

impl FontKind {
    /// Helvetica when every character has a WinAnsi code, the CJK font otherwise.
    pub fn for_text(text: &str) -> Self {
        if text.chars().all(|ch| ch == '\n' || ch == '\r' || win_ansi_code(ch).is_some()) {
            FontKind::Helvetica
        } else {
            FontKind::SongCjk
        }
    }

    /// Resource name the font is registered under on a page
    pub fn resource_name(self) -> &'static str {
        match self {
            FontKind::Helvetica => "F1",
            FontKind::SongCjk => "F2",
        }
    }

    /// Encode text for a `Tj` operand in this font's encoding.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            FontKind::Helvetica => text.chars().filter_map(win_ansi_code).collect(),
            FontKind::SongCjk => text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect(),
        }
    }
}

/// Metrics of the two standard overlay fonts
#[derive(Debug, Clone, Copy)]
pub struct StandardMetrics {
    kind: FontKind,
}

impl StandardMetrics {
    pub fn new(kind: FontKind) -> Self {
        Self { kind }
    }
}

impl FontMetrics for StandardMetrics {
    fn advance(&self, ch: char) -> f64 {
        match self.kind {
            FontKind::Helvetica => helvetica_width(ch),
            // Half-width Latin glyphs, full-width everything else
            FontKind::SongCjk if (' '..='~').contains(&ch) => 500.0,
            FontKind::SongCjk => 1000.0,
        }
    }
}

/// Helvetica widths for chars 32-126
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space .. /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // : ; < = > ? @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [ \ ] ^ _ `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // { | } ~
];

fn helvetica_width(ch: char) -> f64 {
    match ch {
        ' '..='~' => HELVETICA_ASCII[ch as usize - 32] as f64,
        '\u{2026}' | '\u{2030}' | '\u{2014}' => 1000.0,
        '\u{2013}' | '\u{2022}' => 556.0,
        '\u{2018}' | '\u{2019}' | '\u{201A}' => 222.0,
        '\u{201C}' | '\u{201D}' | '\u{201E}' => 333.0,
        // Latin-1 letters are close to the lowercase average
        _ => 556.0,
    }
}

/// WinAnsiEncoding code of a character, if it has one.
pub fn win_ansi_code(ch: char) -> Option<u8> {
    match ch {
        ' '..='~' => Some(ch as u8),
        '\u{00A0}'..='\u{00FF}' => Some(ch as u32 as u8),
        '\u{20AC}' => Some(0x80),
        '\u{201A}' => Some(0x82),
        '\u{201E}' => Some(0x84),
        '\u{2026}' => Some(0x85),
        '\u{2030}' => Some(0x89),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        _ => None,
    }
}
