//! Font resources for overlay text
//!
//! Neither font is embedded. Helvetica is one of the 14 standard fonts and
//! STSong-Light is one of the Adobe CJK fonts every conforming reader ships
//! with, so each costs a couple of dictionaries per document.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use crate::metrics::FontKind;

/// Add the font dictionary for `kind` to the document.
pub fn add_font(doc: &mut Document, kind: FontKind) -> ObjectId {
    match kind {
        FontKind::Helvetica => add_helvetica(doc),
        FontKind::SongCjk => add_song_cjk(doc),
    }
}

/// Helvetica with WinAnsiEncoding
fn add_helvetica(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// STSong-Light as a composite font over UTF-16 code units
fn add_song_cjk(doc: &mut Document) -> ObjectId {
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "STSong-Light",
        "Flags" => 6,
        "FontBBox" => vec![(-25).into(), (-254).into(), 1000.into(), 880.into()],
        "ItalicAngle" => 0,
        "Ascent" => 880,
        "Descent" => -120,
        "CapHeight" => 880,
        "StemV" => 93,
    });

    let mut system_info = Dictionary::new();
    system_info.set("Registry", Object::string_literal("Adobe"));
    system_info.set("Ordering", Object::string_literal("GB1"));
    system_info.set("Supplement", 2);

    // CIDs 1-95 are the half-width ASCII range
    let descendant_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => "STSong-Light",
        "CIDSystemInfo" => system_info,
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => vec![1.into(), 95.into(), Object::Array(vec![500.into()])],
    });

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "STSong-Light-UniGB-UTF16-H",
        "Encoding" => "UniGB-UTF16-H",
        "DescendantFonts" => vec![descendant_id.into()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_font_dict() {
        let mut doc = Document::with_version("1.5");
        let id = add_font(&mut doc, FontKind::Helvetica);
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
        assert_eq!(dict.get(b"Encoding").unwrap().as_name().unwrap(), b"WinAnsiEncoding");
    }

    #[test]
    fn test_cjk_font_has_descendant() {
        let mut doc = Document::with_version("1.5");
        let id = add_font(&mut doc, FontKind::SongCjk);
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        let descendants = dict.get(b"DescendantFonts").unwrap().as_array().unwrap();
        let descendant = doc
            .get_dictionary(descendants[0].as_reference().unwrap())
            .unwrap();
        assert_eq!(descendant.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType0");
    }
}
