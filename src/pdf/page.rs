//! Page-level primitives over lopdf
//!
//! Reading and writing boxes and rotation, taking a page's content as an
//! indirect handle, and splicing new pages into the page tree.

use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::boxes::{BoxIssue, BoxType, PageBoxError, PageBoxSet};
use crate::error::{Error, Result};
use crate::geometry::{Rect, Rotation};

/// Guard against cyclic /Parent chains in broken files
const MAX_TREE_DEPTH: usize = 64;

/// Page object ids in document order
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Follow references until a direct object is reached.
fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_TREE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            _ => return Some(obj),
        }
    }
    None
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
fn resolve_inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        match current.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = doc.get_dictionary(*parent_id).ok()?,
            _ => return None,
        }
    }
    None
}

/// Extract numeric value from a PDF object
fn extract_number(doc: &Document, obj: &Object) -> Option<f64> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Read a `[x0 y0 x1 y1]` box array.
fn read_rect(doc: &Document, obj: &Object) -> Option<Rect> {
    let array = resolve(doc, obj)?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let values: Vec<f64> = array.iter().filter_map(|v| extract_number(doc, v)).collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => Some(Rect::from_corners(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

/// Whether a box key is inherited through the page tree
fn is_inheritable(box_type: BoxType) -> bool {
    matches!(box_type, BoxType::Media | BoxType::Crop)
}

/// Read the five boxes of a page.
///
/// Entries that are present but not four numbers are left out of the set
/// and reported as [`BoxIssue::Malformed`].
pub fn read_boxes(doc: &Document, page_id: ObjectId, page_index: usize) -> (PageBoxSet, Vec<PageBoxError>) {
    let mut boxes = PageBoxSet::default();
    let mut errors = Vec::new();

    for box_type in BoxType::ALL {
        let key = box_type.key().as_bytes();
        let entry = if is_inheritable(box_type) {
            resolve_inherited(doc, page_id, key)
        } else {
            doc.get_dictionary(page_id)
                .ok()
                .and_then(|dict| dict.get(key).ok())
        };
        let Some(entry) = entry else { continue };

        match read_rect(doc, entry) {
            Some(rect) => boxes.set(box_type, Some(rect)),
            None => errors.push(PageBoxError::new(
                page_index,
                box_type,
                BoxIssue::Malformed,
                None,
                format!("{} is not an array of four numbers", box_type.key()),
            )),
        }
    }

    (boxes, errors)
}

/// Raw /Rotate of a page (inherited), 0 when absent
pub fn read_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    resolve_inherited(doc, page_id, b"Rotate")
        .and_then(|obj| match obj {
            Object::Integer(i) => Some(*i),
            Object::Real(r) => Some(r.round() as i64),
            _ => None,
        })
        .unwrap_or(0)
}

/// Write a number, keeping whole values as integers.
pub fn number(value: f64) -> Object {
    if value.fract() == 0.0 && value.abs() < 1e9 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value as f32)
    }
}

/// A rectangle as a PDF box array
pub fn rect_object(rect: &Rect) -> Object {
    Object::Array(vec![
        number(rect.left),
        number(rect.bottom),
        number(rect.right),
        number(rect.top),
    ])
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    Ok(doc.get_object_mut(page_id)?.as_dict_mut()?)
}

/// Set all five boxes of a page to the same rectangle.
pub fn set_all_boxes(doc: &mut Document, page_id: ObjectId, rect: &Rect) -> Result<()> {
    let page = page_dict_mut(doc, page_id)?;
    for box_type in BoxType::ALL {
        page.set(box_type.key(), rect_object(rect));
    }
    Ok(())
}

/// Write every box present in `boxes`; absent ones are removed.
pub fn set_boxes(doc: &mut Document, page_id: ObjectId, boxes: &PageBoxSet) -> Result<()> {
    let page = page_dict_mut(doc, page_id)?;
    for box_type in BoxType::ALL {
        match boxes.get(box_type) {
            Some(rect) => page.set(box_type.key(), rect_object(&rect)),
            None => {
                page.remove(box_type.key().as_bytes());
            }
        }
    }
    Ok(())
}

/// Set /Rotate explicitly, so an inherited value cannot override it.
pub fn set_rotation(doc: &mut Document, page_id: ObjectId, rotation: Rotation) -> Result<()> {
    page_dict_mut(doc, page_id)?.set("Rotate", Object::Integer(rotation.degrees()));
    Ok(())
}

/// Resources of a page, inherited ones included. References stay references.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(b"Resources") {
            return Some(value.clone());
        }
        match current.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = doc.get_dictionary(*parent_id).ok()?,
            _ => return None,
        }
    }
    None
}

/// A page's content taken by reference
///
/// Holds the ids of the page's content streams and its resources. The
/// stream bytes are never read, copied or re-encoded; drawing the handle
/// splices these ids into another page's /Contents. The handle is not
/// `Clone`: it is owned by the page it is drawn into.
#[derive(Debug)]
pub struct ContentHandle {
    streams: Vec<ObjectId>,
    resources: Option<Object>,
}

impl ContentHandle {
    pub fn streams(&self) -> &[ObjectId] {
        &self.streams
    }

    pub fn resources(&self) -> Option<&Object> {
        self.resources.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Take a page's content as an indirect handle.
pub fn copy_content_as_reference(doc: &mut Document, page_id: ObjectId) -> Result<ContentHandle> {
    let resources = page_resources(doc, page_id);
    let contents = doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();

    let mut streams = Vec::new();
    match contents {
        Some(Object::Reference(id)) => match doc.get_object(id)? {
            // An indirect array of stream references
            Object::Array(items) => streams.extend(items.iter().filter_map(|o| o.as_reference().ok())),
            _ => streams.push(id),
        },
        Some(Object::Array(items)) => {
            streams.extend(items.iter().filter_map(|o| o.as_reference().ok()));
        }
        // Direct streams are not allowed by the format, but move them out
        // into objects of their own rather than drop them.
        Some(Object::Stream(stream)) => streams.push(doc.add_object(stream)),
        _ => {}
    }

    Ok(ContentHandle { streams, resources })
}

/// Where new pages go relative to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// Insert new page objects next to `anchor` in its parent's /Kids and bump
/// /Count up the tree.
pub fn insert_pages(doc: &mut Document, anchor: ObjectId, placement: Placement, new_pages: &[ObjectId]) -> Result<()> {
    let parent_id = match doc.get_dictionary(anchor)?.get(b"Parent") {
        Ok(Object::Reference(id)) => *id,
        _ => return Err(Error::General("Page has no /Parent".to_string())),
    };

    {
        let parent = doc.get_object_mut(parent_id)?.as_dict_mut()?;
        let mut kids = match parent.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            _ => return Err(Error::General("Pages node has no /Kids array".to_string())),
        };
        let index = kids
            .iter()
            .position(|kid| kid.as_reference().ok() == Some(anchor))
            .ok_or_else(|| Error::General("Page is missing from its parent's /Kids".to_string()))?;
        let at = match placement {
            Placement::Before => index,
            Placement::After => index + 1,
        };
        for (offset, id) in new_pages.iter().enumerate() {
            kids.insert(at + offset, Object::Reference(*id));
        }
        parent.set("Kids", Object::Array(kids));
    }

    for id in new_pages {
        page_dict_mut(doc, *id)?.set("Parent", Object::Reference(parent_id));
    }

    // Update /Count on the parent and every ancestor
    let added = new_pages.len() as i64;
    let mut node = Some(parent_id);
    for _ in 0..MAX_TREE_DEPTH {
        let Some(id) = node else { break };
        let dict = doc.get_object_mut(id)?.as_dict_mut()?;
        let count = dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        dict.set("Count", Object::Integer(count + added));
        node = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(())
}

/// Prepend a content stream to a page's Contents
pub fn prepend_content(doc: &mut Document, page_id: ObjectId, content_id: ObjectId) -> Result<()> {
    let mut contents = content_array(doc, page_id)?;
    contents.insert(0, Object::Reference(content_id));
    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Append a content stream to a page's Contents
pub fn append_content(doc: &mut Document, page_id: ObjectId, content_id: ObjectId) -> Result<()> {
    let mut contents = content_array(doc, page_id)?;
    contents.push(Object::Reference(content_id));
    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Existing /Contents as an array of references
fn content_array(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let existing = doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();
    Ok(match existing {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    /// Two pages under a Pages node that carries an inherited MediaBox and Rotate.
    fn sample_doc() -> (Document, Vec<ObjectId>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m 10 10 l S".to_vec()));

        let first = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "CropBox" => vec![Object::Integer(10), Object::Integer(10), Object::Integer(200), Object::Integer(287)],
            "TrimBox" => vec![Object::Integer(1), Object::Integer(2)],
        });
        let second = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![Object::Real(612.0), Object::Real(792.0), Object::Integer(0), Object::Integer(0)],
            "Rotate" => 90,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(first), Object::Reference(second)],
                "Count" => 2,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(210), Object::Integer(297)],
                "Rotate" => 180,
                "Resources" => dictionary! {},
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, vec![first, second])
    }

    #[test]
    fn test_read_inherited_boxes() {
        let (doc, pages) = sample_doc();
        let (boxes, errors) = read_boxes(&doc, pages[0], 0);
        assert_eq!(boxes.media, Some(Rect::from_size(210.0, 297.0)));
        assert_eq!(boxes.crop, Some(Rect::new(10.0, 10.0, 200.0, 287.0)));
        assert_eq!(boxes.trim, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, BoxIssue::Malformed);
        assert_eq!(errors[0].box_type, BoxType::Trim);
    }

    #[test]
    fn test_read_swapped_corners() {
        let (doc, pages) = sample_doc();
        let (boxes, _) = read_boxes(&doc, pages[1], 1);
        assert_eq!(boxes.media, Some(Rect::from_size(612.0, 792.0)));
    }

    #[test]
    fn test_read_rotation() {
        let (doc, pages) = sample_doc();
        assert_eq!(read_rotation(&doc, pages[0]), 180);
        assert_eq!(read_rotation(&doc, pages[1]), 90);
    }

    #[test]
    fn test_set_all_boxes_and_rotation() {
        let (mut doc, pages) = sample_doc();
        let rect = Rect::new(0.0, 0.0, 595.5, 842.0);
        set_all_boxes(&mut doc, pages[0], &rect).unwrap();
        set_rotation(&mut doc, pages[0], Rotation::R0).unwrap();
        let (boxes, errors) = read_boxes(&doc, pages[0], 0);
        assert!(errors.is_empty());
        assert_eq!(boxes, PageBoxSet::uniform(rect));
        assert_eq!(read_rotation(&doc, pages[0]), 0);
    }

    #[test]
    fn test_content_handle_references_streams() {
        let (mut doc, pages) = sample_doc();
        let before = doc.objects.len();
        let handle = copy_content_as_reference(&mut doc, pages[0]).unwrap();
        assert_eq!(handle.streams().len(), 1);
        assert!(handle.resources().is_some());
        assert_eq!(doc.objects.len(), before);
    }

    #[test]
    fn test_insert_pages_updates_count() {
        let (mut doc, pages) = sample_doc();
        let new_page = doc.add_object(dictionary! { "Type" => "Page" });
        insert_pages(&mut doc, pages[0], Placement::After, &[new_page]).unwrap();
        let order = page_ids(&doc);
        assert_eq!(order, vec![pages[0], new_page, pages[1]]);
    }

    #[test]
    fn test_number_keeps_integers() {
        assert_eq!(number(210.0), Object::Integer(210));
        assert_eq!(number(595.5), Object::Real(595.5));
    }
}
