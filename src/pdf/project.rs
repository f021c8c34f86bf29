//! Re-projection of a page's content into the canonical container

use lopdf::{Document, Object, ObjectId};
use crate::container::CanonicalContainer;
use crate::error::Result;
use crate::geometry::{Matrix, Rect};
use crate::pdf::canvas::Canvas;
use crate::pdf::page::{self, ContentHandle};
use crate::transform::PageTransform;

/// Rewrite a page so its content fills the container.
///
/// The page keeps its object id. Its original content streams are drawn by
/// reference between a `q cm clip` prefix and a `Q` suffix; the five boxes
/// become the container and /Rotate is written explicitly. An identity
/// transform only rewrites the boxes.
pub fn project_page(
    doc: &mut Document,
    page_id: ObjectId,
    transform: &PageTransform,
    container: &CanonicalContainer,
) -> Result<()> {
    let target = container.rect();

    if !transform.is_identity() {
        let handle = page::copy_content_as_reference(doc, page_id)?;
        let matrix = transform.matrix();

        let mut canvas = Canvas::new();
        canvas
            .save_state()
            .concat_matrix(&matrix)
            .clip_rect(&transform.source_box)
            .draw_reference(&handle)
            .restore_state();
        let contents = canvas.finish(doc)?;

        install(doc, page_id, handle, contents)?;
        transform_annotations(doc, page_id, &matrix)?;
    }

    page::set_all_boxes(doc, page_id, &target)?;
    page::set_rotation(doc, page_id, transform.rotation)?;
    Ok(())
}

/// Point the page at its new content. Resources are written on the page
/// itself so inherited ones survive the move.
fn install(doc: &mut Document, page_id: ObjectId, handle: ContentHandle, contents: Vec<Object>) -> Result<()> {
    let dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    dict.set("Contents", Object::Array(contents));
    if let Some(resources) = handle.resources() {
        dict.set("Resources", resources.clone());
    }
    Ok(())
}

/// Map every annotation's /Rect through `matrix`.
fn transform_annotations(doc: &mut Document, page_id: ObjectId, matrix: &Matrix) -> Result<()> {
    let annots = match doc.get_dictionary(page_id)?.get(b"Annots") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => return Ok(()),
        },
        _ => return Ok(()),
    };

    for annot in annots {
        let Ok(annot_id) = annot.as_reference() else { continue };
        let Ok(Object::Dictionary(dict)) = doc.get_object_mut(annot_id) else { continue };
        let rect = match dict.get(b"Rect").and_then(Object::as_array) {
            Ok(values) => rect_from_numbers(values),
            Err(_) => None,
        };
        if let Some(rect) = rect {
            dict.set("Rect", page::rect_object(&rect.transformed(matrix)));
        }
    }
    Ok(())
}

fn rect_from_numbers(values: &[Object]) -> Option<Rect> {
    let numbers: Vec<f64> = values
        .iter()
        .filter_map(|v| match v {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r as f64),
            _ => None,
        })
        .collect();
    match numbers.as_slice() {
        [x0, y0, x1, y1] => Some(Rect::from_corners(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Dictionary, Stream};
    use crate::geometry::Rotation;
    use crate::transform::compose;

    fn landscape_page() -> (Document, ObjectId, ObjectId, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m 297 210 l S".to_vec()));
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![0.into(), 0.into(), 297.into(), 210.into()],
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 297.into(), 210.into()],
            "Contents" => content_id,
            "Annots" => vec![annot_id.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! { "ProcSet" => vec!["PDF".into()] },
            }),
        );
        (doc, page_id, content_id, annot_id)
    }

    #[test]
    fn test_projection_references_original_content() {
        let (mut doc, page_id, content_id, _) = landscape_page();
        let container = CanonicalContainer { width: 210.0, height: 297.0 };
        let transform = compose(0, &Rect::from_size(297.0, 210.0), &container, Rotation::R0).unwrap();
        let original_bytes = doc.get_object(content_id).unwrap().as_stream().unwrap().content.clone();

        project_page(&mut doc, page_id, &transform, &container).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], Object::Reference(content_id));
        assert!(page.get(b"Resources").is_ok());
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 0);

        let stored = doc.get_object(content_id).unwrap().as_stream().unwrap();
        assert_eq!(stored.content, original_bytes);
    }

    #[test]
    fn test_projection_sets_all_boxes() {
        let (mut doc, page_id, _, _) = landscape_page();
        let container = CanonicalContainer { width: 210.0, height: 297.0 };
        let transform = compose(0, &Rect::from_size(297.0, 210.0), &container, Rotation::R90).unwrap();
        project_page(&mut doc, page_id, &transform, &container).unwrap();

        let (boxes, errors) = page::read_boxes(&doc, page_id, 0);
        assert!(errors.is_empty());
        assert_eq!(boxes, crate::boxes::PageBoxSet::uniform(container.rect()));
        assert_eq!(page::read_rotation(&doc, page_id), 90);
    }

    #[test]
    fn test_annotation_rect_follows_content() {
        let (mut doc, page_id, _, annot_id) = landscape_page();
        let container = CanonicalContainer { width: 210.0, height: 297.0 };
        let transform = compose(0, &Rect::from_size(297.0, 210.0), &container, Rotation::R0).unwrap();
        project_page(&mut doc, page_id, &transform, &container).unwrap();

        let annot = doc.get_dictionary(annot_id).unwrap();
        let rect = rect_from_numbers(annot.get(b"Rect").unwrap().as_array().unwrap()).unwrap();
        assert!((rect.width() - 210.0).abs() < 1e-3);
        assert!((rect.bottom - transform.translate_y).abs() < 1e-3);
    }

    #[test]
    fn test_identity_keeps_contents() {
        let (mut doc, page_id, content_id, _) = landscape_page();
        let container = CanonicalContainer { width: 297.0, height: 210.0 };
        let transform = compose(0, &Rect::from_size(297.0, 210.0), &container, Rotation::R0).unwrap();
        project_page(&mut doc, page_id, &transform, &container).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        assert_eq!(page.get(b"Contents").unwrap(), &Object::Reference(content_id));
    }
}
