//! Form field discovery
//!
//! Walks the page tree depth-first and collects every addressable widget
//! annotation as a [`FieldDescriptor`], in document order.

use crate::error::PdfFormError;
use crate::geometry::normalize_rect;
use crate::model::FieldDescriptor;
use crate::objects::{decode_text_string, name_of, rect_of, resolve, resolve_array, resolve_dict};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// How the walker numbers the pages it assigns to fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumbering {
    /// The counter only advances on leaf pages that carry an `Annots` array
    /// (empty or not). With unannotated pages in between, `page` indexes the
    /// annotated pages rather than the document. Existing data files were
    /// produced this way.
    #[default]
    AnnotatedPages,
    /// The counter advances on every leaf page: `page` is the absolute
    /// 0-based page index that fill uses.
    DocumentOrder,
}

struct WalkContext {
    numbering: PageNumbering,
    next_page: u32,
    fields: Vec<FieldDescriptor>,
    visited: HashSet<ObjectId>,
}

/// Collect the widget fields of a document, starting at the catalog's root page node
pub fn collect_fields(
    doc: &Document,
    numbering: PageNumbering,
) -> Result<Vec<FieldDescriptor>, PdfFormError> {
    let pages_ref = doc
        .catalog()
        .map_err(|e| PdfFormError::ParseError(format!("No catalog: {}", e)))?
        .get(b"Pages")
        .map_err(|_| PdfFormError::ParseError("No Pages in catalog".into()))?;

    let mut context = WalkContext {
        numbering,
        next_page: 0,
        fields: Vec::new(),
        visited: HashSet::new(),
    };
    walk_node(doc, &mut context, pages_ref)?;

    debug!(
        "Page tree walk found {} fields on {} numbered pages",
        context.fields.len(),
        context.next_page
    );
    Ok(context.fields)
}

fn walk_node(doc: &Document, context: &mut WalkContext, node: &Object) -> Result<(), PdfFormError> {
    if let Object::Reference(id) = node {
        if !context.visited.insert(*id) {
            return Err(PdfFormError::ParseError(format!(
                "Page tree contains a cycle at object {} {} R",
                id.0, id.1
            )));
        }
    }
    let dict = resolve_dict(doc, node)?;

    let node_type = match name_of(dict, b"Type") {
        // Some writers omit Type on intermediate nodes.
        None if dict.has(b"Kids") => Some(b"Pages".as_slice()),
        other => other,
    };

    match node_type {
        Some(b"Pages") => {
            let kids = dict
                .get(b"Kids")
                .map_err(|_| PdfFormError::ParseError("Pages node has no Kids".into()))?;
            for kid in resolve_array(doc, kids)? {
                walk_node(doc, context, kid)?;
            }
        }
        Some(b"Page") => walk_leaf(doc, context, dict)?,
        // Nodes of any other type hold no pages.
        _ => {}
    }
    Ok(())
}

fn walk_leaf(doc: &Document, context: &mut WalkContext, page: &Dictionary) -> Result<(), PdfFormError> {
    let annots = match page.get(b"Annots") {
        Ok(annots) => Some(resolve_array(doc, annots)?),
        Err(_) => None,
    };

    if let Some(annots) = annots {
        for annot in annots {
            let annot = match resolve_dict(doc, annot) {
                Ok(annot) => annot,
                Err(e) => {
                    warn!("Skipping unreadable annotation {:?}: {}", annot, e);
                    continue;
                }
            };
            if let Some(field) = widget_field(doc, annot, context.next_page)? {
                debug!("Field '{}' on page {}", field.name, field.page);
                context.fields.push(field);
            }
        }
    }

    let advance = match context.numbering {
        PageNumbering::AnnotatedPages => annots.is_some(),
        PageNumbering::DocumentOrder => true,
    };
    if advance {
        context.next_page += 1;
    }
    Ok(())
}

/// A named leaf widget becomes a field; parents of child widgets do not.
fn widget_field(
    doc: &Document,
    annot: &Dictionary,
    page: u32,
) -> Result<Option<FieldDescriptor>, PdfFormError> {
    if name_of(annot, b"Subtype") != Some(b"Widget".as_slice()) || annot.has(b"Kids") {
        return Ok(None);
    }

    let name = match annot.get(b"T") {
        Ok(t) => match resolve(doc, t)? {
            Object::String(bytes, _) => decode_text_string(bytes),
            _ => return Ok(None),
        },
        Err(_) => return Ok(None),
    };

    let rect = annot
        .get(b"Rect")
        .map_err(|_| PdfFormError::ParseError(format!("Field '{}' has no Rect", name)))?;
    let rect = rect_of(doc, rect)
        .map_err(|e| PdfFormError::ParseError(format!("Bad Rect on field '{}': {}", name, e)))?;

    Ok(Some(FieldDescriptor::new(name, page, normalize_rect(rect))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{widget, PdfBuilder};
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    fn names_and_pages(fields: &[FieldDescriptor]) -> Vec<(String, u32)> {
        fields.iter().map(|f| (f.name.clone(), f.page)).collect()
    }

    #[test]
    fn test_unannotated_pages_do_not_advance_counter() {
        let mut builder = PdfBuilder::new();
        builder.page_with_annots(vec![widget("first", [10.0, 10.0, 50.0, 30.0])]);
        builder.page();
        builder.page_with_annots(vec![widget("third", [10.0, 10.0, 50.0, 30.0])]);
        let doc = builder.build_document();

        let fields = collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap();
        assert_eq!(
            names_and_pages(&fields),
            vec![("first".to_string(), 0), ("third".to_string(), 1)]
        );
    }

    #[test]
    fn test_document_order_numbering_uses_absolute_pages() {
        let mut builder = PdfBuilder::new();
        builder.page_with_annots(vec![widget("first", [10.0, 10.0, 50.0, 30.0])]);
        builder.page();
        builder.page_with_annots(vec![widget("third", [10.0, 10.0, 50.0, 30.0])]);
        let doc = builder.build_document();

        let fields = collect_fields(&doc, PageNumbering::DocumentOrder).unwrap();
        assert_eq!(
            names_and_pages(&fields),
            vec![("first".to_string(), 0), ("third".to_string(), 2)]
        );
    }

    #[test]
    fn test_empty_annots_array_still_advances_counter() {
        let mut builder = PdfBuilder::new();
        builder.page_with_annots(vec![]);
        builder.page_with_annots(vec![widget("second", [0.0, 0.0, 5.0, 5.0])]);
        let doc = builder.build_document();

        let fields = collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap();
        assert_eq!(fields[0].page, 1);
    }

    #[test]
    fn test_parent_widgets_are_skipped() {
        let mut builder = PdfBuilder::new();
        let mut parent = widget("group", [0.0, 0.0, 100.0, 100.0]);
        parent.set("Kids", Object::Array(vec![]));
        builder.page_with_annots(vec![parent, widget("leaf", [0.0, 0.0, 10.0, 10.0])]);
        let doc = builder.build_document();

        let fields = collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap();
        assert_eq!(names_and_pages(&fields), vec![("leaf".to_string(), 0)]);
    }

    #[test]
    fn test_unnamed_and_non_widget_annotations_are_skipped() {
        let mut builder = PdfBuilder::new();
        let mut unnamed = widget("x", [0.0, 0.0, 10.0, 10.0]);
        unnamed.remove(b"T");
        let mut link = widget("link", [0.0, 0.0, 10.0, 10.0]);
        link.set("Subtype", Object::Name(b"Link".to_vec()));
        builder.page_with_annots(vec![unnamed, link]);
        let doc = builder.build_document();

        assert!(collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap().is_empty());
    }

    #[test]
    fn test_rect_is_normalized() {
        let mut builder = PdfBuilder::new();
        builder.page_with_annots(vec![widget("flipped", [10.0, 50.0, 30.0, 20.0])]);
        let doc = builder.build_document();

        let fields = collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap();
        assert_eq!(fields[0].rect, [10.0, 20.0, 30.0, 50.0]);
    }

    #[test]
    fn test_nested_page_tree_and_indirect_annots() {
        let mut builder = PdfBuilder::new();
        builder.nested_pages(true);
        builder.indirect_annots(true);
        builder.page_with_annots(vec![widget("a", [0.0, 0.0, 10.0, 10.0])]);
        builder.page_with_annots(vec![widget("b", [0.0, 0.0, 10.0, 10.0])]);
        builder.page_with_annots(vec![widget("c", [0.0, 0.0, 10.0, 10.0])]);
        let doc = builder.build_document();

        let fields = collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap();
        assert_eq!(
            names_and_pages(&fields),
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_page_tree_cycle_is_an_error() {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(pages_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let err = collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_unreadable_annotations_are_skipped() {
        let mut doc = PdfBuilder::new()
            .page_with_annots(vec![widget("kept", [0.0, 0.0, 10.0, 10.0])])
            .build_document();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object_mut(page_id).unwrap().as_dict_mut().unwrap();
        let mut annots = page.get(b"Annots").unwrap().as_array().unwrap().clone();
        annots.insert(0, Object::Reference((9999, 0)));
        annots.push(Object::Integer(7));
        page.set("Annots", annots);

        let fields = collect_fields(&doc, PageNumbering::AnnotatedPages).unwrap();
        assert_eq!(names_and_pages(&fields), vec![("kept".to_string(), 0)]);
    }
}
