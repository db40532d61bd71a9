//! PDF concatenation
//!
//! Appends the pages of several documents, in order, to the first one.

use crate::error::PdfFormError;
use crate::objects::{inherited_attribute, load_document, save_document, INHERITABLE_PAGE_KEYS};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info};

/// Concatenate PDFs into one.
///
/// A single input comes back byte for byte. Otherwise every page is
/// flattened first, so it keeps its inherited `MediaBox`, `CropBox`,
/// `Resources` and `Rotate` once its old `Pages` ancestors are gone. Later
/// documents are renumbered past the highest id seen so far, all pages end
/// up as direct kids of the first document's root node, and whatever the
/// old page trees and catalogs left unreachable is pruned before saving.
pub fn concat_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfFormError> {
    let mut documents = documents.into_iter();
    let first = documents
        .next()
        .ok_or_else(|| PdfFormError::Validation("No documents to concatenate".into()))?;

    let rest: Vec<Vec<u8>> = documents.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let mut dest = load_document(&first)?;
    let mut page_refs = flatten_pages(&mut dest)?;
    let mut max_id = dest.max_id;

    for (index, bytes) in rest.iter().enumerate() {
        let mut source = Document::load_mem(bytes).map_err(|e| {
            PdfFormError::ParseError(format!("Failed to load document {}: {}", index + 1, e))
        })?;
        let source_pages = flatten_pages(&mut source)?;
        let offset = max_id;

        for ((number, generation), mut object) in std::mem::take(&mut source.objects) {
            shift_references(&mut object, offset);
            dest.objects.insert((number + offset, generation), object);
        }
        page_refs.extend(source_pages.iter().map(|id| (id.0 + offset, id.1)));

        max_id = (source.max_id + offset).max(max_id);
        debug!(
            "Appended document {} ({} pages, id offset {})",
            index + 1,
            source_pages.len(),
            offset
        );
    }
    dest.max_id = max_id;

    rebuild_page_tree(&mut dest, &page_refs)?;
    dest.prune_objects();

    info!(
        "Concatenated {} documents into {} pages",
        rest.len() + 1,
        page_refs.len()
    );
    save_document(&mut dest)
}

/// Copy inherited attributes onto each page and return the pages in order
fn flatten_pages(doc: &mut Document) -> Result<Vec<ObjectId>, PdfFormError> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in &pages {
        let mut inherited = Vec::new();
        for key in INHERITABLE_PAGE_KEYS {
            if let Some(value) = inherited_attribute(doc, *page_id, key)? {
                inherited.push((key, value.clone()));
            }
        }

        let page = doc.get_object_mut(*page_id)?.as_dict_mut()?;
        for (key, value) in inherited {
            if !page.has(key) {
                page.set(key.to_vec(), value);
            }
        }
    }
    Ok(pages)
}

/// Add `offset` to the object number of every reference inside `obj`
fn shift_references(obj: &mut Object, offset: u32) {
    match obj {
        Object::Reference((number, _)) => *number += offset,
        Object::Array(items) => items.iter_mut().for_each(|item| shift_references(item, offset)),
        Object::Dictionary(dict) => dict
            .iter_mut()
            .for_each(|(_, value)| shift_references(value, offset)),
        Object::Stream(stream) => stream
            .dict
            .iter_mut()
            .for_each(|(_, value)| shift_references(value, offset)),
        _ => {}
    }
}

/// Point the root page node at `page_refs` and re-parent every page to it
fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfFormError> {
    let pages_id = doc
        .catalog()
        .map_err(|_| PdfFormError::OperationError("No catalog in first document".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfFormError::OperationError("Pages is not a reference".into()))?;

    for page_id in page_refs {
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(*page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(pages_dict)) => {
            let kids = page_refs
                .iter()
                .map(|&id| Object::Reference(id))
                .collect::<Vec<_>>();
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
            Ok(())
        }
        _ => Err(PdfFormError::OperationError(
            "Invalid pages dictionary".into(),
        )),
    }
}
