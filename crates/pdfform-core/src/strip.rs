//! Form stripping
//!
//! Rebuilds a document page by page into a fresh one. Page content,
//! resources and rotation survive; annotations and the AcroForm do not.

use crate::error::PdfFormError;
use crate::objects::{
    inherited_attribute, load_document, page_content, page_ids, page_media_box, page_resources, rect_object,
    resolve, save_document, ObjectCopier,
};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

/// Strip the interactive form from a PDF
pub fn strip_form(pdf: &[u8]) -> Result<Vec<u8>, PdfFormError> {
    let source = load_document(pdf)?;
    let mut stripped = strip_document(&source)?;
    save_document(&mut stripped)
}

/// A new document holding the pages of `source` without annotations
pub fn strip_document(source: &Document) -> Result<Document, PdfFormError> {
    let mut dest = Document::with_version(source.version.clone());
    let pages_id = dest.new_object_id();
    let mut copier = ObjectCopier::new(source);

    let mut kids = Vec::new();
    for (index, page_id) in page_ids(source).into_iter().enumerate() {
        let page = StrippedPage::read(source, page_id)?;
        let resources = copier.copy_dictionary(&mut dest, &page.resources)?;
        let new_page = page.write(&mut dest, pages_id, resources);
        debug!("Stripped page {} -> {:?}", index, new_page);
        kids.push(new_page);
    }

    finish_page_tree(&mut dest, pages_id, &kids);
    info!("Stripped {} pages", kids.len());
    Ok(dest)
}

/// The parts of a source page that survive stripping
pub(crate) struct StrippedPage {
    pub media_box: [f64; 4],
    pub content: Vec<u8>,
    pub resources: Dictionary,
    pub rotate: Option<i64>,
}

impl StrippedPage {
    pub(crate) fn read(source: &Document, page_id: ObjectId) -> Result<Self, PdfFormError> {
        let media_box = page_media_box(source, page_id)?;
        let content = page_content(source, page_id).map_err(|e| {
            PdfFormError::ParseError(format!("Cannot read content of page {:?}: {}", page_id, e))
        })?;
        let resources = page_resources(source, page_id)?;
        let rotate = match inherited_attribute(source, page_id, b"Rotate")? {
            Some(obj) => resolve(source, obj)?.as_i64().ok(),
            None => None,
        };
        Ok(Self {
            media_box,
            content,
            resources,
            rotate,
        })
    }

    /// Add the page to `dest` under `parent`, with already-copied resources
    pub(crate) fn write(self, dest: &mut Document, parent: ObjectId, resources: Dictionary) -> ObjectId {
        let content_id = dest.add_object(Stream::new(Dictionary::new(), self.content));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(parent),
            "MediaBox" => rect_object(self.media_box),
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        };
        if let Some(rotate) = self.rotate {
            page.set("Rotate", rotate);
        }
        dest.add_object(page)
    }
}

/// Write the root `Pages` node and the catalog
pub(crate) fn finish_page_tree(dest: &mut Document, pages_id: ObjectId, kids: &[ObjectId]) {
    dest.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => kids.len() as i64,
        }),
    );
    let catalog_id = dest.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    dest.trailer.set("Root", Object::Reference(catalog_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::catalog_has_acroform;
    use crate::test_support::{page_content_text, widget, PdfBuilder};
    use lopdf::content::Content;

    fn form_pdf() -> Vec<u8> {
        let mut builder = PdfBuilder::new();
        builder.label("Form").nested_pages(true);
        builder.page_with_annots(vec![widget("a", [10.0, 10.0, 50.0, 30.0])]);
        builder.page();
        builder.page_with_annots(vec![widget("c", [10.0, 10.0, 50.0, 30.0])]);
        builder.build()
    }

    #[test]
    fn test_stripped_pdf_has_no_annotations_or_acroform() {
        let stripped = strip_form(&form_pdf()).unwrap();
        let doc = Document::load_mem(&stripped).unwrap();

        assert!(!catalog_has_acroform(&doc));
        assert_eq!(doc.get_pages().len(), 3);
        for page_id in doc.get_pages().values() {
            let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
            assert!(!page.has(b"Annots"));
        }
    }

    #[test]
    fn test_content_and_media_boxes_survive() {
        let mut builder = PdfBuilder::new();
        builder.label("Wide").media_box([0, 0, 842, 595]).pages(2);
        let stripped = strip_form(&builder.build()).unwrap();
        let doc = Document::load_mem(&stripped).unwrap();

        for (index, page_id) in doc.get_pages().values().enumerate() {
            assert_eq!(page_media_box(&doc, *page_id).unwrap(), [0.0, 0.0, 842.0, 595.0]);
            assert!(page_content_text(&doc, index).contains(&format!("Wide-Page-{}", index + 1)));
        }
    }

    #[test]
    fn test_resources_are_deep_copied() {
        let stripped = strip_form(&form_pdf()).unwrap();
        let doc = Document::load_mem(&stripped).unwrap();

        let page_id = *doc.get_pages().get(&1).unwrap();
        let resources = page_resources(&doc, page_id).unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        let font_id = fonts.get(b"F1").unwrap().as_reference().unwrap();
        let font = doc.get_object(font_id).unwrap().as_dict().unwrap();
        assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    }

    #[test]
    fn test_rotation_is_carried() {
        let mut source = PdfBuilder::new().pages(1).build_document();
        let page_id = *source.get_pages().get(&1).unwrap();
        source
            .get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Rotate", 90);

        let stripped = strip_document(&source).unwrap();
        let new_page = *stripped.get_pages().get(&1).unwrap();
        let page = stripped.get_object(new_page).unwrap().as_dict().unwrap();
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
    }

    #[test]
    fn test_garbage_input_is_parse_error() {
        let err = strip_form(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfFormError::ParseError(_)));
    }

    #[test]
    fn test_split_content_streams_stay_separate() {
        let mut source = PdfBuilder::new().pages(1).build_document();
        let page_id = *source.get_pages().get(&1).unwrap();
        let first = source.add_object(Stream::new(Dictionary::new(), b"q 1 0 0 1 5 5 cm".to_vec()));
        let second = source.add_object(Stream::new(Dictionary::new(), b"Q".to_vec()));
        source
            .get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set(
                "Contents",
                vec![Object::Reference(first), Object::Reference(second)],
            );

        let stripped = strip_document(&source).unwrap();
        let new_page = *stripped.get_pages().get(&1).unwrap();
        let content = page_content(&stripped, new_page).unwrap();
        let operators: Vec<String> = Content::decode(&content)
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect();
        assert_eq!(operators, vec!["q", "cm", "Q"]);
    }

    #[test]
    fn test_compressed_content_is_decoded() {
        let mut source = PdfBuilder::new().pages(1).build_document();
        source.compress();
        let stripped = strip_document(&source).unwrap();
        let new_page = *stripped.get_pages().get(&1).unwrap();
        let content = page_content(&stripped, new_page).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("Doc-Page-1"));
    }
}
