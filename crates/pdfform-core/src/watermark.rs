//! Page watermarking
//!
//! The first page of the watermark document becomes a form XObject that is
//! painted, centred, over every page of a stripped copy of the source.

use crate::content::ContentBuilder;
use crate::error::PdfFormError;
use crate::objects::{load_document, page_ids, rect_object, save_document, ObjectCopier};
use crate::strip::{finish_page_tree, StrippedPage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use tracing::{debug, info};

const WATERMARK_NAME: &str = "Wm1";

pub fn watermark_pdf(pdf: &[u8], watermark_pdf: &[u8]) -> Result<Vec<u8>, PdfFormError> {
    let source = load_document(pdf)?;
    let watermark = load_document(watermark_pdf)?;

    let watermark_page = page_ids(&watermark)
        .into_iter()
        .next()
        .ok_or_else(|| PdfFormError::Validation("Watermark PDF has no pages".into()))?;
    let mark = StrippedPage::read(&watermark, watermark_page)?;
    let (mark_w, mark_h) = (mark.media_box[2], mark.media_box[3]);

    let mut dest = Document::with_version(source.version.clone());
    let pages_id = dest.new_object_id();

    let mark_resources = ObjectCopier::new(&watermark).copy_dictionary(&mut dest, &mark.resources)?;
    let form_id = dest.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => rect_object(mark.media_box),
            "Resources" => mark_resources,
        },
        mark.content,
    ));

    let mut copier = ObjectCopier::new(&source);
    let mut kids = Vec::new();
    for (index, page_id) in page_ids(&source).into_iter().enumerate() {
        let mut page = StrippedPage::read(&source, page_id)?;
        let mut resources = copier.copy_dictionary(&mut dest, &page.resources)?;

        let (page_w, page_h) = (page.media_box[2], page.media_box[3]);
        let (dx, dy) = ((page_w - mark_w) / 2.0, (page_h - mark_h) / 2.0);

        // Source content is isolated so its state cannot leak into the mark.
        let mut overlay = ContentBuilder::new();
        overlay
            .save_state()
            .translate(dx, dy)
            .paint_xobject(WATERMARK_NAME)
            .restore_state();
        let mut content = b"q\n".to_vec();
        content.append(&mut page.content);
        content.extend_from_slice(b"\nQ\n");
        content.extend(overlay.take_encoded()?);
        page.content = content;

        let mut xobjects = match resources.get(b"XObject") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => dest.get_object(*id)?.as_dict()?.clone(),
            _ => Dictionary::new(),
        };
        xobjects.set(WATERMARK_NAME, Object::Reference(form_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        debug!("Watermarked page {} at offset ({}, {})", index, dx, dy);
        kids.push(page.write(&mut dest, pages_id, resources));
    }

    finish_page_tree(&mut dest, pages_id, &kids);
    info!("Watermarked {} pages", kids.len());
    save_document(&mut dest)
}
