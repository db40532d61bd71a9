//! Field extraction
//!
//! Produces the field-description document for a PDF and, on request, the
//! form-free copy of the PDF that the description is bound to.

use crate::digest::content_hash;
use crate::error::PdfFormError;
use crate::model::FieldDataDocument;
use crate::objects::{catalog_has_acroform, load_document, resolve, resolve_dict, save_document};
use crate::page_tree::{collect_fields, PageNumbering};
use crate::strip::strip_document;
use lopdf::Document;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub numbering: PageNumbering,
    /// Also produce the output PDF and bind the data to it
    pub output_pdf: bool,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub data: FieldDataDocument,
    /// The stripped PDF, or a copy of the input when it had no form
    pub output_pdf: Option<Vec<u8>>,
}

pub fn extract_fields(pdf: &[u8], options: ExtractOptions) -> Result<Extraction, PdfFormError> {
    let doc = load_document(pdf)?;
    let num_pages = root_page_count(&doc);

    let (fields, output_pdf) = if catalog_has_acroform(&doc) {
        let fields = collect_fields(&doc, options.numbering)?;
        let output = if options.output_pdf {
            let mut stripped = strip_document(&doc)?;
            Some(save_document(&mut stripped)?)
        } else {
            None
        };
        (fields, output)
    } else {
        warn!("PDF has no AcroForm; no fields extracted");
        (Vec::new(), options.output_pdf.then(|| pdf.to_vec()))
    };

    let mut data = FieldDataDocument::new(num_pages, fields);
    data.content_hash = output_pdf.as_deref().map(content_hash);

    let out_of_range = data.out_of_range_fields(num_pages).len();
    if out_of_range > 0 {
        warn!(
            "{} fields lie beyond the document's {} pages",
            out_of_range, num_pages
        );
    }
    info!(
        "Extracted {} fields from {} pages",
        data.fields.len(),
        num_pages
    );
    Ok(Extraction { data, output_pdf })
}

/// `Count` of the root page node, or the number of leaf pages without one
fn root_page_count(doc: &Document) -> u32 {
    let count = doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.get(b"Pages").ok())
        .and_then(|pages| resolve_dict(doc, pages).ok())
        .and_then(|pages| pages.get(b"Count").ok())
        .and_then(|count| resolve(doc, count).ok())
        .and_then(|count| count.as_i64().ok())
        .and_then(|count| u32::try_from(count).ok());
    count.unwrap_or_else(|| doc.get_pages().len() as u32)
}
