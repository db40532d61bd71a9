//! Fill pass
//!
//! Draws the values of a field-description document onto the pages of the
//! PDF it describes and returns the new PDF. Nothing is returned unless
//! every field rendered.

use crate::digest::verify_content_hash;
use crate::error::PdfFormError;
use crate::font::EmbeddedFont;
use crate::model::{FieldDataDocument, FieldDescriptor};
use crate::objects::{catalog_has_acroform, load_document, page_ids, save_document};
use crate::render::{FieldRenderer, RenderOptions};
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const DEFAULT_FONT_SIZE: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct FillOptions {
    /// TrueType font program used by plaintext and signhere fields
    pub font: Option<Vec<u8>>,
    pub font_size: f64,
    pub checkbox_borders: bool,
    pub temp_dir: Option<PathBuf>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            checkbox_borders: false,
            temp_dir: None,
        }
    }
}

pub fn fill_pdf(
    pdf: &[u8],
    data: &FieldDataDocument,
    options: &FillOptions,
) -> Result<Vec<u8>, PdfFormError> {
    data.validate()?;
    if !(options.font_size.is_finite() && options.font_size > 0.0) {
        return Err(PdfFormError::Validation(format!(
            "Font size must be a positive number, got {}",
            options.font_size
        )));
    }

    if let Some(expected) = &data.content_hash {
        verify_content_hash(pdf, expected)?;
    }

    let mut doc = load_document(pdf)?;
    let font = match &options.font {
        Some(font_data) => Some(EmbeddedFont::embed(&mut doc, font_data, options.font_size)?),
        None => None,
    };

    if catalog_has_acroform(&doc) {
        warn!("PDF still has an AcroForm");
    }

    let pages = page_ids(&doc);
    for field in data.out_of_range_fields(pages.len() as u32) {
        warn!(
            "Field '{}' is on page {} but the PDF has {} pages; skipping",
            field.name,
            field.page,
            pages.len()
        );
    }

    let renderer = FieldRenderer::new(
        font.as_ref(),
        RenderOptions {
            checkbox_borders: options.checkbox_borders,
            temp_dir: options.temp_dir.clone(),
        },
    );

    let mut rendered = 0;
    for (index, page_id) in pages.into_iter().enumerate() {
        let fields: Vec<&FieldDescriptor> = data.fields_on_page(index as u32).collect();
        if fields.is_empty() {
            continue;
        }
        debug!("Page {}: {} fields", index, fields.len());
        renderer.render_page(&mut doc, page_id, &fields)?;
        rendered += fields.len();
    }

    info!("Filled {} of {} fields", rendered, data.fields.len());
    save_document(&mut doc)
}
