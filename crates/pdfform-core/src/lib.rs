//! PDF form field extraction, stamping and reconciliation
//!
//! This crate works on PDF bytes using lopdf:
//! - `extract_fields`: discover widget fields and describe them in a data document
//! - `fill_pdf`: draw field values as literal page content
//! - `merge_field_data`: carry fresh geometry into an authored data document
//! - `strip_form`, `watermark_pdf`, `concat_documents`: whole-document operations

pub mod canvas;
pub mod concat;
pub mod content;
pub mod digest;
pub mod error;
pub mod extract;
pub mod fill;
pub mod font;
pub mod geometry;
pub mod merge;
pub mod model;
pub mod objects;
pub mod page_tree;
pub mod qr;
pub mod render;
pub mod strip;
pub mod watermark;

#[cfg(test)]
mod test_support;

pub use concat::concat_documents;
pub use digest::{content_hash, verify_content_hash};
pub use error::PdfFormError;
pub use extract::{extract_fields, ExtractOptions, Extraction};
pub use fill::{fill_pdf, FillOptions, DEFAULT_FONT_SIZE};
pub use geometry::{normalize_rect, FieldBox};
pub use merge::{merge_field_data, MergeSummary};
pub use model::{FieldDataDocument, FieldDescriptor, FieldType, FieldValue};
pub use page_tree::PageNumbering;
pub use strip::strip_form;
pub use watermark::watermark_pdf;
