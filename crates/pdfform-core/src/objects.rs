//! lopdf helpers shared by the page-level operations
//!
//! Reference resolution, number/text decoding, page attribute inheritance
//! and a deep copier that moves object graphs between documents.

use crate::error::PdfFormError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Page attributes that may be inherited from an ancestor `Pages` node
pub const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// US Letter, used when a page tree carries no media box at all
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

pub fn load_document(bytes: &[u8]) -> Result<Document, PdfFormError> {
    Document::load_mem(bytes).map_err(|e| PdfFormError::ParseError(e.to_string()))
}

/// Compress every stream and serialise
pub fn save_document(doc: &mut Document) -> Result<Vec<u8>, PdfFormError> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfFormError::OperationError(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

/// Follow one level of indirection
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, PdfFormError> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).map_err(|e| {
            PdfFormError::ParseError(format!("Unresolvable reference {} {} R: {}", id.0, id.1, e))
        }),
        other => Ok(other),
    }
}

pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Dictionary, PdfFormError> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Ok(dict),
        Object::Stream(stream) => Ok(&stream.dict),
        other => Err(PdfFormError::ParseError(format!(
            "Expected a dictionary, found {}",
            type_name(other)
        ))),
    }
}

pub fn resolve_array<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Vec<Object>, PdfFormError> {
    match resolve(doc, obj)? {
        Object::Array(arr) => Ok(arr),
        other => Err(PdfFormError::ParseError(format!(
            "Expected an array, found {}",
            type_name(other)
        ))),
    }
}

pub fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

pub fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key) {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

/// Read a 4-number array such as `Rect` or `MediaBox`
pub fn rect_of(doc: &Document, obj: &Object) -> Result<[f64; 4], PdfFormError> {
    let arr = resolve_array(doc, obj)?;
    if arr.len() != 4 {
        return Err(PdfFormError::ParseError(format!(
            "Expected 4 numbers in rectangle, found {}",
            arr.len()
        )));
    }

    let mut rect = [0.0; 4];
    for (slot, item) in rect.iter_mut().zip(arr) {
        *slot = object_to_f64(resolve(doc, item)?).ok_or_else(|| {
            PdfFormError::ParseError("Rectangle contains a non-numeric entry".into())
        })?;
    }
    Ok(rect)
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or PDFDocEncoding)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    // PDFDocEncoding agrees with Latin-1 for every printable code a field
    // name realistically uses.
    bytes.iter().map(|&b| b as char).collect()
}

/// Look up a page attribute, walking `Parent` links for inheritable keys
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, PdfFormError> {
    let mut current = doc.get_object(page_id)?.as_dict()?;
    // Bounded walk: a malformed tree may link a node to itself.
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Ok(Some(value));
        }
        match current.get(b"Parent") {
            Ok(parent) => current = resolve_dict(doc, parent)?,
            Err(_) => return Ok(None),
        }
    }
    Err(PdfFormError::ParseError(
        "Page tree parent chain is too deep".into(),
    ))
}

pub fn page_media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4], PdfFormError> {
    match inherited_attribute(doc, page_id, b"MediaBox")? {
        Some(obj) => rect_of(doc, obj),
        None => Ok(DEFAULT_MEDIA_BOX),
    }
}

/// The page's effective resource dictionary, cloned
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, PdfFormError> {
    match inherited_attribute(doc, page_id, b"Resources")? {
        Some(obj) => Ok(resolve_dict(doc, obj)?.clone()),
        None => Ok(Dictionary::new()),
    }
}

/// All content streams of a page, decoded and joined with newlines.
///
/// A stream whose filter cannot be undone is taken as it is stored.
pub fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, PdfFormError> {
    let mut content = Vec::new();
    for stream_id in doc.get_page_contents(page_id) {
        let stream = doc.get_object(stream_id)?.as_stream()?;
        match stream.decompressed_content() {
            Ok(bytes) => content.extend_from_slice(&bytes),
            Err(_) => content.extend_from_slice(&stream.content),
        }
        content.push(b'\n');
    }
    Ok(content)
}

/// Pages of `doc` in document order, 0-based
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

pub fn catalog_has_acroform(doc: &Document) -> bool {
    doc.catalog().map(|c| c.has(b"AcroForm")).unwrap_or(false)
}

pub fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

pub fn rect_object(rect: [f64; 4]) -> Object {
    Object::Array(rect.iter().map(|v| real(*v)).collect())
}

fn type_name(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) => "integer",
        Object::Real(_) => "real",
        Object::Name(_) => "name",
        Object::String(..) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
    }
}

/// Copies object graphs from one source document into a destination.
///
/// Every indirect object is copied at most once; references inside copied
/// objects are rewritten to the new ids. `Parent` links are never followed,
/// which keeps a copied resource from dragging the whole source page tree
/// along with it.
pub struct ObjectCopier<'a> {
    source: &'a Document,
    copied: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: BTreeMap::new(),
        }
    }

    pub fn copy_object(&mut self, dest: &mut Document, obj: &Object) -> Result<Object, PdfFormError> {
        Ok(match obj {
            Object::Reference(id) => Object::Reference(self.copy_reference(dest, *id)?),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(dest, item))
                    .collect::<Result<_, _>>()?,
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dest, dict)?),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.copy_dictionary(dest, &stream.dict)?;
                Object::Stream(copy)
            }
            other => other.clone(),
        })
    }

    pub fn copy_dictionary(
        &mut self,
        dest: &mut Document,
        dict: &Dictionary,
    ) -> Result<Dictionary, PdfFormError> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(dest, value)?);
        }
        Ok(copy)
    }

    fn copy_reference(&mut self, dest: &mut Document, id: ObjectId) -> Result<ObjectId, PdfFormError> {
        if let Some(new_id) = self.copied.get(&id) {
            return Ok(*new_id);
        }

        // Reserve the id first so cycles terminate on the lookup above.
        let new_id = dest.new_object_id();
        self.copied.insert(id, new_id);

        let source = self.source;
        let copied = match source.get_object(id) {
            Ok(obj) => self.copy_object(dest, obj)?,
            // Dangling references are legal PDF and mean null.
            Err(_) => Object::Null,
        };
        dest.objects.insert(new_id, copied);
        Ok(new_id)
    }
}
