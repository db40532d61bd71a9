//! Page drawing context
//!
//! A `PageCanvas<Open>` collects drawing operators for one page. New
//! objects (images, forms, graphics states) can only be registered on a
//! `PageCanvas<Closed>`, that is after the pending operators have been flushed
//! to their own content stream.

use crate::content::ContentBuilder;
use crate::error::PdfFormError;
use crate::objects::{page_resources, resolve_dict};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::marker::PhantomData;
use tracing::debug;

/// Accepting drawing operators
pub struct Open;
/// Content flushed; objects may be registered
pub struct Closed;

pub struct PageCanvas<'a, State> {
    doc: &'a mut Document,
    page_id: ObjectId,
    pending: ContentBuilder,
    isolated: bool,
    _state: PhantomData<State>,
}

impl<'a> PageCanvas<'a, Open> {
    pub fn begin(doc: &'a mut Document, page_id: ObjectId) -> Result<Self, PdfFormError> {
        doc.get_object(page_id)?.as_dict()?;
        Ok(Self {
            doc,
            page_id,
            pending: ContentBuilder::new(),
            isolated: false,
            _state: PhantomData,
        })
    }

    pub fn content(&mut self) -> &mut ContentBuilder {
        &mut self.pending
    }

    /// Flush pending operators into a new stream appended to the page
    pub fn close(mut self) -> Result<PageCanvas<'a, Closed>, PdfFormError> {
        if !self.pending.is_empty() {
            let bytes = self.pending.take_encoded()?;
            self.append_stream(bytes)?;
        }
        Ok(PageCanvas {
            doc: self.doc,
            page_id: self.page_id,
            pending: self.pending,
            isolated: self.isolated,
            _state: PhantomData,
        })
    }

    pub fn finish(self) -> Result<(), PdfFormError> {
        self.close().map(|_| ())
    }
}

impl<'a> PageCanvas<'a, Closed> {
    pub fn reopen(self) -> PageCanvas<'a, Open> {
        PageCanvas {
            doc: self.doc,
            page_id: self.page_id,
            pending: self.pending,
            isolated: self.isolated,
            _state: PhantomData,
        }
    }

    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.doc.add_object(object)
    }

    /// Add an XObject stream to the document and name it in the page resources
    pub fn add_xobject(&mut self, xobject: Stream, prefix: &str) -> Result<String, PdfFormError> {
        let id = self.doc.add_object(xobject);
        self.register_resource(b"XObject", prefix, Object::Reference(id))
    }

}

impl<'a, State> PageCanvas<'a, State> {
    /// Name an existing font object in the page resources
    pub fn use_font(&mut self, font_id: ObjectId, prefix: &str) -> Result<String, PdfFormError> {
        let resources = page_resources(self.doc, self.page_id)?;
        if let Ok(fonts) = resources.get(b"Font") {
            let fonts = resolve_dict(self.doc, fonts)?;
            for (name, value) in fonts.iter() {
                if matches!(value, Object::Reference(id) if *id == font_id) {
                    return Ok(String::from_utf8_lossy(name).into_owned());
                }
            }
        }
        self.register_resource(b"Font", prefix, Object::Reference(font_id))
    }

    /// Write `value` under a fresh name in the page's `category` resources.
    ///
    /// The page always ends up with its own direct resource dictionary, so
    /// a dictionary shared through the page tree is never mutated.
    fn register_resource(
        &mut self,
        category: &[u8],
        prefix: &str,
        value: Object,
    ) -> Result<String, PdfFormError> {
        let mut resources = page_resources(self.doc, self.page_id)?;
        let mut entries = match resources.get(category) {
            Ok(obj) => resolve_dict(self.doc, obj)?.clone(),
            Err(_) => Dictionary::new(),
        };

        let name = unique_name(&entries, prefix);
        entries.set(name.clone(), value);
        resources.set(category.to_vec(), Object::Dictionary(entries));
        self.page_mut()?.set("Resources", Object::Dictionary(resources));

        debug!(
            "Registered /{} in {} of page {:?}",
            name,
            String::from_utf8_lossy(category),
            self.page_id
        );
        Ok(name)
    }

    fn page_mut(&mut self) -> Result<&mut Dictionary, PdfFormError> {
        Ok(self.doc.get_object_mut(self.page_id)?.as_dict_mut()?)
    }

    /// The page's content streams as a list of references
    fn content_refs(&self) -> Result<Vec<Object>, PdfFormError> {
        let page = self.doc.get_object(self.page_id)?.as_dict()?;
        match page.get(b"Contents") {
            Err(_) => Ok(Vec::new()),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id)? {
                Object::Array(items) => Ok(items.clone()),
                _ => Ok(vec![Object::Reference(*id)]),
            },
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(_) => Err(PdfFormError::ParseError(
                "Page Contents is neither a stream nor an array".into(),
            )),
        }
    }

    fn append_stream(&mut self, mut bytes: Vec<u8>) -> Result<(), PdfFormError> {
        if !self.isolated {
            self.isolate_existing_content()?;
            self.isolated = true;
        }

        // Streams are concatenated when read back; keep the last operator separate.
        bytes.push(b'\n');
        let id = self.doc.add_object(Stream::new(Dictionary::new(), bytes));
        let mut contents = self.content_refs()?;
        contents.push(Object::Reference(id));
        self.page_mut()?.set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Wrap the page's original content in `q ... Q`
    fn isolate_existing_content(&mut self) -> Result<(), PdfFormError> {
        let existing = self.content_refs()?;
        if existing.is_empty() {
            return Ok(());
        }

        let save = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore = self.doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save));
        contents.extend(existing);
        contents.push(Object::Reference(restore));
        self.page_mut()?.set("Contents", Object::Array(contents));
        Ok(())
    }
}

fn unique_name(entries: &Dictionary, prefix: &str) -> String {
    (1..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string())
}
