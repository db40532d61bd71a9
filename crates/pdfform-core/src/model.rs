//! Field-description documents
//!
//! The data file that ties field names to page geometry. It is read as
//! JSON5 (hand-edited files carry comments and trailing commas) and always
//! written back as indented JSON, which every JSON5 reader accepts.

use crate::error::PdfFormError;
use crate::geometry::FieldBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a fill pass draws at a field's position.
///
/// Type strings that are not recognised are kept verbatim so they survive a
/// load/merge/save cycle; the renderer warns about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Highlight,
    PlainText,
    QrCode,
    Checkbox,
    SignHere,
    Unknown(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Highlight => "highlight",
            FieldType::PlainText => "plaintext",
            FieldType::QrCode => "qrcode",
            FieldType::Checkbox => "checkbox",
            FieldType::SignHere => "signhere",
            FieldType::Unknown(other) => other,
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "highlight" => FieldType::Highlight,
            "plaintext" => FieldType::PlainText,
            "qrcode" => FieldType::QrCode,
            "checkbox" => FieldType::Checkbox,
            "signhere" => FieldType::SignHere,
            _ => FieldType::Unknown(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value as authored in the data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// `false`, `0` and the empty string are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
            FieldValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// 0-based page index
    pub page: u32,
    /// `[x0, y0, x1, y1]`, lower-left then upper-right
    pub rect: [f64; 4],
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    /// Keys added by hand that this schema does not know about
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, page: u32, rect: [f64; 4]) -> Self {
        Self {
            name: name.into(),
            page,
            rect,
            field_type: None,
            value: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn field_box(&self) -> FieldBox {
        FieldBox::from_rect(&self.rect)
    }

    /// The value as display text; empty when unset.
    pub fn value_text(&self) -> String {
        self.value.as_ref().map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn is_checked(&self) -> bool {
        self.value.as_ref().is_some_and(FieldValue::is_truthy)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDataDocument {
    #[serde(default)]
    pub num_pages: u32,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Digest of the document the field positions were captured against.
    /// Data files written by older tooling call this `md5`.
    #[serde(default, alias = "md5", skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FieldDataDocument {
    pub fn new(num_pages: u32, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            num_pages,
            fields,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON5 (or plain JSON) field-description document
    pub fn from_json5(text: &str) -> Result<Self, PdfFormError> {
        let doc: Self =
            json5::from_str(text).map_err(|e| PdfFormError::Validation(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> Result<String, PdfFormError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PdfFormError::SerializationError(e.to_string()))
    }

    /// Check the properties rendering relies on: every field has a name and
    /// a rectangle made of real numbers.
    pub fn validate(&self) -> Result<(), PdfFormError> {
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(PdfFormError::Validation(format!(
                    "Field at index {} does not have a 'name' property",
                    index
                )));
            }
            if field.rect.iter().any(|v| !v.is_finite()) {
                return Err(PdfFormError::Validation(format!(
                    "Field '{}' has a non-numeric 'rect'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    pub fn fields_on_page(&self, page: u32) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.page == page)
    }

    /// Fields whose page lies outside `[0, page_count)`
    pub fn out_of_range_fields(&self, page_count: u32) -> Vec<&FieldDescriptor> {
        self.fields.iter().filter(|f| f.page >= page_count).collect()
    }
}
