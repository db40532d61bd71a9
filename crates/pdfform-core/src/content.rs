//! Content stream builder
//!
//! Thin wrapper over `lopdf::content` that names the handful of operators
//! the field renderers use.

use crate::error::PdfFormError;
use crate::objects::real;
use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

/// `J` operand values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt = 0,
    Round = 1,
    ProjectingSquare = 2,
}

#[derive(Debug, Default)]
pub struct ContentBuilder {
    operations: Vec<Operation>,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) -> &mut Self {
        self.operations.push(Operation::new(operator, operands));
        self
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.push("q", vec![])
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.push("Q", vec![])
    }

    pub fn transform(&mut self, m: [f64; 6]) -> &mut Self {
        self.push("cm", m.iter().map(|v| real(*v)).collect())
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.transform([1.0, 0.0, 0.0, 1.0, x, y])
    }

    pub fn fill_rgb(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.push("rg", vec![real(r), real(g), real(b)])
    }

    pub fn fill_gray(&mut self, gray: f64) -> &mut Self {
        self.push("g", vec![real(gray)])
    }

    pub fn stroke_gray(&mut self, gray: f64) -> &mut Self {
        self.push("G", vec![real(gray)])
    }

    pub fn line_width(&mut self, width: f64) -> &mut Self {
        self.push("w", vec![real(width)])
    }

    pub fn line_cap(&mut self, cap: LineCap) -> &mut Self {
        self.push("J", vec![Object::Integer(cap as i64)])
    }

    pub fn graphics_state(&mut self, name: &str) -> &mut Self {
        self.push("gs", vec![Object::Name(name.as_bytes().to_vec())])
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push("m", vec![real(x), real(y)])
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push("l", vec![real(x), real(y)])
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.push("re", vec![real(x), real(y), real(width), real(height)])
    }

    pub fn fill(&mut self) -> &mut Self {
        self.push("f", vec![])
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.push("S", vec![])
    }

    pub fn begin_text(&mut self) -> &mut Self {
        self.push("BT", vec![])
    }

    pub fn end_text(&mut self) -> &mut Self {
        self.push("ET", vec![])
    }

    pub fn text_matrix(&mut self, m: [f64; 6]) -> &mut Self {
        self.push("Tm", m.iter().map(|v| real(*v)).collect())
    }

    pub fn text_rise(&mut self, rise: f64) -> &mut Self {
        self.push("Ts", vec![real(rise)])
    }

    pub fn font(&mut self, resource_name: &str, size: f64) -> &mut Self {
        self.push(
            "Tf",
            vec![Object::Name(resource_name.as_bytes().to_vec()), real(size)],
        )
    }

    /// Show already-encoded text (one byte per character code)
    pub fn show_text(&mut self, encoded: Vec<u8>) -> &mut Self {
        self.push("Tj", vec![Object::String(encoded, StringFormat::Literal)])
    }

    pub fn paint_xobject(&mut self, resource_name: &str) -> &mut Self {
        self.push("Do", vec![Object::Name(resource_name.as_bytes().to_vec())])
    }

    /// Serialise the pending operators and leave the builder empty
    pub fn take_encoded(&mut self) -> Result<Vec<u8>, PdfFormError> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        };
        content
            .encode()
            .map_err(|e| PdfFormError::OperationError(format!("Failed to encode content: {}", e)))
    }
}
