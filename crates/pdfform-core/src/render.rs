//! Field rendering
//!
//! Draws literal content at each field's rectangle, one page at a time.

use crate::canvas::{Open, PageCanvas};
use crate::content::{ContentBuilder, LineCap};
use crate::error::PdfFormError;
use crate::font::EmbeddedFont;
use crate::geometry::FieldBox;
use crate::model::{FieldDescriptor, FieldType};
use crate::objects::{real, rect_object};
use crate::qr::{qr_image_in, DEFAULT_QR_VALUE};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::f64::consts::FRAC_PI_4;
use std::path::PathBuf;
use tracing::{debug, warn};

const HIGHLIGHT_COLOR: (f64, f64, f64) = (1.0, 1.0, 0.6);
const SIGN_HERE_COLOR: (f64, f64, f64) = (1.0, 0.6, 1.0);
const SIGN_HERE_OPACITY: f64 = 0.5;
const CHECKBOX_LINE_WIDTH: f64 = 2.5;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Stroke a frame around every checkbox
    pub checkbox_borders: bool,
    /// Where QR rasters are staged; the system temp directory when unset
    pub temp_dir: Option<PathBuf>,
}

pub struct FieldRenderer<'f> {
    font: Option<&'f EmbeddedFont>,
    options: RenderOptions,
}

impl<'f> FieldRenderer<'f> {
    pub fn new(font: Option<&'f EmbeddedFont>, options: RenderOptions) -> Self {
        Self { font, options }
    }

    /// Draw `fields` onto one page, in the order given
    pub fn render_page(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
        fields: &[&FieldDescriptor],
    ) -> Result<(), PdfFormError> {
        let mut canvas = PageCanvas::begin(doc, page_id)?;
        for field in fields {
            canvas = self.render_field(canvas, field)?;
        }
        canvas.finish()
    }

    fn render_field<'d>(
        &self,
        mut canvas: PageCanvas<'d, Open>,
        field: &FieldDescriptor,
    ) -> Result<PageCanvas<'d, Open>, PdfFormError> {
        let field_box = field.field_box();
        let field_type = match &field.field_type {
            Some(field_type) => field_type,
            None => {
                warn!("Field '{}' has no 'type' defined", field.name);
                return Ok(canvas);
            }
        };
        debug!("Rendering {} field '{}'", field_type, field.name);

        match field_type {
            FieldType::Highlight => {
                draw_highlight(canvas.content(), &field_box);
                Ok(canvas)
            }
            FieldType::PlainText => {
                let font = self.require_font(field)?;
                let font_name = canvas.use_font(font.object_id(), "F")?;
                let text = font.encode(&format!(" {}", field.value_text()));
                draw_plain_text(canvas.content(), &field_box, &font_name, font.size(), text);
                Ok(canvas)
            }
            FieldType::Checkbox => {
                draw_checkbox(
                    canvas.content(),
                    &field_box,
                    self.options.checkbox_borders,
                    field.is_checked(),
                );
                Ok(canvas)
            }
            FieldType::QrCode => self.render_qr_code(canvas, field, &field_box),
            FieldType::SignHere => self.render_sign_here(canvas, field, &field_box),
            FieldType::Unknown(other) => {
                warn!("Field '{}' is of unknown type '{}'", field.name, other);
                Ok(canvas)
            }
        }
    }

    fn require_font(&self, field: &FieldDescriptor) -> Result<&'f EmbeddedFont, PdfFormError> {
        self.font.ok_or_else(|| {
            PdfFormError::FieldRender(format!(
                "Field '{}': a font file must be specified for '{}' fields",
                field.name,
                field.field_type.as_ref().map(FieldType::as_str).unwrap_or_default()
            ))
        })
    }

    fn render_qr_code<'d>(
        &self,
        canvas: PageCanvas<'d, Open>,
        field: &FieldDescriptor,
        field_box: &FieldBox,
    ) -> Result<PageCanvas<'d, Open>, PdfFormError> {
        let value = match field.value_text() {
            text if text.is_empty() => DEFAULT_QR_VALUE.to_string(),
            text => text,
        };
        let temp_dir = self.options.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        let image = qr_image_in(&value, &temp_dir)?;
        let (image_w, image_h) = (f64::from(image.width), f64::from(image.height));

        let mut closed = canvas.close()?;
        let image_id = closed.add_object(image.to_xobject()?);

        let mut form_content = ContentBuilder::new();
        form_content
            .save_state()
            .transform([image_w, 0.0, 0.0, image_h, 0.0, 0.0])
            .paint_xobject("Im1")
            .restore_state();
        let form = form_xobject(
            [0.0, 0.0, image_w, image_h],
            dictionary! { "XObject" => dictionary! { "Im1" => Object::Reference(image_id) } },
            form_content.take_encoded()?,
        );
        let form_name = closed.add_xobject(form, "Fm")?;

        let mut canvas = closed.reopen();
        canvas
            .content()
            .save_state()
            .transform([
                field_box.width / image_w,
                0.0,
                0.0,
                field_box.height / image_h,
                field_box.x,
                field_box.y,
            ])
            .paint_xobject(&form_name)
            .restore_state();
        Ok(canvas)
    }

    fn render_sign_here<'d>(
        &self,
        canvas: PageCanvas<'d, Open>,
        field: &FieldDescriptor,
        field_box: &FieldBox,
    ) -> Result<PageCanvas<'d, Open>, PdfFormError> {
        let font = self.require_font(field)?;
        let (w, h) = (field_box.width, field_box.height);
        let half_h = h / 2.0;

        let mut closed = canvas.close()?;
        let gs_id = closed.add_object(translucent_state(SIGN_HERE_OPACITY));

        let mut flag = ContentBuilder::new();
        let (r, g, b) = SIGN_HERE_COLOR;
        flag.save_state()
            .graphics_state("GS1")
            .fill_rgb(r, g, b)
            .move_to(0.0, half_h)
            .line_to(half_h, 0.0)
            .line_to(w, 0.0)
            .line_to(w, h)
            .line_to(half_h, h)
            .fill()
            .stroke_gray(0.0)
            .line_cap(LineCap::Butt)
            .line_width(1.0)
            .move_to(half_h, h)
            .line_to(0.0, half_h)
            .line_to(half_h, 0.0)
            .stroke()
            .line_width(2.0)
            .move_to(half_h, 0.0)
            .line_to(w, 0.0)
            .line_to(w, h)
            .line_to(half_h, h)
            .stroke()
            .begin_text()
            .fill_gray(0.0)
            .text_matrix([1.0, 0.0, 0.0, 1.0, half_h, half_h - font.glyph_height() / 2.0])
            .font("F1", font.size())
            .show_text(font.encode(&format!("Sign Here {}", field.value_text())))
            .end_text()
            .restore_state();

        let form = form_xobject(
            [0.0, 0.0, w, h],
            dictionary! {
                "ExtGState" => dictionary! { "GS1" => Object::Reference(gs_id) },
                "Font" => dictionary! { "F1" => Object::Reference(font.object_id()) },
            },
            flag.take_encoded()?,
        );
        let form_name = closed.add_xobject(form, "Fm")?;

        // The flag is as tall as the field and points at its lower-left
        // corner from 45 degrees.
        let (sin, cos) = FRAC_PI_4.sin_cos();
        let mut canvas = closed.reopen();
        canvas
            .content()
            .save_state()
            .translate(field_box.x, field_box.y)
            .transform([cos, sin, -sin, cos, 0.0, 0.0])
            .translate(0.0, -half_h)
            .paint_xobject(&form_name)
            .restore_state();
        Ok(canvas)
    }
}

fn draw_highlight(content: &mut ContentBuilder, field_box: &FieldBox) {
    let (r, g, b) = HIGHLIGHT_COLOR;
    content
        .save_state()
        .fill_rgb(r, g, b)
        .rectangle(field_box.x, field_box.y, field_box.width, field_box.height)
        .fill()
        .restore_state();
}

fn draw_plain_text(
    content: &mut ContentBuilder,
    field_box: &FieldBox,
    font_name: &str,
    font_size: f64,
    text: Vec<u8>,
) {
    content
        .save_state()
        .begin_text()
        .fill_gray(0.0)
        .text_rise(field_box.height / 6.0)
        .text_matrix([1.0, 0.0, 0.0, 1.0, field_box.x, field_box.y])
        .font(font_name, font_size)
        .show_text(text)
        .end_text()
        .restore_state();
}

fn draw_checkbox(content: &mut ContentBuilder, field_box: &FieldBox, borders: bool, checked: bool) {
    let FieldBox {
        x,
        y,
        width: w,
        height: h,
    } = *field_box;

    content
        .save_state()
        .stroke_gray(0.0)
        .line_width(CHECKBOX_LINE_WIDTH);

    if borders {
        content
            .line_cap(LineCap::ProjectingSquare)
            .rectangle(x, y, w, h)
            .stroke();
    }

    if checked {
        let (dx, dy) = (w / 5.0, h / 5.0);
        content
            .line_cap(LineCap::Round)
            .move_to(x + dx, y + dy)
            .line_to(x + w - dx, y + h - dy)
            .stroke()
            .move_to(x + dx, y + h - dy)
            .line_to(x + w - dx, y + dy)
            .stroke();
    }

    content.restore_state();
}

fn translucent_state(opacity: f64) -> Dictionary {
    dictionary! {
        "Type" => "ExtGState",
        "ca" => real(opacity),
        "CA" => real(opacity),
        "SA" => true,
    }
}

fn form_xobject(bbox: [f64; 4], resources: Dictionary, content: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => rect_object(bbox),
            "Resources" => resources,
        },
        content,
    )
}
