//! TrueType font embedding
//!
//! The font is embedded once per fill as a simple TrueType font with
//! WinAnsi encoding. Text is encoded one byte per character; anything
//! WinAnsi cannot express is drawn as `?`.

use crate::error::PdfFormError;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use ttf_parser::{name_id, Face};
use tracing::debug;

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// Unicode values of WinAnsi codes 0x80..=0x9F; `None` marks unused codes.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// The character a WinAnsi code stands for
pub fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as char),
        0x80..=0x9F => WIN_ANSI_HIGH[(code - 0x80) as usize],
        _ => None,
    }
}

/// Encode text as WinAnsi bytes, substituting `?` for unmappable characters
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x20..=0x7E | 0xA0..=0xFF => ch as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .position(|mapped| *mapped == Some(ch))
                .map(|index| 0x80 + index as u8)
                .unwrap_or(b'?'),
        })
        .collect()
}

/// A font registered in the output document, ready to be named by pages
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    font_id: ObjectId,
    size: f64,
    glyph_height: f64,
}

impl EmbeddedFont {
    /// Parse `font_data` and add it to `doc` as a WinAnsi TrueType font
    pub fn embed(doc: &mut Document, font_data: &[u8], size: f64) -> Result<Self, PdfFormError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(PdfFormError::Validation(format!(
                "Font size must be a positive number, got {}",
                size
            )));
        }

        let face = Face::parse(font_data, 0)
            .map_err(|e| PdfFormError::ParseError(format!("Failed to parse font: {}", e)))?;
        if face.tables().glyf.is_none() {
            return Err(PdfFormError::Validation(
                "Font has no TrueType outlines (glyf table); CFF fonts cannot be embedded".into(),
            ));
        }

        let units_per_em = f64::from(face.units_per_em().max(1));
        let to_pdf_units = |value: f64| (value * 1000.0 / units_per_em).round() as i64;

        let base_font = face
            .names()
            .into_iter()
            .find(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .map(|name| name.replace(' ', ""))
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let widths: Vec<Object> = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                let advance = win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .unwrap_or(0);
                Object::Integer(to_pdf_units(f64::from(advance)))
            })
            .collect();

        let bbox = face.global_bounding_box();
        let cap_height = face
            .capital_height()
            .map(f64::from)
            .unwrap_or_else(|| f64::from(face.ascender()));
        let glyph_height_units = face
            .glyph_index('X')
            .and_then(|glyph| face.glyph_bounding_box(glyph))
            .map(|rect| f64::from(rect.y_max) - f64::from(rect.y_min))
            .unwrap_or(cap_height);

        let font_file = doc.add_object(Stream::new(
            dictionary! { "Length1" => font_data.len() as i64 },
            font_data.to_vec(),
        ));

        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(base_font.clone().into_bytes()),
            // Nonsymbolic
            "Flags" => 32,
            "FontBBox" => vec![
                to_pdf_units(f64::from(bbox.x_min)).into(),
                to_pdf_units(f64::from(bbox.y_min)).into(),
                to_pdf_units(f64::from(bbox.x_max)).into(),
                to_pdf_units(f64::from(bbox.y_max)).into(),
            ],
            "ItalicAngle" => 0,
            "Ascent" => to_pdf_units(f64::from(face.ascender())),
            "Descent" => to_pdf_units(f64::from(face.descender())),
            "CapHeight" => to_pdf_units(cap_height),
            "StemV" => 80,
            "FontFile2" => Object::Reference(font_file),
        });

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => Object::Name(base_font.clone().into_bytes()),
            "FirstChar" => i64::from(FIRST_CHAR),
            "LastChar" => i64::from(LAST_CHAR),
            "Widths" => widths,
            "FontDescriptor" => Object::Reference(descriptor),
            "Encoding" => "WinAnsiEncoding",
        });

        debug!(
            "Embedded font {} ({} bytes) at {}pt",
            base_font,
            font_data.len(),
            size
        );

        Ok(Self {
            font_id,
            size,
            glyph_height: glyph_height_units * size / units_per_em,
        })
    }

    pub fn object_id(&self) -> ObjectId {
        self.font_id
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Height of the `X` glyph's bounding box at this size
    pub fn glyph_height(&self) -> f64 {
        self.glyph_height
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        encode_win_ansi(text)
    }

    /// Helvetica with its published cap height; lets renderer tests run
    /// without a font file on disk.
    #[cfg(test)]
    pub(crate) fn standard_helvetica(doc: &mut Document, size: f64) -> Self {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            font_id,
            size,
            glyph_height: 718.0 * size / 1000.0,
        }
    }
}
