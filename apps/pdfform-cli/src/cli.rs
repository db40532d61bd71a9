//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use pdfform_core::{PageNumbering, DEFAULT_FONT_SIZE};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdfform")]
#[command(
    version,
    about = "Extract, merge and fill form field data for PDF documents",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Concatenate two or more PDFs, in the order given
    Concat(ConcatArgs),
    /// Extract the field data from a PDF and optionally create a PDF
    /// stripped of its AcroForm and annotations, bound to the data by digest
    Fields(FieldsArgs),
    /// Strip the AcroForm and page annotations from a PDF
    Strip(StripArgs),
    /// Merge pages, rectangles and new entries from one data file into another.
    /// Fields are never deleted, only added or modified
    Merge(MergeArgs),
    /// Add a watermark to every page of a PDF. Strips the AcroForm and
    /// annotations in the resulting file
    Watermark(WatermarkArgs),
    /// Draw field data onto the pages of a PDF, checking the data's digest
    /// against the PDF first
    Fill(FillArgs),
}

#[derive(Args, Debug)]
pub struct ConcatArgs {
    /// PDFs to concatenate
    #[arg(required = true)]
    pub pdfs: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short = 'o', long = "output-file")]
    pub output_file: PathBuf,
}

#[derive(Args, Debug)]
pub struct FieldsArgs {
    pub pdf: PathBuf,

    /// Output data file
    #[arg(short = 'd', long = "data-file")]
    pub data_file: PathBuf,

    /// Optional output PDF stripped of AcroForm and annotations; its digest
    /// is written to the data file as contentHash
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// How field page indices are counted
    #[arg(long, value_enum, default_value_t = Numbering::Annotated)]
    pub page_numbering: Numbering,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Numbering {
    /// Count only pages that carry annotations
    Annotated,
    /// Count every page
    Document,
}

impl From<Numbering> for PageNumbering {
    fn from(value: Numbering) -> Self {
        match value {
            Numbering::Annotated => PageNumbering::AnnotatedPages,
            Numbering::Document => PageNumbering::DocumentOrder,
        }
    }
}

#[derive(Args, Debug)]
pub struct StripArgs {
    pub pdf: PathBuf,

    /// Output PDF file
    #[arg(short = 'o', long = "output-file")]
    pub output_file: PathBuf,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Data file to take geometry and new fields from
    pub from: PathBuf,
    /// Data file to update in place
    pub to: PathBuf,
}

#[derive(Args, Debug)]
pub struct WatermarkArgs {
    pub pdf: PathBuf,

    /// PDF whose first page is the watermark
    #[arg(short = 'w', long = "watermark-file")]
    pub watermark_file: PathBuf,

    /// Output PDF file
    #[arg(short = 'o', long = "output-file")]
    pub output_file: PathBuf,
}

#[derive(Args, Debug)]
pub struct FillArgs {
    pub pdf: PathBuf,

    /// Output PDF file
    #[arg(short = 'o', long = "output-file")]
    pub output_file: PathBuf,

    /// Input JSON5 data file
    #[arg(
        short = 'd',
        long = "data-file",
        conflicts_with = "data",
        required_unless_present = "data"
    )]
    pub data_file: Option<PathBuf>,

    /// Inline JSON5 data, instead of a data file
    #[arg(long)]
    pub data: Option<String>,

    /// TrueType font file for plaintext and signhere fields
    #[arg(short = 'f', long = "font-file", env = "PDFFORM_FONT_FILE")]
    pub font_file: Option<PathBuf>,

    /// Font size in points
    #[arg(
        short = 's',
        long = "font-size",
        env = "PDFFORM_FONT_SIZE",
        default_value_t = DEFAULT_FONT_SIZE,
        value_parser = parse_font_size
    )]
    pub font_size: f64,

    /// Put borders around checkboxes
    #[arg(short = 'c', long = "checkbox-borders")]
    pub checkbox_borders: bool,
}

/// Where fill data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillSource {
    File(PathBuf),
    Inline(String),
}

impl FillArgs {
    pub fn source(&self) -> Option<FillSource> {
        match (&self.data_file, &self.data) {
            (Some(path), _) => Some(FillSource::File(path.clone())),
            (None, Some(text)) => Some(FillSource::Inline(text.clone())),
            (None, None) => None,
        }
    }
}

fn parse_font_size(value: &str) -> Result<f64, String> {
    let size: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(format!("font size must be positive, got {}", value))
    }
}
