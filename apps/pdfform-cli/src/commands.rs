//! Subcommand handlers
//!
//! File I/O lives here; everything else is delegated to `pdfform_core`.

use crate::cli::{
    Command, ConcatArgs, FieldsArgs, FillArgs, FillSource, MergeArgs, StripArgs, WatermarkArgs,
};
use anyhow::{bail, Context, Result};
use pdfform_core::{
    concat_documents, extract_fields, fill_pdf, merge_field_data, strip_form, watermark_pdf,
    ExtractOptions, FieldDataDocument, FillOptions,
};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

pub async fn run(command: Command) -> Result<()> {
    match command {
        Command::Concat(args) => concat(args).await,
        Command::Fields(args) => fields(args).await,
        Command::Strip(args) => strip(args).await,
        Command::Merge(args) => merge(args).await,
        Command::Watermark(args) => watermark(args).await,
        Command::Fill(args) => fill(args).await,
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn read_data(path: &Path) -> Result<FieldDataDocument> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    FieldDataDocument::from_json5(&text)
        .with_context(|| format!("Invalid field data in {}", path.display()))
}

async fn write_data(path: &Path, data: &FieldDataDocument) -> Result<()> {
    let json = data.to_json_pretty()?;
    write_file(path, json.as_bytes()).await
}

pub async fn concat(args: ConcatArgs) -> Result<()> {
    for path in &args.pdfs {
        if !fs::try_exists(path).await.unwrap_or(false) {
            bail!("File {} does not exist", path.display());
        }
    }

    let mut documents = Vec::with_capacity(args.pdfs.len());
    for path in &args.pdfs {
        documents.push(read_file(path).await?);
    }
    let output = concat_documents(documents)?;
    write_file(&args.output_file, &output).await?;
    info!(
        "Concatenated {} PDFs into {}",
        args.pdfs.len(),
        args.output_file.display()
    );
    Ok(())
}

pub async fn fields(args: FieldsArgs) -> Result<()> {
    let pdf = read_file(&args.pdf).await?;
    let extraction = extract_fields(
        &pdf,
        ExtractOptions {
            numbering: args.page_numbering.into(),
            output_pdf: args.output_file.is_some(),
        },
    )
    .with_context(|| format!("Failed to extract fields from {}", args.pdf.display()))?;

    // The data names the PDF's digest, so the PDF has to exist first.
    if let (Some(path), Some(output)) = (&args.output_file, &extraction.output_pdf) {
        write_file(path, output).await?;
        info!("Wrote stripped PDF to {}", path.display());
    }

    write_data(&args.data_file, &extraction.data).await?;
    info!(
        "Wrote {} fields to {}",
        extraction.data.fields.len(),
        args.data_file.display()
    );
    Ok(())
}

pub async fn strip(args: StripArgs) -> Result<()> {
    let pdf = read_file(&args.pdf).await?;
    let output = strip_form(&pdf)
        .with_context(|| format!("Failed to strip {}", args.pdf.display()))?;
    write_file(&args.output_file, &output).await?;
    info!("Wrote stripped PDF to {}", args.output_file.display());
    Ok(())
}

pub async fn merge(args: MergeArgs) -> Result<()> {
    let from = read_data(&args.from).await?;
    let mut to = read_data(&args.to).await?;

    let summary = merge_field_data(&from, &mut to);
    write_data(&args.to, &to).await?;
    info!(
        "Merged {}: {} fields updated, {} added",
        args.to.display(),
        summary.updated,
        summary.added
    );
    Ok(())
}

pub async fn watermark(args: WatermarkArgs) -> Result<()> {
    let pdf = read_file(&args.pdf).await?;
    let mark = read_file(&args.watermark_file).await?;
    let output = watermark_pdf(&pdf, &mark).with_context(|| {
        format!(
            "Failed to watermark {} with {}",
            args.pdf.display(),
            args.watermark_file.display()
        )
    })?;
    write_file(&args.output_file, &output).await?;
    info!("Wrote watermarked PDF to {}", args.output_file.display());
    Ok(())
}

pub async fn fill(args: FillArgs) -> Result<()> {
    let data = match args.source() {
        Some(FillSource::File(path)) => read_data(&path).await?,
        Some(FillSource::Inline(text)) => {
            FieldDataDocument::from_json5(&text).context("Invalid inline field data")?
        }
        None => bail!("No field data given; use --data-file or --data"),
    };

    let font = match &args.font_file {
        Some(path) => {
            debug!("Using font {}", path.display());
            Some(read_file(path).await?)
        }
        None => None,
    };

    let pdf = read_file(&args.pdf).await?;
    let options = FillOptions {
        font,
        font_size: args.font_size,
        checkbox_borders: args.checkbox_borders,
        ..Default::default()
    };
    let output = fill_pdf(&pdf, &data, &options)
        .with_context(|| format!("Failed to fill {}", args.pdf.display()))?;
    write_file(&args.output_file, &output).await?;
    info!("Wrote filled PDF to {}", args.output_file.display());
    Ok(())
}
