//! pdfform command-line tool
//!
//! Thin file-handling layer over `pdfform_core`.

pub mod cli;
pub mod commands;
pub mod config;
