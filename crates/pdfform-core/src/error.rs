use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfFormError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid field data: {0}")]
    Validation(String),

    #[error("Content integrity check failed: {0}")]
    Integrity(String),

    #[error("Cannot render field: {0}")]
    FieldRender(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for PdfFormError {
    fn from(err: lopdf::Error) -> Self {
        PdfFormError::OperationError(err.to_string())
    }
}
