//! Content digests binding field data to one exact document

use crate::error::PdfFormError;
use md5::Md5;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Lowercase hex SHA-256 of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Check `bytes` against a stored digest.
///
/// 64 hex digits are SHA-256; 32 hex digits are MD5, as written by older
/// data files. Case is ignored.
pub fn verify_content_hash(bytes: &[u8], expected: &str) -> Result<(), PdfFormError> {
    let expected = expected.trim().to_ascii_lowercase();
    let actual = match expected.len() {
        64 => content_hash(bytes),
        32 => hex::encode(Md5::digest(bytes)),
        other => {
            return Err(PdfFormError::Integrity(format!(
                "Unrecognised digest of {} characters; expected SHA-256 or MD5 hex",
                other
            )))
        }
    };

    if actual != expected {
        return Err(PdfFormError::Integrity(format!(
            "Document digest {} does not match the one in the data ({})",
            actual, expected
        )));
    }
    debug!("Content digest verified ({} hex digits)", expected.len());
    Ok(())
}
