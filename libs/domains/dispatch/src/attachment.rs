//! Attachment encoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::models::{Attachment, UploadedFile};

/// Convert an optional uploaded file into the transport encoding the mail
/// API expects. Pure and deterministic; the only failure mode is absence of
/// input, and partial input (no name or no bytes) counts as absent.
pub fn encode(file: Option<UploadedFile>) -> Option<Attachment> {
    let file = file?;
    if file.filename.is_empty() || file.bytes.is_empty() {
        return None;
    }
    Some(Attachment {
        name: file.filename,
        content_bytes: STANDARD.encode(&file.bytes),
    })
}
