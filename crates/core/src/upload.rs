//! Upload intake rules: payload size ceiling and media-type allow-list.
//!
//! These checks run before anything is written, so a rejected upload leaves
//! no trace in the object store or the database.

use crate::error::CoreError;

/// Hard ceiling on uploaded payloads: 50 MiB.
pub const MAX_UPLOAD_BYTES: i64 = 50 * 1024 * 1024;

/// Maximum title length for a note.
pub const MAX_TITLE_LEN: usize = 255;

/// Media types accepted at upload time.
///
/// Documents (PDF, Word, PowerPoint) plus common image formats. Everything
/// else is rejected up front.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

/// Returns `true` if `mime_type` is accepted at upload time.
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

/// Validate an upload payload before any write happens.
///
/// Rules:
/// - The payload must not be empty.
/// - The declared size must not exceed [`MAX_UPLOAD_BYTES`].
/// - The declared media type must be on the allow-list.
pub fn validate_upload(
    payload_len: usize,
    declared_size: i64,
    mime_type: &str,
) -> Result<(), CoreError> {
    if payload_len == 0 {
        return Err(CoreError::Validation("File is required".to_string()));
    }
    if declared_size > MAX_UPLOAD_BYTES || payload_len as i64 > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(
            "File size exceeds maximum allowed size of 50MB".to_string(),
        ));
    }
    if !is_allowed_mime_type(mime_type) {
        return Err(CoreError::Validation(
            "File type not allowed. Allowed types: PDF, images, Word, PowerPoint".to_string(),
        ));
    }
    Ok(())
}

/// Validate a note title.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".to_string()));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must not exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Derive the file extension (including the dot) from an original filename.
///
/// Only the basename is considered and only short alphanumeric extensions
/// are kept, so no path component of a hostile filename can ever reach a
/// storage key.
pub fn file_extension(original_name: &str) -> &str {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    match base.rfind('.') {
        Some(idx) if idx > 0 && idx < base.len() - 1 => {
            let ext = &base[idx..];
            let body = &ext[1..];
            if body.len() <= 8 && body.chars().all(|c| c.is_ascii_alphanumeric()) {
                ext
            } else {
                ""
            }
        }
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_payload_rejected() {
        let err = validate_upload(0, 0, "application/pdf").unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn oversized_declared_size_rejected() {
        let err = validate_upload(10, MAX_UPLOAD_BYTES + 1, "application/pdf").unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn disallowed_mime_rejected() {
        let err = validate_upload(10, 10, "application/zip").unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn pdf_within_limit_accepted() {
        assert!(validate_upload(1024, 1024, "application/pdf").is_ok());
    }

    #[test]
    fn png_accepted() {
        assert!(validate_upload(64, 64, "image/png").is_ok());
    }

    #[test]
    fn title_rules() {
        assert!(validate_title("Week 3 summary").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(file_extension("notes.pdf"), ".pdf");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("noext"), "");
        assert_eq!(file_extension(".hidden"), "");
    }

    #[test]
    fn extension_never_carries_path_components() {
        assert_eq!(file_extension("../../etc/passwd"), "");
        assert_eq!(file_extension("dir/week1.pdf"), ".pdf");
        assert_eq!(file_extension("evil.a/b"), "");
    }
}
