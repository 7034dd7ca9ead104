use std::path::Path;

use crate::{FailureKind, UploadError};

pub const ACCEPTED_MIME_TYPES: [&str; 4] =
    ["application/pdf", "text/markdown", "text/plain", "text/md"];
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "md", "txt"];

const INVALID_FILE_MESSAGE: &str = "Please upload a PDF, MD, or TXT file.";
const EMPTY_TEXT_MESSAGE: &str = "Please enter some text to process.";
const EMPTY_FILE_MESSAGE: &str = "The selected file is empty.";

/// Accepts a document when either its MIME type or its extension is known.
pub fn validate_document(name: &str, mime: Option<&str>, len: usize) -> Result<(), UploadError> {
    let mime_ok = mime.is_some_and(|mime| {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        ACCEPTED_MIME_TYPES
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    });
    let extension_ok = extension(name).is_some_and(|ext| {
        ACCEPTED_EXTENSIONS
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(ext))
    });
    if !mime_ok && !extension_ok {
        return Err(UploadError::new(FailureKind::Validation, INVALID_FILE_MESSAGE));
    }
    if len == 0 {
        return Err(UploadError::new(FailureKind::Validation, EMPTY_FILE_MESSAGE));
    }
    Ok(())
}

pub fn validate_text(content: &str) -> Result<(), UploadError> {
    if content.trim().is_empty() {
        Err(UploadError::new(FailureKind::Validation, EMPTY_TEXT_MESSAGE))
    } else {
        Ok(())
    }
}

/// MIME type for the accepted extensions, `application/octet-stream` otherwise.
pub fn guess_mime(name: &str) -> &'static str {
    match extension(name).map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("md") => "text/markdown",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_by_extension_or_mime() {
        assert!(validate_document("paper.PDF", None, 10).is_ok());
        assert!(validate_document("notes", Some("text/markdown; charset=utf-8"), 10).is_ok());
        assert!(validate_document("readme.txt", Some("application/octet-stream"), 10).is_ok());
    }

    #[test]
    fn rejects_unknown_types() {
        let err = validate_document("image.png", Some("image/png"), 10).unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert_eq!(err.user_message(), "Please upload a PDF, MD, or TXT file.");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(validate_document("a.txt", None, 0).is_err());
        assert!(validate_text("   \n").is_err());
        assert!(validate_text("content").is_ok());
    }

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(guess_mime("a.Md"), "text/markdown");
        assert_eq!(guess_mime("a.pdf"), "application/pdf");
        assert_eq!(guess_mime("a.bin"), "application/octet-stream");
    }
}
