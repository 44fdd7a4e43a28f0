//! Upload validation and MIME resolution.

use coursevault_store::ContentKind;

use crate::error::{Result, VaultError};

const PDF_EXTENSIONS: &[&str] = &["pdf"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi"];

/// Extensions (lowercase, without the dot) accepted for `kind`.
pub fn allowed_extensions(kind: ContentKind) -> &'static [&'static str] {
    match kind {
        ContentKind::Pdf => PDF_EXTENSIONS,
        ContentKind::Video => VIDEO_EXTENSIONS,
    }
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check an upload before anything is encrypted or written.
pub fn validate_upload(kind: ContentKind, filename: &str, len: u64, max_bytes: u64) -> Result<()> {
    if filename.trim().is_empty() || len == 0 {
        return Err(VaultError::Validation("no file uploaded".into()));
    }

    let allowed = allowed_extensions(kind);
    match extension(filename) {
        Some(ext) if allowed.contains(&ext.as_str()) => {}
        _ => {
            let list: Vec<String> = allowed.iter().map(|e| format!(".{}", e)).collect();
            return Err(VaultError::Validation(format!(
                "file type not allowed; upload one of: {}",
                list.join(", ")
            )));
        }
    }

    if len > max_bytes {
        return Err(VaultError::Validation(format!(
            "file too large: {} bytes exceeds the {} MiB limit",
            len,
            max_bytes / (1024 * 1024)
        )));
    }

    Ok(())
}

/// MIME type for serving `filename`, falling back on the content kind.
pub fn mime_for(filename: &str, kind: ContentKind) -> &'static str {
    match extension(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => kind.fallback_mime(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MAX: u64 = 50 * 1024 * 1024;

    proptest! {
        #[test]
        fn test_oversized_always_rejected(extra in 1u64..=u64::MAX - MAX) {
            prop_assert!(validate_upload(ContentKind::Video, "a.mp4", MAX + extra, MAX).is_err());
        }

        #[test]
        fn test_mime_is_total(name in any::<String>()) {
            let mime = mime_for(&name, ContentKind::Pdf);
            prop_assert!(mime.contains('/'));
        }
    }

    #[test]
    fn test_accepts_matching_extension() {
        validate_upload(ContentKind::Pdf, "Week1.PDF", 10, MAX).unwrap();
        validate_upload(ContentKind::Video, "intro.mp4", 10, MAX).unwrap();
        validate_upload(ContentKind::Video, "lab.webm", MAX, MAX).unwrap();
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let err = validate_upload(ContentKind::Pdf, "intro.mp4", 10, MAX).unwrap_err();
        assert!(err.to_string().contains(".pdf"));

        assert!(validate_upload(ContentKind::Video, "notes.pdf", 10, MAX).is_err());
        assert!(validate_upload(ContentKind::Pdf, "pdf", 10, MAX).is_err());
        assert!(validate_upload(ContentKind::Pdf, ".pdf", 10, MAX).is_err());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(validate_upload(ContentKind::Pdf, "a.pdf", 0, MAX).is_err());
        assert!(validate_upload(ContentKind::Pdf, "", 10, MAX).is_err());

        let err = validate_upload(ContentKind::Pdf, "a.pdf", MAX + 1, MAX).unwrap_err();
        assert!(err.to_string().contains("50 MiB"));
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a.pdf", ContentKind::Pdf), "application/pdf");
        assert_eq!(mime_for("a.MOV", ContentKind::Video), "video/quicktime");
        assert_eq!(mime_for("a", ContentKind::Video), "video/mp4");
        assert_eq!(mime_for("a.bin", ContentKind::Pdf), "application/pdf");
    }
}
