//! Input resolution: validate the source document and derive the output path.
//!
//! The service needs to be told the media type of the upload up front, and
//! the PDF lands next to the source with its extension replaced. Both are
//! decided here, before any network request, so a typo in the path fails
//! fast instead of after authentication.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension given to the converted file.
pub const OUTPUT_EXTENSION: &str = "pdf";

/// Source formats accepted by the create-PDF operation.
const MEDIA_TYPES: &[(&str, &str)] = &[
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("doc", "application/msword"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("xls", "application/vnd.ms-excel"),
    ("rtf", "application/rtf"),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("bmp", "image/bmp"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];

/// A local document ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub media_type: String,
    pub output_path: PathBuf,
}

/// Media type for a path's extension (case-insensitive), if it is a supported format.
pub fn media_type_for(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mt)| *mt)
}

/// The input path with its extension replaced by `.pdf`.
///
/// `report.docx` → `report.pdf`; `notes` → `notes.pdf`; `archive.tar.docx` →
/// `archive.tar.pdf`.
pub fn derive_output_path(input: impl AsRef<Path>) -> PathBuf {
    input.as_ref().with_extension(OUTPUT_EXTENSION)
}

/// Validate the input file and settle media type and output path.
pub async fn resolve_input(
    input: &Path,
    config: &ConversionConfig,
) -> Result<SourceDocument, ConvertError> {
    let path = input.to_path_buf();

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(ConvertError::FileNotFound { path }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied { path });
        }
        Err(_) => return Err(ConvertError::FileNotFound { path }),
    }

    // Opening checks read permission, which metadata() does not.
    if let Err(e) = tokio::fs::File::open(&path).await {
        return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
            ConvertError::PermissionDenied { path }
        } else {
            ConvertError::ReadFailed { path, source: e }
        });
    }

    let media_type = match config.media_type {
        Some(ref mt) => mt.clone(),
        None => media_type_for(&path)
            .ok_or_else(|| ConvertError::UnsupportedInput { path: path.clone() })?
            .to_string(),
    };

    let output_path = config
        .output_path
        .clone()
        .unwrap_or_else(|| derive_output_path(&path));

    if output_path == path {
        return Err(ConvertError::InvalidConfig(format!(
            "output path '{}' would overwrite the input",
            output_path.display()
        )));
    }

    debug!(
        "Resolved input {} ({}) → {}",
        path.display(),
        media_type,
        output_path.display()
    );

    Ok(SourceDocument {
        path,
        media_type,
        output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConversionConfig {
        ConversionConfig::builder()
            .credentials("id", "secret")
            .build()
            .unwrap()
    }

    #[test]
    fn derive_output_path_replaces_extension() {
        assert_eq!(derive_output_path("report.docx"), PathBuf::from("report.pdf"));
        assert_eq!(
            derive_output_path("/tmp/in/Q3 Summary.pptx"),
            PathBuf::from("/tmp/in/Q3 Summary.pdf")
        );
        assert_eq!(derive_output_path("notes"), PathBuf::from("notes.pdf"));
        assert_eq!(
            derive_output_path("archive.tar.docx"),
            PathBuf::from("archive.tar.pdf")
        );
    }

    #[test]
    fn media_type_lookup_is_case_insensitive() {
        assert_eq!(
            media_type_for("REPORT.DOCX"),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
        assert_eq!(media_type_for("scan.JPG"), Some("image/jpeg"));
        assert_eq!(media_type_for("page.htm"), media_type_for("page.html"));
        assert_eq!(media_type_for("data.parquet"), None);
        assert_eq!(media_type_for("README"), None);
    }

    #[tokio::test]
    async fn resolve_missing_file() {
        let err = resolve_input(Path::new("/definitely/not/here.docx"), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path(), &config()).await.unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_unknown_extension_without_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"xx").unwrap();
        let err = resolve_input(&path, &config()).await.unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedInput { .. }));
    }

    #[tokio::test]
    async fn resolve_uses_override_and_default_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"xx").unwrap();
        let config = ConversionConfig::builder()
            .credentials("id", "secret")
            .media_type("application/msword")
            .build()
            .unwrap();
        let doc = resolve_input(&path, &config).await.unwrap();
        assert_eq!(doc.media_type, "application/msword");
        assert_eq!(doc.output_path, dir.path().join("data.pdf"));
    }

    #[tokio::test]
    async fn resolve_rejects_output_equal_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("already.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let config = ConversionConfig::builder()
            .credentials("id", "secret")
            .media_type("application/pdf")
            .build()
            .unwrap();
        let err = resolve_input(&path, &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }
}
