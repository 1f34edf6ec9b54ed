//! Input loading: validate the document path and read it into memory once.
//!
//! The bytes come back as an `Arc<[u8]>`. Every page task holds a clone of
//! the `Arc`, never of the buffer, so a 200 MB scan is resident exactly once
//! however many workers are rendering from it.

use crate::error::Pdf2TiffError;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Every PDF starts with this (ISO 32000-1 §7.5.2).
const PDF_MAGIC: &[u8] = b"%PDF";
/// How far into the buffer the `%PDF` header may start.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Read the document at `path` into a shared, read-only buffer.
///
/// Existence is checked before anything is read, so a missing file is always
/// [`Pdf2TiffError::FileNotFound`].
pub async fn load_document(path: &Path) -> Result<Arc<[u8]>, Pdf2TiffError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(Pdf2TiffError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Pdf2TiffError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(Pdf2TiffError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(Pdf2TiffError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => Pdf2TiffError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2TiffError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    check_magic(&bytes, path)?;

    debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(Arc::from(bytes))
}

/// Reject buffers that cannot be a PDF before handing them to the rasteriser.
///
/// The `%PDF` header may be preceded by junk (a stray line break, a mail
/// header) as long as it starts within the first 1024 bytes.
pub fn check_magic(bytes: &[u8], path: &Path) -> Result<(), Pdf2TiffError> {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Ok(());
    }
    Err(Pdf2TiffError::NotAPdf {
        path: path.to_path_buf(),
        magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = load_document(Path::new("/definitely/not/a/real/file.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2TiffError::FileNotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path()).await.unwrap_err();
        assert!(matches!(err, Pdf2TiffError::FileNotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let err = load_document(&path).await.unwrap_err();
        match err {
            Pdf2TiffError::NotAPdf { magic, .. } => assert_eq!(magic, b"hell"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();

        let err = load_document(&path).await.unwrap_err();
        assert!(matches!(err, Pdf2TiffError::NotAPdf { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn pdf_bytes_are_returned_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        let content = b"%PDF-1.7\n%fake body\n%%EOF\n";
        std::fs::write(&path, content).unwrap();

        let bytes = load_document(&path).await.unwrap();
        assert_eq!(&bytes[..], &content[..]);
    }

    #[test]
    fn header_after_leading_junk_is_accepted() {
        let mut bytes = b"\r\n".to_vec();
        bytes.extend_from_slice(b"%PDF-1.4\n%%EOF\n");
        assert!(check_magic(&bytes, Path::new("doc.pdf")).is_ok());
    }

    #[test]
    fn header_beyond_search_window_is_rejected() {
        let mut bytes = vec![b' '; HEADER_SEARCH_WINDOW];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        let err = check_magic(&bytes, Path::new("doc.pdf")).unwrap_err();
        match err {
            Pdf2TiffError::NotAPdf { magic, .. } => assert_eq!(magic, b"    "),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn header_ending_at_window_edge_is_accepted() {
        let mut bytes = vec![b' '; HEADER_SEARCH_WINDOW - PDF_MAGIC.len()];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        assert!(check_magic(&bytes, Path::new("doc.pdf")).is_ok());
    }
}
