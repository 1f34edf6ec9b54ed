//! Error types for the pdf2tiff library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2TiffError`] (fatal): the call as a whole failed (bad argument,
//!   missing input, unreadable document, output directory not creatable, or
//!   one or more pages failed). Returned as `Err(Pdf2TiffError)` from the
//!   top-level `convert*` functions.
//!
//! * [`PageError`]: a single page failed (render glitch, encode or write
//!   error). Each worker returns one as its discriminated result; sibling pages
//!   keep running. The dispatcher gathers every `PageError` into
//!   [`Pdf2TiffError::PagesFailed`] once all pages have finished.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2tiff library.
#[derive(Debug, Error)]
pub enum Pdf2TiffError {
    // ── Argument errors ───────────────────────────────────────────────────
    /// A configuration value was rejected before any I/O took place.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The page count / document metadata could not be read.
    #[error("PDF '{path}' could not be parsed: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The page selection does not match any page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// At least one page failed. Pages that succeeded are still on disk.
    ///
    /// `errors` holds every page failure sorted by page number.
    #[error(
        "{failed}/{total} pages failed to convert ({succeeded} written)\nFirst error: {}",
        first_error(.errors)
    )]
    PagesFailed {
        failed: usize,
        succeeded: usize,
        total: usize,
        errors: Vec<PageError>,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n\
  • Place the library in ~/.cache/pdf2tiff/pdfium/ or next to the executable.\n\
  • Install pdfium on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2TiffError {
    /// The lowest-numbered page failure, when this is a `PagesFailed` error.
    pub fn first_page_error(&self) -> Option<&PageError> {
        match self {
            Pdf2TiffError::PagesFailed { errors, .. } => errors.first(),
            _ => None,
        }
    }
}

fn first_error(errors: &[PageError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// A failure confined to a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The rasteriser could not produce an image for this page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered image could not be encoded as TIFF.
    #[error("Page {page}: TIFF encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The encoded image could not be written to disk.
    #[error("Page {page}: failed to write '{path}': {detail}")]
    WriteFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// The worker running this page panicked.
    #[error("Page {page}: worker panicked: {detail}")]
    TaskPanicked { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. }
            | PageError::WriteFailed { page, .. }
            | PageError::TaskPanicked { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_failed_display_names_first_error() {
        let e = Pdf2TiffError::PagesFailed {
            failed: 2,
            succeeded: 3,
            total: 5,
            errors: vec![
                PageError::RenderFailed {
                    page: 2,
                    detail: "bad xobject".into(),
                },
                PageError::RenderFailed {
                    page: 4,
                    detail: "bad font".into(),
                },
            ],
        };
        let msg = e.to_string();
        assert!(msg.contains("2/5"), "got: {msg}");
        assert!(msg.contains("3 written"), "got: {msg}");
        assert!(msg.contains("Page 2"), "got: {msg}");
        assert!(!msg.contains("Page 4"), "got: {msg}");
        assert_eq!(e.first_page_error().map(PageError::page), Some(2));
    }

    #[test]
    fn first_page_error_is_none_for_other_variants() {
        let e = Pdf2TiffError::InvalidArgument("resolution".into());
        assert!(e.first_page_error().is_none());
    }

    #[test]
    fn invalid_argument_display() {
        let e = Pdf2TiffError::InvalidArgument("Resolution must be a positive integer".into());
        assert!(e.to_string().starts_with("Invalid argument"));
    }

    #[test]
    fn page_error_reports_page_number() {
        let e = PageError::WriteFailed {
            page: 7,
            path: PathBuf::from("/out/page_0007.tiff"),
            detail: "disk full".into(),
        };
        assert_eq!(e.page(), 7);
        assert!(e.to_string().contains("page_0007.tiff"));
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::TaskPanicked {
            page: 1,
            detail: "boom".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("TaskPanicked"));
        let back: PageError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
