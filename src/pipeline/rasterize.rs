//! PDF rasterisation: the opaque rendering engine behind a trait.
//!
//! The dispatcher only needs two things from a rendering engine: how many
//! pages a document has, and one page decoded at a given resolution.
//! [`PageRasterizer`] captures exactly that, so the dispatcher can be driven
//! by pdfium in production and by an in-memory fake in tests.
//!
//! ## Why a process-wide lock?
//!
//! pdfium keeps global library state; `FPDF_InitLibrary` and
//! `FPDF_DestroyLibrary` are not reentrant and document handles are not safe
//! to touch from two threads at once. [`PdfiumRasterizer`] therefore binds,
//! loads and renders under one process-wide lock, and hands back an owned image.
//! Everything after that (grayscale conversion, TIFF encoding, the file write)
//! runs in parallel on the worker pool.

use crate::config::ColorMode;
use crate::error::Pdf2TiffError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_locate::LibrarySource;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

/// What the page converter asks the rasteriser for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub dpi: u32,
    pub color_mode: ColorMode,
}

impl RenderRequest {
    /// Scale factor from PDF points to device pixels.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / POINTS_PER_INCH
    }
}

/// Failures reported by a rasteriser.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The document could not be opened or its page tree read.
    #[error("failed to load document: {0}")]
    Load(String),

    /// The requested page index does not exist.
    #[error("page index {index} out of range (document has {total} pages)")]
    OutOfRange { index: usize, total: usize },

    /// The page exists but could not be drawn.
    #[error("{0}")]
    Render(String),
}

/// An engine that can count and rasterise the pages of a document.
///
/// Implementations receive the full document bytes on every call and must not
/// retain them. Calls arrive concurrently from the worker pool.
pub trait PageRasterizer: Send + Sync {
    /// Number of renderable pages in `document`.
    fn page_count(&self, document: &[u8]) -> Result<usize, RasterError>;

    /// Render the zero-based `page_index` of `document`.
    fn render_page(
        &self,
        document: &[u8],
        page_index: usize,
        request: &RenderRequest,
    ) -> Result<DynamicImage, RasterError>;

    /// Document metadata. The default reports only the page count.
    fn metadata(&self, document: &[u8]) -> Result<DocumentMetadata, RasterError> {
        Ok(DocumentMetadata {
            page_count: self.page_count(document)?,
            ..Default::default()
        })
    }
}

/// [`PageRasterizer`] backed by the pdfium C++ library.
///
/// # Cost per call
///
/// Every [`page_count`](PageRasterizer::page_count),
/// [`render_page`](PageRasterizer::render_page) and
/// [`metadata`](PageRasterizer::metadata) call binds pdfium and parses the
/// document again, all under the process-wide lock. Dropping the binding
/// tears down pdfium's global state, so no instance outlives the lock. For an
/// N-page conversion that is N + 1 binds and parses, serialised. Parsing a
/// document from memory is cheap next to rendering a page at print
/// resolution, but a document whose cross-reference table has to be rebuilt
/// pays that rebuild on every page.
///
/// Only the library lookup is done once, in [`new`](Self::new), which also
/// binds a first time so a missing or broken library fails up front rather
/// than on every page.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    source: LibrarySource,
}

impl PdfiumRasterizer {
    /// Locate pdfium (explicit path first, then the `pdfium-locate` search
    /// order) and check that it binds.
    pub fn new(explicit: Option<&Path>) -> Result<Self, Pdf2TiffError> {
        let source = pdfium_locate::resolve_library(explicit)
            .map_err(|e| Pdf2TiffError::PdfiumBindingFailed(e.to_string()))?;

        {
            let _guard = lock_pdfium();
            pdfium_locate::bind_pdfium(&source)
                .map_err(|e| Pdf2TiffError::PdfiumBindingFailed(e.to_string()))?;
        }

        info!("Using pdfium from {}", source);
        Ok(Self { source })
    }

    /// Run `f` against a freshly bound pdfium instance while holding the
    /// process-wide pdfium lock. The instance is dropped before the lock is
    /// released.
    fn with_pdfium<R>(
        &self,
        f: impl FnOnce(&Pdfium) -> Result<R, RasterError>,
    ) -> Result<R, RasterError> {
        let _guard = lock_pdfium();
        let pdfium = pdfium_locate::bind_pdfium(&self.source)
            .map_err(|e| RasterError::Load(e.to_string()))?;
        f(&pdfium)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn page_count(&self, document: &[u8]) -> Result<usize, RasterError> {
        self.with_pdfium(|pdfium| {
            let doc = load_document(pdfium, document)?;
            Ok(doc.pages().len() as usize)
        })
    }

    fn render_page(
        &self,
        document: &[u8],
        page_index: usize,
        request: &RenderRequest,
    ) -> Result<DynamicImage, RasterError> {
        self.with_pdfium(|pdfium| {
            let doc = load_document(pdfium, document)?;
            let pages = doc.pages();
            let total = pages.len() as usize;

            let index = u16::try_from(page_index)
                .ok()
                .filter(|&i| usize::from(i) < total)
                .ok_or(RasterError::OutOfRange {
                    index: page_index,
                    total,
                })?;

            let page = pages
                .get(index)
                .map_err(|e| RasterError::Render(format!("{:?}", e)))?;

            let render_config = PdfRenderConfig::new()
                .scale_page_by_factor(request.scale())
                .use_grayscale_rendering(request.color_mode == ColorMode::Grayscale)
                .render_form_data(true)
                .use_print_quality(true);

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| RasterError::Render(format!("{:?}", e)))?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} at {} DPI → {}x{} px",
                page_index + 1,
                request.dpi,
                image.width(),
                image.height()
            );
            Ok(image)
        })
    }

    fn metadata(&self, document: &[u8]) -> Result<DocumentMetadata, RasterError> {
        self.with_pdfium(|pdfium| {
            let doc = load_document(pdfium, document)?;
            let metadata = doc.metadata();

            let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
                metadata.get(tag).and_then(|t| {
                    let v = t.value().to_string();
                    if v.is_empty() {
                        None
                    } else {
                        Some(v)
                    }
                })
            };

            Ok(DocumentMetadata {
                title: get_meta(PdfDocumentMetadataTagType::Title),
                author: get_meta(PdfDocumentMetadataTagType::Author),
                subject: get_meta(PdfDocumentMetadataTagType::Subject),
                creator: get_meta(PdfDocumentMetadataTagType::Creator),
                producer: get_meta(PdfDocumentMetadataTagType::Producer),
                creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
                modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
                page_count: doc.pages().len() as usize,
                pdf_version: format!("{:?}", doc.version()),
            })
        })
    }
}

fn lock_pdfium() -> std::sync::MutexGuard<'static, ()> {
    // A panic while rendering leaves pdfium usable; the guard protects no data.
    PDFIUM_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn load_document<'a>(pdfium: &'a Pdfium, bytes: &'a [u8]) -> Result<PdfDocument<'a>, RasterError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| RasterError::Load(format!("{:?}", e)))
}
