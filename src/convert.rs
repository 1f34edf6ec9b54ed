//! Conversion entry points and the page dispatcher.
//!
//! Every entry point funnels into `dispatch`: one document buffer, one
//! rasteriser, one task per selected page, a bounded pool, and a single join.
//!
//! ## Why `buffer_unordered` over `spawn_blocking`?
//!
//! Rendering and TIFF encoding are CPU-bound and pdfium is a synchronous C
//! library, so each page runs on tokio's blocking pool. `buffer_unordered`
//! keeps at most `config.concurrency` of those in flight, submits pages in
//! ascending order and yields them in completion order. The dispatcher itself
//! only ever awaits the join.

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2TiffError};
use crate::output::{ConversionReport, DocumentMetadata};
use crate::pipeline::input;
use crate::pipeline::page::{ConversionRequest, PageResult, PageTask};
use crate::pipeline::rasterize::{PageRasterizer, PdfiumRasterizer};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Label used in errors for documents that never had a path.
const IN_MEMORY_SOURCE: &str = "<memory>";

/// Convert every selected page of the PDF at `input` into
/// `output_dir/page_NNNN.tiff`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionReport)` only when every selected page was written.
///
/// # Errors
/// - Invalid configuration (resolution ≤ 0, zero concurrency), before any I/O
/// - File not found / permission denied / not a PDF
/// - Unreadable page tree ([`Pdf2TiffError::CorruptPdf`])
/// - Output directory cannot be created
/// - One or more pages failed ([`Pdf2TiffError::PagesFailed`]); pages that
///   succeeded remain on disk
pub async fn convert(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, Pdf2TiffError> {
    let start = Instant::now();
    config.validate()?;

    let input = input.as_ref();
    info!("Starting conversion: {}", input.display());
    let document = input::load_document(input).await?;

    dispatch(document, input, output_dir.as_ref(), config, start).await
}

/// Convert a PDF already held in memory.
///
/// The bytes are moved into the shared buffer without copying when given as
/// a `Vec<u8>` or `Arc<[u8]>`.
///
/// # Example
/// ```rust,no_run
/// use pdf2tiff::{convert_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("scan.pdf")?;
/// let report = convert_bytes(bytes, "out/", &ConversionConfig::default()).await?;
/// println!("{} pages written", report.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn convert_bytes(
    bytes: impl Into<Arc<[u8]>>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, Pdf2TiffError> {
    let start = Instant::now();
    config.validate()?;

    let source = Path::new(IN_MEMORY_SOURCE);
    let document: Arc<[u8]> = bytes.into();
    input::check_magic(&document, source)?;

    dispatch(document, source, output_dir.as_ref(), config, start).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, Pdf2TiffError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TiffError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, output_dir, config))
}

/// Read document metadata without rendering anything.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, Pdf2TiffError> {
    let input = input.as_ref();
    let document = input::load_document(input).await?;
    let rasterizer = resolve_rasterizer(config).await?;
    read_metadata(&rasterizer, &document, input).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn dispatch(
    document: Arc<[u8]>,
    source: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
    start: Instant,
) -> Result<ConversionReport, Pdf2TiffError> {
    let rasterizer = resolve_rasterizer(config).await?;

    let metadata = read_metadata(&rasterizer, &document, source).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    if let Some(page) = config.pages.first_out_of_range(total_pages) {
        return Err(Pdf2TiffError::PageOutOfRange {
            page,
            total: total_pages,
        });
    }
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() && total_pages > 0 {
        return Err(Pdf2TiffError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for conversion", page_indices.len());

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| Pdf2TiffError::OutputDirFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let request = Arc::new(ConversionRequest {
        document,
        dpi: config.dpi,
        color_mode: config.color_mode,
        output_dir: output_dir.to_path_buf(),
    });

    let selected = page_indices.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(selected);
    }

    let results = run_pages(&request, &rasterizer, &page_indices, config).await;

    let mut pages = Vec::with_capacity(selected);
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(page) => pages.push(page),
            Err(e) => errors.push(e),
        }
    }
    pages.sort_by_key(|p| p.page_num);
    errors.sort_by_key(PageError::page);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(selected, pages.len());
    }

    if !errors.is_empty() {
        warn!(
            "{} of {} pages failed; {} written to {}",
            errors.len(),
            selected,
            pages.len(),
            output_dir.display()
        );
        return Err(Pdf2TiffError::PagesFailed {
            failed: errors.len(),
            succeeded: pages.len(),
            total: selected,
            errors,
        });
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} pages in {}ms",
        pages.len(),
        duration_ms
    );

    Ok(ConversionReport {
        total_pages,
        pages,
        dpi: config.dpi,
        output_dir: output_dir.to_path_buf(),
        duration_ms,
    })
}

/// Fan out one blocking task per page, at most `config.concurrency` at once,
/// and collect every outcome.
async fn run_pages(
    request: &Arc<ConversionRequest>,
    rasterizer: &Arc<dyn PageRasterizer>,
    page_indices: &[usize],
    config: &ConversionConfig,
) -> Vec<PageResult> {
    let total = page_indices.len();

    stream::iter(page_indices.iter().map(|&index| {
        let task = PageTask { index };
        let request = Arc::clone(request);
        let rasterizer = Arc::clone(rasterizer);
        let callback = config.progress_callback.clone();

        async move {
            let page_num = task.page_num();
            let joined = tokio::task::spawn_blocking(move || {
                if let Some(ref cb) = callback {
                    cb.on_page_start(page_num, total);
                }
                let result = request.convert_page(rasterizer.as_ref(), task);
                if let Some(ref cb) = callback {
                    match &result {
                        Ok(out) => cb.on_page_complete(page_num, total, &out.path),
                        Err(e) => cb.on_page_error(page_num, total, &e.to_string()),
                    }
                }
                result
            })
            .await;

            match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Page {} task did not complete: {}", page_num, e);
                    Err(PageError::TaskPanicked {
                        page: page_num,
                        detail: e.to_string(),
                    })
                }
            }
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await
}

async fn resolve_rasterizer(
    config: &ConversionConfig,
) -> Result<Arc<dyn PageRasterizer>, Pdf2TiffError> {
    if let Some(ref rasterizer) = config.rasterizer {
        return Ok(Arc::clone(rasterizer));
    }

    let explicit = config.pdfium_library.clone();
    let rasterizer = tokio::task::spawn_blocking(move || PdfiumRasterizer::new(explicit.as_deref()))
        .await
        .map_err(|e| Pdf2TiffError::Internal(format!("pdfium binding task failed: {}", e)))??;
    Ok(Arc::new(rasterizer))
}

async fn read_metadata(
    rasterizer: &Arc<dyn PageRasterizer>,
    document: &Arc<[u8]>,
    source: &Path,
) -> Result<DocumentMetadata, Pdf2TiffError> {
    let rasterizer = Arc::clone(rasterizer);
    let document = Arc::clone(document);

    tokio::task::spawn_blocking(move || rasterizer.metadata(&document))
        .await
        .map_err(|e| Pdf2TiffError::Internal(format!("metadata task failed: {}", e)))?
        .map_err(|e| Pdf2TiffError::CorruptPdf {
            path: source.to_path_buf(),
            detail: e.to_string(),
        })
}
