//! # pdf2tiff
//!
//! Render every page of a PDF document to its own TIFF file, in parallel.
//!
//! Each page becomes `page_0001.tiff`, `page_0002.tiff`, … rendered in
//! grayscale at a chosen resolution (300 DPI by default), with that
//! resolution stored in the TIFF XResolution/YResolution tags so downstream
//! OCR and print tools recover the physical page size.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate the path, read the file once into Arc<[u8]>
//!  ├─ 2. Inspect    page count + metadata via pdfium
//!  ├─ 3. Dispatch   one task per page, ≤ concurrency at once (spawn_blocking)
//!  │     ├─ Render  pdfium → grayscale bitmap at dpi/72 scale
//!  │     ├─ Encode  TIFF with X/Y resolution = dpi
//!  │     └─ Write   page_NNNN.tiff (temp file + rename)
//!  └─ 4. Join       all pages finish; any failure → PagesFailed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2tiff::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().dpi(200).build()?;
//!     let report = convert("scan.pdf", "pages/", &config).await?;
//!     for page in &report.pages {
//!         println!("page {} → {}", page.page_num, page.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2tiff` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2tiff = { version = "0.1", default-features = false }
//! ```
//!
//! ## Finding pdfium
//!
//! The pdfium shared library is located at runtime by the `pdfium-locate`
//! workspace crate: an explicit path ([`ConversionConfig::pdfium_library`] or
//! `PDFIUM_LIB_PATH`), then the cache directory, the executable's directory,
//! the working directory, and finally the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ColorMode, ConversionConfig, ConversionConfigBuilder, PageSelection};
pub use convert::{convert, convert_bytes, convert_sync, inspect};
pub use error::{PageError, Pdf2TiffError};
pub use output::{ConversionReport, DocumentMetadata, PageOutput};
pub use pipeline::rasterize::{PageRasterizer, PdfiumRasterizer, RasterError, RenderRequest};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
