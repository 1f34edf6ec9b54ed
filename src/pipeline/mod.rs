//! Pipeline stages for PDF-to-TIFF conversion.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ rasterize ──▶ encode ──▶ page (write)
//! (path)     (pdfium)      (TIFF)     (page_NNNN.tiff)
//! ```
//!
//! 1. [`input`]    : validate the path and read the document into an `Arc<[u8]>`
//! 2. [`rasterize`]: the [`rasterize::PageRasterizer`] seam and its pdfium
//!    implementation
//! 3. [`encode`]   : TIFF encoding with X/Y resolution tags
//! 4. [`page`]     : one page end to end: render, encode, atomic write

pub mod encode;
pub mod input;
pub mod page;
pub mod rasterize;
