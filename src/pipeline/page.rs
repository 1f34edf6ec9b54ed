//! Page conversion: one page in, one TIFF file out.
//!
//! This is the unit of work the dispatcher fans out. It is synchronous and
//! CPU-bound, so the dispatcher runs it on the blocking thread pool. A page
//! either ends in a written file or in a [`PageError`]; there is no retry and
//! nothing here touches any other page.

use crate::config::ColorMode;
use crate::error::PageError;
use crate::output::{page_path, PageOutput};
use crate::pipeline::encode::encode_tiff;
use crate::pipeline::rasterize::{PageRasterizer, RenderRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a worker needs to convert any page of one document.
///
/// Built once by the dispatcher and shared behind an `Arc`; never mutated.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// The full document, shared read-only by all workers.
    pub document: Arc<[u8]>,
    pub dpi: u32,
    pub color_mode: ColorMode,
    pub output_dir: PathBuf,
}

/// One page's worth of work. Consumed by exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTask {
    /// Zero-based page index, already checked against the page count.
    pub index: usize,
}

impl PageTask {
    /// 1-indexed page number, as used in file names and messages.
    pub fn page_num(&self) -> usize {
        self.index + 1
    }
}

/// Outcome of one task, joined by the dispatcher.
pub type PageResult = Result<PageOutput, PageError>;

impl ConversionRequest {
    fn render_request(&self) -> RenderRequest {
        RenderRequest {
            dpi: self.dpi,
            color_mode: self.color_mode,
        }
    }

    /// Render, encode and write a single page.
    pub fn convert_page(&self, rasterizer: &dyn PageRasterizer, task: PageTask) -> PageResult {
        let page = task.page_num();

        let image = rasterizer
            .render_page(&self.document, task.index, &self.render_request())
            .map_err(|e| PageError::RenderFailed {
                page,
                detail: e.to_string(),
            })?;

        let tiff = encode_tiff(&image, self.dpi, self.color_mode).map_err(|e| {
            PageError::EncodeFailed {
                page,
                detail: e.to_string(),
            }
        })?;
        drop(image);

        let path = page_path(&self.output_dir, page);
        write_atomic(&path, &tiff).map_err(|e| PageError::WriteFailed {
            page,
            path: path.clone(),
            detail: e.to_string(),
        })?;

        info!("Saved page {} as {}", page, path.display());
        Ok(PageOutput {
            page_num: page,
            path,
        })
    }
}

/// Write to a sibling temp file, then rename over `path`.
///
/// A reader never sees a half-written page, and re-running a conversion
/// replaces the previous file in one step.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tiff.tmp");
    std::fs::write(&tmp_path, bytes)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rasterize::RasterError;
    use image::{DynamicImage, GrayImage, Luma};

    /// Renders every page as a 6x4 image whose pixels hold the page index.
    struct StripeRasterizer {
        pages: usize,
    }

    impl PageRasterizer for StripeRasterizer {
        fn page_count(&self, _document: &[u8]) -> Result<usize, RasterError> {
            Ok(self.pages)
        }

        fn render_page(
            &self,
            _document: &[u8],
            page_index: usize,
            _request: &RenderRequest,
        ) -> Result<DynamicImage, RasterError> {
            if page_index >= self.pages {
                return Err(RasterError::OutOfRange {
                    index: page_index,
                    total: self.pages,
                });
            }
            Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
                6,
                4,
                Luma([page_index as u8]),
            )))
        }
    }

    fn request(output_dir: &Path) -> ConversionRequest {
        ConversionRequest {
            document: Arc::from(&b"%PDF-1.7"[..]),
            dpi: 200,
            color_mode: ColorMode::Grayscale,
            output_dir: output_dir.to_path_buf(),
        }
    }

    #[test]
    fn page_task_numbers_from_one() {
        assert_eq!(PageTask { index: 0 }.page_num(), 1);
        assert_eq!(PageTask { index: 41 }.page_num(), 42);
    }

    #[test]
    fn converts_one_page_to_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());

        let out = req
            .convert_page(&StripeRasterizer { pages: 3 }, PageTask { index: 1 })
            .unwrap();

        assert_eq!(out.page_num, 2);
        assert_eq!(out.path, dir.path().join("page_0002.tiff"));
        let bytes = std::fs::read(&out.path).unwrap();
        assert!(bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*"));
        assert!(!dir.path().join("page_0002.tiff.tmp").exists());
    }

    #[test]
    fn render_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());

        let err = req
            .convert_page(&StripeRasterizer { pages: 3 }, PageTask { index: 7 })
            .unwrap_err();

        assert!(matches!(err, PageError::RenderFailed { page: 8, .. }), "{err:?}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_output_dir_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(&dir.path().join("does/not/exist"));

        let err = req
            .convert_page(&StripeRasterizer { pages: 1 }, PageTask { index: 0 })
            .unwrap_err();

        match err {
            PageError::WriteFailed { page, path, .. } => {
                assert_eq!(page, 1);
                assert!(path.ends_with("page_0001.tiff"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("page_0001.tiff");
        std::fs::write(&target, b"stale").unwrap();

        request(dir.path())
            .convert_page(&StripeRasterizer { pages: 1 }, PageTask { index: 0 })
            .unwrap();

        assert_ne!(std::fs::read(&target).unwrap(), b"stale");
    }
}
