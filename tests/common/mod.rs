//! Shared fixtures for integration tests.

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma};
use pdf2tiff::{PageRasterizer, RasterError, RenderRequest};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Route dispatcher logs to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Smallest byte string that passes the `%PDF` check.
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% fake document for tests\n%%EOF\n";

/// In-memory rasteriser with scriptable page count, failures and latency.
///
/// Tracks how many renders run at once so tests can check the pool bound.
#[derive(Default)]
pub struct FakeRasterizer {
    pub pages: usize,
    pub failing: HashSet<usize>,
    pub panicking: HashSet<usize>,
    pub corrupt: bool,
    pub delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    rendered: Mutex<Vec<usize>>,
}

impl FakeRasterizer {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Make these 1-indexed pages fail to render.
    pub fn failing_pages(mut self, pages: &[usize]) -> Self {
        self.failing = pages.iter().map(|p| p - 1).collect();
        self
    }

    /// Make these 1-indexed pages panic inside the worker.
    pub fn panicking_pages(mut self, pages: &[usize]) -> Self {
        self.panicking = pages.iter().map(|p| p - 1).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Metadata reads fail, as for a truncated page tree.
    pub fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Zero-based indices that reached `render_page`, in call order.
    pub fn rendered(&self) -> Vec<usize> {
        self.rendered.lock().unwrap().clone()
    }
}

impl PageRasterizer for FakeRasterizer {
    fn page_count(&self, _document: &[u8]) -> Result<usize, RasterError> {
        if self.corrupt {
            return Err(RasterError::Load("xref table is damaged".into()));
        }
        Ok(self.pages)
    }

    fn render_page(
        &self,
        _document: &[u8],
        page_index: usize,
        request: &RenderRequest,
    ) -> Result<DynamicImage, RasterError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.rendered.lock().unwrap().push(page_index);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.contains(&page_index) {
            panic!("renderer blew up on page {}", page_index + 1);
        }
        if self.failing.contains(&page_index) || page_index >= self.pages {
            return Err(RasterError::Render(format!(
                "cannot draw page {}",
                page_index + 1
            )));
        }

        // US Letter at the requested resolution, scaled down to keep tests fast.
        let w = (request.dpi * 85 / 1000).max(1);
        let h = (request.dpi * 110 / 1000).max(1);
        Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            w,
            h,
            Luma([(page_index % 256) as u8]),
        )))
    }
}

/// Write [`FAKE_PDF`] into `dir` and return its path.
pub fn write_fake_pdf(dir: &Path) -> PathBuf {
    let path = dir.join("input.pdf");
    std::fs::write(&path, FAKE_PDF).unwrap();
    path
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
