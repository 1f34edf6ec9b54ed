//! Configuration types for PDF-to-TIFF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The worker-pool ceiling lives here too
//! rather than in a hidden constant, so tests can run the dispatcher with a
//! pool of two.

use crate::error::Pdf2TiffError;
use crate::pipeline::rasterize::PageRasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default rendering resolution in dots per inch.
pub const DEFAULT_DPI: u32 = 300;

/// Default ceiling on simultaneously running page tasks.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Configuration for a PDF-to-TIFF conversion.
///
/// # Example
/// ```rust
/// use pdf2tiff::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering resolution, also written as the TIFF X/Y resolution. Default: 300.
    pub dpi: u32,

    /// Maximum number of page tasks executing at once. Default: 20.
    pub concurrency: usize,

    /// Colour mode of the written images. Default: grayscale.
    pub color_mode: ColorMode,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Explicit pdfium library file. If None, `pdfium-locate` searches for one.
    pub pdfium_library: Option<PathBuf>,

    /// Pre-constructed rasteriser. Takes precedence over `pdfium_library`.
    pub rasterizer: Option<Arc<dyn PageRasterizer>>,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            concurrency: DEFAULT_CONCURRENCY,
            color_mode: ColorMode::default(),
            pages: PageSelection::default(),
            pdfium_library: None,
            rasterizer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("concurrency", &self.concurrency)
            .field("color_mode", &self.color_mode)
            .field("pages", &self.pages)
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "rasterizer",
                &self.rasterizer.as_ref().map(|_| "<dyn PageRasterizer>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            dpi: i64::from(DEFAULT_DPI),
            concurrency: DEFAULT_CONCURRENCY,
            config: Self::default(),
        }
    }

    /// Check the invariants the builder enforces, for configs assembled by hand.
    pub fn validate(&self) -> Result<(), Pdf2TiffError> {
        if self.dpi == 0 {
            return Err(Pdf2TiffError::InvalidArgument(
                "Resolution must be a positive integer, got 0".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(Pdf2TiffError::InvalidArgument(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
///
/// Numeric inputs are kept as given and checked in [`build`](Self::build), so
/// a negative resolution from the command line is reported instead of clamped.
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    dpi: i64,
    concurrency: usize,
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: impl Into<i64>) -> Self {
        self.dpi = dpi.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.config.color_mode = mode;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2TiffError> {
        if self.dpi <= 0 {
            return Err(Pdf2TiffError::InvalidArgument(format!(
                "Resolution must be a positive integer, got {}",
                self.dpi
            )));
        }
        let dpi = u32::try_from(self.dpi).map_err(|_| {
            Pdf2TiffError::InvalidArgument(format!("Resolution {} is too large", self.dpi))
        })?;
        if self.concurrency == 0 {
            return Err(Pdf2TiffError::InvalidArgument(
                "Concurrency must be ≥ 1".into(),
            ));
        }

        let mut config = self.config;
        config.dpi = dpi;
        config.concurrency = self.concurrency;
        Ok(config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Pixel format of the written TIFF files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// 8-bit single channel. (default)
    #[default]
    Grayscale,
    /// 8-bit RGB.
    Rgb,
}

impl FromStr for ColorMode {
    type Err = Pdf2TiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gray" | "grey" | "grayscale" | "greyscale" => Ok(ColorMode::Grayscale),
            "rgb" | "color" | "colour" => Ok(ColorMode::Rgb),
            other => Err(Pdf2TiffError::InvalidArgument(format!(
                "Unknown colour mode '{other}' (expected gray or rgb)"
            ))),
        }
    }
}

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page
    /// numbers, dropping anything outside `[1, total_pages]`.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// The lowest explicitly requested 1-indexed page past `total_pages`, if
    /// any. For a range only the end can be past the document.
    pub fn first_out_of_range(&self, total_pages: usize) -> Option<usize> {
        match self {
            PageSelection::All => None,
            PageSelection::Single(p) => (*p > total_pages).then_some(*p),
            PageSelection::Range(_, end) => (*end > total_pages).then_some(*end),
            PageSelection::Set(pages) => pages.iter().copied().filter(|&p| p > total_pages).min(),
        }
    }
}

/// Parses `all`, `5`, `3-15` or `1,3,5,7`.
impl FromStr for PageSelection {
    type Err = Pdf2TiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let invalid = |msg: String| Pdf2TiffError::InvalidArgument(msg);
        let parse_page = |p: &str| -> Result<usize, Pdf2TiffError> {
            let n: usize = p
                .trim()
                .parse()
                .map_err(|_| invalid(format!("Invalid page number: '{}'", p.trim())))?;
            if n < 1 {
                return Err(invalid(format!(
                    "Pages are 1-indexed, minimum is 1 (got {n})"
                )));
            }
            Ok(n)
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let start = parse_page(start)?;
            let end = parse_page(end)?;
            if start > end {
                return Err(invalid(format!(
                    "Invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s
                .split(',')
                .map(parse_page)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        Ok(PageSelection::Single(parse_page(s.as_str())?))
    }
}
