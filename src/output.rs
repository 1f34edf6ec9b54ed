//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output file name for a 1-indexed page: `page_0001.tiff`.
///
/// Page numbers above 9999 widen to as many digits as they need.
pub fn page_file_name(page_num: usize) -> String {
    format!("page_{:04}.tiff", page_num)
}

/// Output path for a 1-indexed page inside `output_dir`.
pub fn page_path(output_dir: &Path, page_num: usize) -> PathBuf {
    output_dir.join(page_file_name(page_num))
}

/// One successfully written page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutput {
    /// 1-indexed page number.
    pub page_num: usize,
    /// The TIFF file that was written.
    pub path: PathBuf,
}

/// Summary of a fully successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Page count read from the document.
    pub total_pages: usize,
    /// Written pages, sorted by page number.
    pub pages: Vec<PageOutput>,
    /// Resolution used for rendering and embedded in each file.
    pub dpi: u32,
    /// Directory the pages were written to.
    pub output_dir: PathBuf,
    /// Wall-clock time from validation to the last page joining.
    pub duration_ms: u64,
}

/// Document-level information, read without rendering any page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    /// Empty when the rasteriser does not report it.
    pub pdf_version: String,
}
