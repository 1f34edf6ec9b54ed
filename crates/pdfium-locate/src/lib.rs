//! # pdfium-locate
//!
//! Find a [PDFium](https://pdfium.googlesource.com/pdfium/) shared library on
//! disk and bind `pdfium-render` to it.
//!
//! ## Lookup order
//!
//! [`resolve_library`] checks, first match wins:
//!
//! 1. An explicit path passed by the caller (must exist).
//! 2. `PDFIUM_LIB_PATH`: path to an existing library file.
//! 3. The per-user cache directory (see [`pdfium_cache_dir`]).
//! 4. The directory containing the running executable.
//! 5. The current working directory.
//! 6. The system library search path (`LD_LIBRARY_PATH`, `DYLD_LIBRARY_PATH`,
//!    `PATH`, …), resolved by the dynamic loader at bind time.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfium_locate::{bind_pdfium, resolve_library};
//!
//! let source = resolve_library(None).expect("no pdfium library");
//! let pdfium = bind_pdfium(&source).expect("bind failed");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable naming an explicit pdfium library file.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache directory root.
pub const CACHE_DIR_ENV: &str = "PDFIUM_CACHE_DIR";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-locate operations.
#[derive(Error, Debug)]
pub enum PdfiumLocateError {
    /// A library path was requested explicitly but nothing exists there.
    #[error("PDFium library not found at '{path}'")]
    NotFound { path: PathBuf },

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from {source_desc}: {reason}")]
    Bind { source_desc: String, reason: String },
}

// ── Library source ───────────────────────────────────────────────────────────

/// Where the pdfium library will be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// A concrete library file.
    File(PathBuf),
    /// Defer to the dynamic loader's search path.
    System,
}

impl fmt::Display for LibrarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibrarySource::File(p) => write!(f, "'{}'", p.display()),
            LibrarySource::System => f.write_str("the system library path"),
        }
    }
}

/// Platform file name of the pdfium shared library, e.g. `libpdfium.so`.
pub fn platform_library_name() -> String {
    format!(
        "{}pdfium{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Returns the per-user directory searched for a cached pdfium library.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/pdf2tiff/pdfium/`
/// - **Linux**: `~/.cache/pdf2tiff/pdfium/`
/// - **Windows**: `%LOCALAPPDATA%\pdf2tiff\pdfium\`
///
/// Override by setting `PDFIUM_CACHE_DIR`.
pub fn pdfium_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(override_dir).join("pdfium");
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdf2tiff").join("pdfium")
}

/// Candidate library files in lookup order (steps 2–5), whether or not they
/// exist.
pub fn candidate_paths() -> Vec<PathBuf> {
    let lib_name = platform_library_name();
    let mut candidates = Vec::new();

    if let Ok(p) = std::env::var(LIB_PATH_ENV) {
        if !p.is_empty() {
            candidates.push(PathBuf::from(p));
        }
    }

    candidates.push(pdfium_cache_dir().join(&lib_name));

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(&lib_name));
    }

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(&lib_name));
    }

    candidates
}

/// Decide where pdfium should be loaded from.
///
/// An explicit path that does not exist is an error rather than a silent
/// fallback. Otherwise the first existing candidate wins, and
/// [`LibrarySource::System`] is returned when none exists.
pub fn resolve_library(explicit: Option<&Path>) -> Result<LibrarySource, PdfiumLocateError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(LibrarySource::File(path.to_path_buf()));
        }
        return Err(PdfiumLocateError::NotFound {
            path: path.to_path_buf(),
        });
    }

    Ok(candidate_paths()
        .into_iter()
        .find(|p| p.is_file())
        .map(LibrarySource::File)
        .unwrap_or(LibrarySource::System))
}

/// Binds `pdfium-render` to the library described by `source`.
pub fn bind_pdfium(source: &LibrarySource) -> Result<Pdfium, PdfiumLocateError> {
    let bindings = match source {
        LibrarySource::File(path) => Pdfium::bind_to_library(path),
        LibrarySource::System => Pdfium::bind_to_system_library(),
    };

    bindings
        .map(Pdfium::new)
        .map_err(|e| PdfiumLocateError::Bind {
            source_desc: source.to_string(),
            reason: e.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
