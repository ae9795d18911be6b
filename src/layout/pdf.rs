//! PDF text-layout extraction via `pdfium-render`.
//!
//! Reads every character with its tight bounding box, flips the Y axis so
//! coordinates are measured from the top of the page, then hands each page
//! to [`super::lines::page_runs`] for word-run reconstruction.
//!
//! ```text
//! PDF bytes → pdfium char extraction → per-page runs → IndexBuilder → classifier
//! ```

use std::path::{Path, PathBuf};

use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::index::DocumentTextIndex;
use super::lines::page_runs;
use super::types::{PageRuns, PdfChar};
use crate::error::{CiteError, Result};
use crate::section::ClassifierConfig;

/// Env var pointing at the pdfium library file or its directory.
pub const PDFIUM_PATH_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Extract a classified text index from a PDF on disk.
pub fn extract_file(path: &Path, classifier: &ClassifierConfig) -> Result<DocumentTextIndex> {
    let bytes = std::fs::read(path)
        .map_err(|e| CiteError::DocumentUnreadable(format!("{}: {e}", path.display())))?;
    extract_bytes(&bytes, classifier)
}

/// Extract a classified text index from in-memory PDF bytes.
pub fn extract_bytes(bytes: &[u8], classifier: &ClassifierConfig) -> Result<DocumentTextIndex> {
    let pdfium = bind_pdfium()?;
    let pages = extract_pages(&pdfium, bytes)?;
    if pages.is_empty() {
        return Err(CiteError::EmptyDocument);
    }

    let index = DocumentTextIndex::from_pages(pages, classifier)?;
    info!(
        pages = index.page_count,
        runs = index.positions.len(),
        "extracted PDF text layout"
    );
    Ok(index)
}

/// Bind pdfium from [`PDFIUM_PATH_ENV`], falling back to the system library.
fn bind_pdfium() -> Result<Pdfium> {
    let from_env = std::env::var(PDFIUM_PATH_ENV).ok().and_then(|raw| {
        let path = PathBuf::from(raw);
        let lib_path = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        };
        Pdfium::bind_to_library(&lib_path).ok()
    });

    let bindings = match from_env {
        Some(b) => b,
        None => Pdfium::bind_to_system_library()
            .map_err(|e| CiteError::PdfiumUnavailable(e.to_string()))?,
    };
    Ok(Pdfium::new(bindings))
}

#[allow(deprecated)] // PdfRect field access deprecated in 0.8.28, removed in 0.9.0
fn extract_pages(pdfium: &Pdfium, bytes: &[u8]) -> Result<Vec<PageRuns>> {
    let doc = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| CiteError::DocumentUnreadable(e.to_string()))?;

    let mut pages = Vec::new();
    for (idx, page) in doc.pages().iter().enumerate() {
        let page_num = idx + 1;
        let page_height = page.height().value;
        let text = page
            .text()
            .map_err(|e| CiteError::DocumentUnreadable(format!("page {page_num}: {e}")))?;

        let mut chars = Vec::new();
        for ch in text.chars().iter() {
            if let (Some(unicode_ch), Ok(rect)) = (ch.unicode_char(), ch.tight_bounds()) {
                chars.push(PdfChar {
                    ch: unicode_ch,
                    x: rect.left.value,
                    y: page_height - rect.top.value,
                    width: (rect.right.value - rect.left.value).abs(),
                    height: (rect.top.value - rect.bottom.value).abs(),
                    page: page_num,
                });
            }
        }

        let runs = page_runs(page_num, &chars);
        debug!(page = page_num, chars = chars.len(), runs = runs.runs.len(), "page layout");
        pages.push(runs);
    }

    Ok(pages)
}
