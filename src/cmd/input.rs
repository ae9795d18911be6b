use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use citemap::{classify, Config, DocumentTextIndex, Highlight, Section};

/// Load a saved `.json` index, or extract one from a PDF.
///
/// A saved index without any section labels is classified on load.
pub fn load_index(input: &Path, config: &Config) -> Result<DocumentTextIndex> {
    let is_json = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return extract_pdf(input, config);
    }

    let mut index = DocumentTextIndex::load_json(input)
        .with_context(|| format!("failed to load index {}", input.display()))?;
    if index.positions.iter().all(|r| r.section == Section::Unknown) {
        debug!("saved index has no section labels, classifying");
        classify(&mut index.positions, &config.classifier);
    }
    if let Some(run) = index.first_span_violation() {
        warn!(
            start = run.start_char,
            end = run.end_char,
            "run text does not match document text at its offsets"
        );
    }
    Ok(index)
}

#[cfg(feature = "pdf")]
fn extract_pdf(input: &Path, config: &Config) -> Result<DocumentTextIndex> {
    citemap::extract_file(input, &config.classifier)
        .with_context(|| format!("failed to extract {}", input.display()))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(input: &Path, _config: &Config) -> Result<DocumentTextIndex> {
    anyhow::bail!(
        "{} is not a .json index and citemap was built without the `pdf` feature",
        input.display()
    )
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One line per highlight: page, box, section and covered text.
pub fn highlight_line(hl: &Highlight) -> String {
    let section = hl.section.map_or("-", Section::as_str);
    format!(
        "p{} x={:.1} y={:.1} w={:.1} h={:.1} [{section}] {:?}",
        hl.page, hl.x, hl.y, hl.width, hl.height, hl.cited_text
    )
}
