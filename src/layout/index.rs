//! Character-indexed text model of a multi-page document.
//!
//! The document text is the concatenation of every run's text, each followed
//! by one space, with `"\n\n"` appended after every page and trailing
//! whitespace trimmed at the very end. All character arithmetic elsewhere in
//! the crate (mapping, locating, section lookups) assumes exactly this
//! policy, so it lives in one place: [`IndexBuilder`].
//!
//! Offsets count Unicode scalar values, not bytes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::PageRuns;
use crate::error::{CiteError, Result};
use crate::section::{ClassifierConfig, Section, SectionClassifier};

const RUN_SEPARATOR: &str = " ";
const PAGE_SEPARATOR: &str = "\n\n";

/// One atomic positioned text fragment, usually a word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedTextRun {
    pub text: String,
    /// Absolute character offset of the first char in the document text.
    pub start_char: usize,
    /// Exclusive end offset; `end_char - start_char` equals the char length of `text`.
    pub end_char: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Page number (1-based).
    pub page: usize,
    #[serde(default)]
    pub section: Section,
}

impl PositionedTextRun {
    /// Build a run starting at `start_char`; the end offset is derived from the text.
    pub fn new(
        text: impl Into<String>,
        start_char: usize,
        page: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        let text = text.into();
        let end_char = start_char + text.chars().count();
        Self {
            text,
            start_char,
            end_char,
            x,
            y,
            width,
            height,
            page,
            section: Section::Unknown,
        }
    }

    #[must_use]
    pub fn with_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }

    /// Average glyph advance, used for proportional sub-rectangles.
    pub fn avg_char_width(&self) -> f32 {
        let len = self.text.chars().count();
        if len == 0 {
            0.0
        } else {
            self.width / len as f32
        }
    }

    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        start.max(self.start_char) < end.min(self.end_char)
    }
}

/// The full concatenated text of a document plus its positioned runs.
///
/// Built once per PDF and never mutated afterwards, so it can be shared
/// across threads by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTextIndex {
    pub text: String,
    pub positions: Vec<PositionedTextRun>,
    pub page_count: usize,
}

impl DocumentTextIndex {
    /// Assemble an index from per-page runs and classify sections.
    ///
    /// Fails with [`CiteError::EmptyDocument`] only when `pages` is empty; a
    /// page without runs is valid and contributes just a page separator.
    pub fn from_pages(pages: Vec<PageRuns>, classifier: &ClassifierConfig) -> Result<Self> {
        let mut index = IndexBuilder::new().pages(pages).build()?;
        SectionClassifier::new(classifier.clone()).classify(&mut index.positions);
        Ok(index)
    }

    /// Load an index previously saved with [`DocumentTextIndex::save_json`].
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Length of the document text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Substring by character offsets, `None` if out of bounds or reversed.
    pub fn slice_chars(&self, start: usize, end: usize) -> Option<&str> {
        if start > end {
            return None;
        }
        let begin = char_to_byte(&self.text, start)?;
        let finish = char_to_byte(&self.text, end)?;
        Some(&self.text[begin..finish])
    }

    /// First run whose span does not slice back to its own text.
    pub fn first_span_violation(&self) -> Option<&PositionedTextRun> {
        self.positions
            .iter()
            .find(|run| self.slice_chars(run.start_char, run.end_char) != Some(run.text.as_str()))
    }

    pub fn runs_on_page(&self, page: usize) -> impl Iterator<Item = &PositionedTextRun> {
        self.positions.iter().filter(move |run| run.page == page)
    }

    /// Section of the run covering `offset`, or of the closest run before it.
    pub fn section_at(&self, offset: usize) -> Section {
        let idx = self.positions.partition_point(|run| run.start_char <= offset);
        idx.checked_sub(1)
            .and_then(|i| self.positions.get(i))
            .map_or(Section::Unknown, |run| run.section)
    }
}

/// Byte offset of the `n`-th char; `n == char count` maps to `text.len()`.
fn char_to_byte(text: &str, n: usize) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(n)
}

/// Page text with page-local run spans, computed independently per page.
#[derive(Debug, Clone)]
struct PageLayout {
    text: String,
    char_len: usize,
    spans: Vec<(usize, usize)>,
}

fn layout_page(page: &PageRuns) -> PageLayout {
    let mut text = String::new();
    let mut cursor = 0usize;
    let mut spans = Vec::with_capacity(page.runs.len());

    for run in &page.runs {
        let fragment = run.text.trim();
        if fragment.is_empty() {
            continue;
        }
        let len = fragment.chars().count();
        spans.push((cursor, cursor + len));
        text.push_str(fragment);
        text.push_str(RUN_SEPARATOR);
        cursor += len + RUN_SEPARATOR.len();
    }
    text.push_str(PAGE_SEPARATOR);
    cursor += PAGE_SEPARATOR.len();

    PageLayout {
        text,
        char_len: cursor,
        spans,
    }
}

/// Builds a [`DocumentTextIndex`] from page-local runs.
///
/// Pages are laid out independently, then global offsets are a prefix sum
/// over page text lengths. Sections are left as `unknown`.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    pages: Vec<PageRuns>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(mut self, page: PageRuns) -> Self {
        self.pages.push(page);
        self
    }

    #[must_use]
    pub fn pages(mut self, pages: impl IntoIterator<Item = PageRuns>) -> Self {
        self.pages.extend(pages);
        self
    }

    pub fn build(self) -> Result<DocumentTextIndex> {
        if self.pages.is_empty() {
            return Err(CiteError::EmptyDocument);
        }

        let layouts: Vec<PageLayout> = self.pages.iter().map(layout_page).collect();
        let mut text = String::with_capacity(layouts.iter().map(|l| l.text.len()).sum());
        let mut positions = Vec::new();
        let mut page_offset = 0usize;

        for (page, layout) in self.pages.iter().zip(&layouts) {
            let kept = page.runs.iter().filter(|r| !r.text.trim().is_empty());
            for (run, &(start, end)) in kept.zip(&layout.spans) {
                positions.push(PositionedTextRun {
                    text: run.text.trim().to_string(),
                    start_char: page_offset + start,
                    end_char: page_offset + end,
                    x: run.x,
                    y: run.y,
                    width: run.width,
                    height: run.height,
                    page: page.page,
                    section: Section::Unknown,
                });
            }
            text.push_str(&layout.text);
            page_offset += layout.char_len;
        }

        let trimmed = text.trim_end().len();
        text.truncate(trimmed);

        debug!(
            pages = self.pages.len(),
            runs = positions.len(),
            chars = page_offset,
            "assembled document text index"
        );

        Ok(DocumentTextIndex {
            text,
            positions,
            page_count: self.pages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::RawRun;

    fn page(n: usize, words: &[&str]) -> PageRuns {
        let runs = words
            .iter()
            .enumerate()
            .map(|(i, w)| RawRun::new(*w, 10.0 + i as f32 * 40.0, 100.0, 6.0 * w.len() as f32, 12.0))
            .collect();
        PageRuns::new(n, runs)
    }

    #[test]
    fn single_page_joins_with_spaces() {
        let index = IndexBuilder::new()
            .page(page(1, &["Sample", "size=45"]))
            .build()
            .unwrap();
        assert_eq!(index.text, "Sample size=45");
        assert_eq!(index.positions[0].start_char, 0);
        assert_eq!(index.positions[0].end_char, 6);
        assert_eq!(index.positions[1].start_char, 7);
        assert_eq!(index.positions[1].end_char, 14);
        assert_eq!(index.page_count, 1);
    }

    #[test]
    fn pages_separated_by_double_newline() {
        let index = IndexBuilder::new()
            .page(page(1, &["alpha", "beta"]))
            .page(page(2, &["gamma"]))
            .build()
            .unwrap();
        assert_eq!(index.text, "alpha beta \n\ngamma");
        let gamma = &index.positions[2];
        assert_eq!(gamma.page, 2);
        assert_eq!(index.slice_chars(gamma.start_char, gamma.end_char), Some("gamma"));
    }

    #[test]
    fn empty_page_still_counts() {
        let index = IndexBuilder::new()
            .page(page(1, &["one"]))
            .page(page(2, &[]))
            .page(page(3, &["three"]))
            .build()
            .unwrap();
        assert_eq!(index.page_count, 3);
        assert_eq!(index.positions.len(), 2);
        assert!(index.first_span_violation().is_none());
        assert_eq!(index.positions[1].page, 3);
    }

    #[test]
    fn zero_pages_is_empty_document() {
        let err = IndexBuilder::new().build().unwrap_err();
        assert!(matches!(err, CiteError::EmptyDocument));
    }

    #[test]
    fn blank_runs_are_skipped_and_text_is_trimmed() {
        let index = IndexBuilder::new()
            .page(PageRuns::new(
                1,
                vec![
                    RawRun::new(" padded ", 0.0, 0.0, 10.0, 10.0),
                    RawRun::new("   ", 0.0, 0.0, 10.0, 10.0),
                    RawRun::new("", 0.0, 0.0, 10.0, 10.0),
                    RawRun::new("next", 0.0, 0.0, 10.0, 10.0),
                ],
            ))
            .build()
            .unwrap();
        assert_eq!(index.text, "padded next");
        assert_eq!(index.positions.len(), 2);
        assert!(index.first_span_violation().is_none());
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        let index = IndexBuilder::new()
            .page(page(1, &["mean±SD", "45 (12.3%)", "≥18"]))
            .build()
            .unwrap();
        assert_eq!(index.positions[0].end_char, 7);
        assert_eq!(index.positions[1].start_char, 8);
        assert!(index.first_span_violation().is_none());
        assert_eq!(index.slice_chars(19, 22), Some("≥18"));
    }

    #[test]
    fn section_at_uses_preceding_run() {
        let mut index = IndexBuilder::new()
            .page(page(1, &["Results", "were", "good"]))
            .build()
            .unwrap();
        for run in &mut index.positions {
            run.section = Section::Results;
        }
        assert_eq!(index.section_at(0), Section::Results);
        // Inter-run space belongs to the run before it.
        assert_eq!(index.section_at(7), Section::Results);
    }

    #[test]
    fn json_round_trip_uses_camel_case() {
        let index = IndexBuilder::new().page(page(1, &["a"])).build().unwrap();
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.contains("\"startChar\":0"));
        assert!(json.contains("\"pageCount\":1"));
        let back: DocumentTextIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }
}
