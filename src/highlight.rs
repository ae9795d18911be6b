//! Character range → highlight rectangles.
//!
//! Sub-rectangles within a run assume every glyph has the run's average
//! advance (`width / chars`). That ignores real font metrics but is close
//! enough to mark cited text on a rendered page.

use serde::{Deserialize, Serialize};

use crate::error::{CiteError, Result};
use crate::layout::{DocumentTextIndex, PositionedTextRun};
use crate::section::Section;

/// A rectangle to mark on a page, plus the text it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// Page number (1-based).
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub cited_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
}

impl Highlight {
    /// Highlight `len` chars of `run` starting `offset` chars into its text.
    pub fn within_run(run: &PositionedTextRun, offset: usize, len: usize) -> Self {
        let avg = run.avg_char_width();
        Self {
            page: run.page,
            x: run.x + offset as f32 * avg,
            y: run.y,
            width: len as f32 * avg,
            height: run.height,
            cited_text: run.text.chars().skip(offset).take(len).collect(),
            section: known_section(run.section),
        }
    }

    /// Bounding box of `runs` restricted to the first run's page.
    ///
    /// Returns `None` for an empty slice.
    pub fn enclosing(runs: &[&PositionedTextRun], cited_text: impl Into<String>) -> Option<Self> {
        let first = runs.first()?;
        let on_page: Vec<&&PositionedTextRun> = runs.iter().filter(|r| r.page == first.page).collect();
        let x_min = on_page.iter().map(|r| r.x).fold(f32::INFINITY, f32::min);
        let y_min = on_page.iter().map(|r| r.y).fold(f32::INFINITY, f32::min);
        let x_max = on_page.iter().map(|r| r.x + r.width).fold(f32::NEG_INFINITY, f32::max);
        let y_max = on_page.iter().map(|r| r.y + r.height).fold(f32::NEG_INFINITY, f32::max);
        Some(Self {
            page: first.page,
            x: x_min,
            y: y_min,
            width: x_max - x_min,
            height: y_max - y_min,
            cited_text: cited_text.into(),
            section: known_section(first.section),
        })
    }
}

fn known_section(section: Section) -> Option<Section> {
    (section != Section::Unknown).then_some(section)
}

/// Highlights for a document character range `[start, end)`.
///
/// One highlight per run the range touches, in run order. A range covering
/// only separator characters yields an empty `Vec`. Fails with
/// [`CiteError::InvalidRange`] if `start > end` or `end` is past the text.
pub fn map_range(index: &DocumentTextIndex, start: usize, end: usize) -> Result<Vec<Highlight>> {
    let len = index.char_len();
    if start > end || end > len {
        return Err(CiteError::InvalidRange { start, end, len });
    }
    map_range_in_runs(&index.positions, start, end)
}

/// Same as [`map_range`] over a bare run slice; only `start > end` is rejected.
pub fn map_range_in_runs(runs: &[PositionedTextRun], start: usize, end: usize) -> Result<Vec<Highlight>> {
    if start > end {
        let len = runs.last().map_or(0, |r| r.end_char);
        return Err(CiteError::InvalidRange { start, end, len });
    }

    let first = runs.partition_point(|run| run.end_char <= start);
    let highlights = runs[first..]
        .iter()
        .take_while(|run| run.start_char < end)
        .filter_map(|run| {
            let overlap_start = start.max(run.start_char);
            let overlap_end = end.min(run.end_char);
            (overlap_start < overlap_end).then(|| {
                Highlight::within_run(run, overlap_start - run.start_char, overlap_end - overlap_start)
            })
        })
        .collect();

    Ok(highlights)
}
