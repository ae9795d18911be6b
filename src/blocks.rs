//! Aggregation of consecutive runs into text windows for fuzzy search.
//!
//! A citation usually spans several word runs, so no single run contains
//! it. Blocks glue runs back together (space-joined) up to a soft length
//! cap. The cap is checked before adding a run, so a block may overshoot by
//! up to one run; runs are never cut.

use serde::{Deserialize, Serialize};

use crate::highlight::Highlight;
use crate::layout::PositionedTextRun;

/// Aggregation cap used by the fuzzy locator.
pub const DEFAULT_BLOCK_MAX_LEN: usize = 500;

/// Consecutive runs joined into one searchable string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub text: String,
    pub positions: Vec<PositionedTextRun>,
    pub start_char: usize,
    pub end_char: usize,
}

impl TextBlock {
    fn seed(run: &PositionedTextRun) -> Self {
        Self {
            text: run.text.clone(),
            positions: vec![run.clone()],
            start_char: run.start_char,
            end_char: run.end_char,
        }
    }

    fn push(&mut self, run: &PositionedTextRun) {
        self.text.push(' ');
        self.text.push_str(&run.text);
        self.end_char = run.end_char;
        self.positions.push(run.clone());
    }

    /// Char span of each run inside `self.text`.
    pub fn local_spans(&self) -> Vec<(usize, usize)> {
        let mut cursor = 0;
        self.positions
            .iter()
            .map(|run| {
                let len = run.text.chars().count();
                let span = (cursor, cursor + len);
                cursor += len + 1;
                span
            })
            .collect()
    }

    /// Runs overlapping the block-local char window `[start, end)`, with the
    /// overlap expressed as (offset into run text, length).
    pub fn runs_in_window(&self, start: usize, end: usize) -> Vec<(&PositionedTextRun, usize, usize)> {
        self.positions
            .iter()
            .zip(self.local_spans())
            .filter_map(|(run, (ls, le))| {
                let from = start.max(ls);
                let to = end.min(le);
                (from < to).then(|| (run, from - ls, to - from))
            })
            .collect()
    }

    /// Per-run highlights for a block-local char window.
    pub fn highlights_in_window(&self, start: usize, end: usize) -> Vec<Highlight> {
        self.runs_in_window(start, end)
            .into_iter()
            .map(|(run, offset, len)| Highlight::within_run(run, offset, len))
            .collect()
    }
}

/// Group runs into blocks in one left-to-right pass.
///
/// A new block starts when none is open or when the open block's text is
/// already longer than `max_len` chars.
pub fn build_blocks<'a>(
    positions: impl IntoIterator<Item = &'a PositionedTextRun>,
    max_len: usize,
) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<(TextBlock, usize)> = None;

    for run in positions {
        let run_len = run.text.chars().count();
        match open.as_mut() {
            Some((block, len)) if *len <= max_len => {
                block.push(run);
                *len += 1 + run_len;
            }
            _ => {
                blocks.extend(open.take().map(|(block, _)| block));
                open = Some((TextBlock::seed(run), run_len));
            }
        }
    }
    blocks.extend(open.map(|(block, _)| block));

    blocks
}
