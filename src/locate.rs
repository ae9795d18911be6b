//! Citation lookup: exact substring, fuzzy window search, and the
//! exact-then-fuzzy strategy that callers normally use.
//!
//! Fuzzy search works on [`TextBlock`]s rather than single runs because a
//! quoted sentence almost never fits in one word run. Inside each block a
//! word window sized around the citation slides across the text and is
//! scored by normalized Levenshtein distance (0 = identical, 1 = nothing in
//! common). The best window of a block is the block's score.

use once_cell::sync::Lazy;
use rapidfuzz::distance::levenshtein;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blocks::{build_blocks, TextBlock, DEFAULT_BLOCK_MAX_LEN};
use crate::highlight::Highlight;
use crate::layout::PositionedTextRun;
use crate::section::Section;

/// Default upper bound on an accepted fuzzy score.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Windows shorter than this many chars are ignored, however short the
/// citation.
const MIN_MATCH_CAP: usize = 20;

/// Line-break hyphenation left in extracted text: `"treat- ment"`.
static HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{L})-\s+(\p{L})").expect("valid hyphen regex"));

/// Tuning knobs for fuzzy and smart lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocateOptions {
    /// Maximum accepted normalized distance, in `[0, 1]`.
    pub threshold: f64,
    /// Search only runs whose section is primary (methods, results, tables,
    /// figures).
    pub only_primary_sections: bool,
    /// Cap on [`find_all_fuzzy`] results.
    pub max_results: usize,
    /// Soft cap on aggregated block length.
    pub block_max_len: usize,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            only_primary_sections: false,
            max_results: 5,
            block_max_len: DEFAULT_BLOCK_MAX_LEN,
        }
    }
}

impl LocateOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn primary_only(mut self, only: bool) -> Self {
        self.only_primary_sections = only;
        self
    }
}

/// A fuzzy hit inside one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyMatchResult {
    /// Runs the matched window touches, in document order.
    pub positions: Vec<PositionedTextRun>,
    /// Box around the matched runs on the first matched page.
    pub highlight: Highlight,
    /// One rectangle per matched run.
    pub highlights: Vec<Highlight>,
    /// Normalized distance of the best window, lower is better.
    pub score: f64,
    /// Block text covered by the best window.
    pub matched_text: String,
    /// Whole text of the block the window came from.
    pub block_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    None,
}

/// Outcome of [`find_smart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartMatch {
    pub method: MatchMethod,
    /// `1.0` for exact, `1 - score` for fuzzy, `0.0` when nothing matched.
    pub confidence: f64,
    pub highlights: Vec<Highlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SmartMatch {
    fn exact(highlight: Highlight) -> Self {
        Self {
            method: MatchMethod::Exact,
            confidence: 1.0,
            matched_text: Some(highlight.cited_text.clone()),
            section: highlight.section,
            score: Some(0.0),
            highlights: vec![highlight],
        }
    }

    fn fuzzy(hit: FuzzyMatchResult) -> Self {
        Self {
            method: MatchMethod::Fuzzy,
            confidence: 1.0 - hit.score,
            section: hit.highlight.section,
            score: Some(hit.score),
            matched_text: Some(hit.matched_text),
            highlights: hit.highlights,
        }
    }

    fn none() -> Self {
        Self {
            method: MatchMethod::None,
            confidence: 0.0,
            highlights: Vec::new(),
            matched_text: None,
            section: None,
            score: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.method != MatchMethod::None
    }
}

/// First run whose text contains `search_text`, case-insensitively.
///
/// The needle is trimmed first and must fit inside a single run; an empty
/// needle never matches. Offsets are counted in the run's own chars, so a
/// char whose lowercase form is longer (`İ`) does not shift the highlight.
pub fn find_exact(search_text: &str, positions: &[PositionedTextRun]) -> Option<Highlight> {
    let needle: Vec<char> = search_text.trim().chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    positions.iter().find_map(|run| {
        let hay: Vec<char> = run.text.chars().collect();
        (0..hay.len()).find_map(|start| {
            let len = lowercase_match_len(&hay[start..], &needle)?;
            Some(Highlight::within_run(run, start, len))
        })
    })
}

/// Number of leading `hay` chars whose lowercase forms spell exactly
/// `needle`, ending on a char boundary.
fn lowercase_match_len(hay: &[char], needle: &[char]) -> Option<usize> {
    let mut matched = 0;
    for (i, c) in hay.iter().enumerate() {
        for lower in c.to_lowercase() {
            if needle.get(matched) != Some(&lower) {
                return None;
            }
            matched += 1;
        }
        if matched == needle.len() {
            return Some(i + 1);
        }
    }
    None
}

/// Best fuzzy match for `cited_text`, or `None` if no block scores within
/// `options.threshold`. Ties go to the earlier block.
pub fn find_fuzzy(
    cited_text: &str,
    positions: &[PositionedTextRun],
    options: &LocateOptions,
) -> Option<FuzzyMatchResult> {
    scored_blocks(cited_text, positions, options)
        .into_iter()
        .reduce(|best, hit| if hit.score < best.score { hit } else { best })
}

/// Every block scoring within `options.threshold`, best first, capped at
/// `options.max_results`.
pub fn find_all_fuzzy(
    cited_text: &str,
    positions: &[PositionedTextRun],
    options: &LocateOptions,
) -> Vec<FuzzyMatchResult> {
    let mut hits = scored_blocks(cited_text, positions, options);
    hits.sort_by(|a, b| a.score.total_cmp(&b.score));
    hits.truncate(options.max_results);
    hits
}

/// Exact lookup first, fuzzy as fallback.
///
/// With `only_primary_sections` set, an exact hit outside the primary
/// sections is discarded and the fuzzy search (restricted to primary
/// sections) runs instead.
pub fn find_smart(cited_text: &str, positions: &[PositionedTextRun], options: &LocateOptions) -> SmartMatch {
    if let Some(hit) = find_exact(cited_text, positions) {
        let primary = hit.section.is_some_and(Section::is_primary);
        if !options.only_primary_sections || primary {
            return SmartMatch::exact(hit);
        }
        debug!(section = ?hit.section, "exact hit outside primary sections, trying fuzzy");
    }

    match find_fuzzy(cited_text, positions, options) {
        Some(hit) => SmartMatch::fuzzy(hit),
        None => SmartMatch::none(),
    }
}

/// [`find_smart`] for each citation, in input order.
pub fn find_smart_batch<S: AsRef<str>>(
    citations: &[S],
    positions: &[PositionedTextRun],
    options: &LocateOptions,
) -> Vec<SmartMatch> {
    citations
        .iter()
        .map(|c| find_smart(c.as_ref(), positions, options))
        .collect()
}

/// Lowercase, collapse whitespace and rejoin hyphenated line breaks.
pub fn normalize(text: &str) -> String {
    let collapsed = text
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");
    HYPHEN_BREAK.replace_all(&collapsed, "$1$2").into_owned()
}

/// Best window of one block: score and block-local char span.
#[derive(Debug, Clone, Copy)]
struct Window {
    score: f64,
    start: usize,
    end: usize,
}

struct Query {
    text: String,
    chars: usize,
    words: usize,
    min_len: usize,
}

impl Query {
    fn new(cited_text: &str) -> Option<Self> {
        let text = normalize(cited_text);
        if text.is_empty() {
            return None;
        }
        let chars = text.chars().count();
        Some(Self {
            words: text.split(' ').count(),
            min_len: (chars / 2).min(MIN_MATCH_CAP),
            chars,
            text,
        })
    }

    fn best_window(&self, block: &TextBlock) -> Option<Window> {
        let chars: Vec<char> = block.text.chars().collect();
        let tokens = token_spans(&chars);
        let n = tokens.len();
        if n == 0 {
            return None;
        }

        let hi = (self.words + 1).min(n);
        let lo = self.words.saturating_sub(1).max(1).min(hi);
        let mut best: Option<Window> = None;

        for size in lo..=hi {
            for first in 0..=n - size {
                let start = tokens[first].0;
                let end = tokens[first + size - 1].1;
                if end - start < self.min_len {
                    continue;
                }

                let candidate = normalize(&chars[start..end].iter().collect::<String>());
                let cand_len = candidate.chars().count();
                // Levenshtein distance is at least the length difference.
                let floor = self.chars.abs_diff(cand_len) as f64 / self.chars.max(cand_len) as f64;
                if best.is_some_and(|b| floor >= b.score) {
                    continue;
                }

                let score = levenshtein::normalized_distance(self.text.chars(), candidate.chars());
                if best.map_or(true, |b| score < b.score) {
                    best = Some(Window { score, start, end });
                    if score <= 0.0 {
                        return best;
                    }
                }
            }
        }
        best
    }
}

/// Char spans of whitespace-separated tokens.
fn token_spans(chars: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open = None;
    for (i, c) in chars.iter().enumerate() {
        match (c.is_whitespace(), open) {
            (true, Some(s)) => {
                spans.push((s, i));
                open = None;
            }
            (false, None) => open = Some(i),
            _ => {}
        }
    }
    if let Some(s) = open {
        spans.push((s, chars.len()));
    }
    spans
}

/// All blocks whose best window is within the threshold, in document order.
fn scored_blocks(
    cited_text: &str,
    positions: &[PositionedTextRun],
    options: &LocateOptions,
) -> Vec<FuzzyMatchResult> {
    let Some(query) = Query::new(cited_text) else {
        return Vec::new();
    };
    let threshold = options.threshold.clamp(0.0, 1.0);

    let blocks = if options.only_primary_sections {
        build_blocks(
            positions.iter().filter(|r| r.section.is_primary()),
            options.block_max_len,
        )
    } else {
        build_blocks(positions, options.block_max_len)
    };

    let hits: Vec<FuzzyMatchResult> = blocks
        .iter()
        .filter_map(|block| {
            let window = query.best_window(block)?;
            (window.score <= threshold).then(|| fuzzy_hit(block, window)).flatten()
        })
        .collect();

    debug!(
        blocks = blocks.len(),
        hits = hits.len(),
        threshold,
        primary_only = options.only_primary_sections,
        "fuzzy citation search"
    );
    hits
}

fn fuzzy_hit(block: &TextBlock, window: Window) -> Option<FuzzyMatchResult> {
    let matched_text: String = block
        .text
        .chars()
        .skip(window.start)
        .take(window.end - window.start)
        .collect();

    let touched = block.runs_in_window(window.start, window.end);
    let runs: Vec<&PositionedTextRun> = touched.iter().map(|(run, _, _)| *run).collect();
    let highlight = Highlight::enclosing(&runs, matched_text.clone())?;

    Some(FuzzyMatchResult {
        positions: runs.into_iter().cloned().collect(),
        highlights: block.highlights_in_window(window.start, window.end),
        highlight,
        score: window.score,
        matched_text,
        block_text: block.text.clone(),
    })
}
