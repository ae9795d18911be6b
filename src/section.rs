//! Document-section classification over positioned runs.
//!
//! A single left-to-right scan with one "current section" register and a
//! table-context flag. Per run, in priority order:
//!
//! 1. Table caption start (`Table 2`, `Tab. 3`) at the start of a line →
//!    `table`, table context on.
//! 2. Figure caption start (`Figure 1`, `Fig. 2`) at the start of a line →
//!    `figure`.
//! 3. Section header (`Methods`, `2. Results`, `Materials and Methods`) that
//!    fills its whole line, or ends in a colon at the start of one →
//!    header's section becomes current, table context off.
//! 4. Anything else inherits the current section, unless table context is
//!    on or the run (or the numeric fragments it starts) looks like tabular
//!    numbers, in which case `table`.
//!
//! Table context also ends once the scan moves more than
//! [`ClassifierConfig::table_page_slack`] pages past the caption's page.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::PositionedTextRun;

/// Closed set of document-section labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Unknown,
    Abstract,
    Introduction,
    Methods,
    Results,
    Discussion,
    Conclusion,
    References,
    Table,
    Figure,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Unknown => "unknown",
            Section::Abstract => "abstract",
            Section::Introduction => "introduction",
            Section::Methods => "methods",
            Section::Results => "results",
            Section::Discussion => "discussion",
            Section::Conclusion => "conclusion",
            Section::References => "references",
            Section::Table => "table",
            Section::Figure => "figure",
        }
    }

    /// Sections that report primary data rather than interpret it.
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            Section::Methods | Section::Results | Section::Table | Section::Figure
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Pages a table may run past its caption page before context is dropped.
    pub table_page_slack: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { table_page_slack: 1 }
    }
}

/// Longest multi-run header phrase tried ("patients and methods" is three).
const MAX_HEADER_RUNS: usize = 4;

const HEADER_PREFIX: &str = r"(?i)^(?:(?:\d+|[ivx]+)\.?\s+)?";
const HEADER_SUFFIX: &str = r"[:.]?$";

static HEADER_PATTERNS: Lazy<Vec<(Regex, Section)>> = Lazy::new(|| {
    [
        (r"abstract", Section::Abstract),
        (r"(?:introduction|background)", Section::Introduction),
        (
            r"(?:methods|patients|materials|study design|subjects|patients and methods|materials and methods)",
            Section::Methods,
        ),
        (r"results", Section::Results),
        (r"discussion", Section::Discussion),
        (r"(?:conclusion|conclusions)", Section::Conclusion),
        (r"(?:references|bibliography)", Section::References),
    ]
    .into_iter()
    .map(|(body, section)| {
        let pattern = format!("{HEADER_PREFIX}{body}{HEADER_SUFFIX}");
        (Regex::new(&pattern).expect("valid header regex"), section)
    })
    .collect()
});

static TABLE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^tab(?:le|\.)?\s*\d").expect("valid table regex"));
static TABLE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^tab(?:le|\.)?$").expect("valid table word regex"));
static FIGURE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^fig(?:ure|\.)?\s*\d").expect("valid figure regex"));
static FIGURE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^fig(?:ure|\.)?$").expect("valid figure word regex"));

/// Table-like content: mean±SD, n (%), ratios, comparison-prefixed numbers,
/// p-values and sample sizes.
static TABLE_CONTENT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\d+(?:\.\d+)?\s*±\s*\d+(?:\.\d+)?",
        r"\d+\s*\(\s*\d+(?:\.\d+)?\s*%\s*\)",
        r"^\d+(?:\.\d+)?\s*[/:]\s*\d+(?:\.\d+)?$",
        r"^[<>≤≥]=?\s*\d",
        r"(?i)\bp\s*[=<>≤≥]\s*0?\.\d",
        r"(?i)\bn\s*=\s*\d",
    ])
    .expect("valid table content regex set")
});

/// Pieces of a cell that word-level extraction split apart: `45`, `(12.3%)`,
/// `±`, `p`, `=`.
static NUMERIC_FRAGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[\d.,:;/%()±<>≤≥=+\-–]+|[pPnN])$").expect("valid numeric fragment regex")
});

/// Whether a run's text looks like a cell of a numeric results table.
pub fn is_table_like(text: &str) -> bool {
    TABLE_CONTENT.is_match(text.trim())
}

fn header_section(text: &str) -> Option<Section> {
    let text = text.trim();
    HEADER_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, section)| *section)
}

fn starts_with_digit(text: &str) -> bool {
    text.trim_start().chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Two runs share a text line: same page, tops within half a line height.
fn same_line(a: &PositionedTextRun, b: &PositionedTextRun) -> bool {
    a.page == b.page && (a.y - b.y).abs() < a.height.max(b.height).max(1.0) * 0.5
}

fn starts_line(runs: &[PositionedTextRun], i: usize) -> bool {
    i == 0 || !same_line(&runs[i - 1], &runs[i])
}

/// Number of runs on the line that begins at `i`.
fn line_len(runs: &[PositionedTextRun], i: usize) -> usize {
    1 + runs[i + 1..].iter().take_while(|r| same_line(&runs[i], r)).count()
}

/// Number of runs (1 or 2) forming a caption start at `i`, if any.
///
/// Captions open a line; "see Table 2" inside a sentence is a reference.
/// Word-level extraction splits "Table 2." into `Table` + `2.`, so a bare
/// keyword followed by a number on the same line also counts.
fn caption_start(runs: &[PositionedTextRun], i: usize, start: &Regex, word: &Regex) -> Option<usize> {
    if !starts_line(runs, i) {
        return None;
    }
    let text = runs[i].text.trim();
    if start.is_match(text) {
        return Some(1);
    }
    let next = runs.get(i + 1)?;
    (word.is_match(text) && same_line(&runs[i], next) && starts_with_digit(&next.text)).then_some(2)
}

/// Number of runs forming a table cell at `i`, if any.
///
/// Either the run alone looks tabular, or it starts a same-line group of
/// numeric fragments that does once rejoined ("62.4" "±" "8.1").
fn table_cell_at(runs: &[PositionedTextRun], i: usize) -> Option<usize> {
    if is_table_like(&runs[i].text) {
        return Some(1);
    }
    let count = runs[i..]
        .iter()
        .take_while(|r| same_line(&runs[i], r) && NUMERIC_FRAGMENT.is_match(r.text.trim()))
        .count();
    if count < 2 {
        return None;
    }
    let joined = runs[i..i + count]
        .iter()
        .map(|r| r.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    is_table_like(&joined).then_some(count)
}

/// Header phrase of up to [`MAX_HEADER_RUNS`] runs opening a line.
///
/// The phrase must fill the line ("Materials and Methods"), or end in a
/// colon when text follows it ("Methods: we enrolled"). A header word
/// inside a sentence never matches.
fn header_at(runs: &[PositionedTextRun], i: usize) -> Option<(Section, usize)> {
    if !starts_line(runs, i) {
        return None;
    }
    let line = line_len(runs, i);
    (1..=line.min(MAX_HEADER_RUNS)).rev().find_map(|n| {
        let window = &runs[i..i + n];
        if n < line && !window[n - 1].text.trim_end().ends_with(':') {
            return None;
        }
        let phrase = window
            .iter()
            .map(|r| r.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        header_section(&phrase).map(|section| (section, n))
    })
}

/// Stateful scanner assigning a [`Section`] to every run.
#[derive(Debug, Clone)]
pub struct SectionClassifier {
    config: ClassifierConfig,
    current: Section,
    table_page: Option<usize>,
}

impl SectionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            current: Section::Unknown,
            table_page: None,
        }
    }

    /// Label every run in place. Runs must be in reading order.
    pub fn classify(&mut self, runs: &mut [PositionedTextRun]) {
        self.current = Section::Unknown;
        self.table_page = None;

        let mut i = 0;
        while i < runs.len() {
            let (section, count) = self.step(runs, i);
            for run in &mut runs[i..i + count] {
                run.section = section;
            }
            i += count;
        }
    }

    /// Decide the label for the run at `i`; returns how many runs it covers.
    fn step(&mut self, runs: &[PositionedTextRun], i: usize) -> (Section, usize) {
        let page = runs[i].page;
        if let Some(table_page) = self.table_page {
            if page > table_page + self.config.table_page_slack {
                debug!(page, table_page, "table context expired");
                self.table_page = None;
            }
        }

        if let Some(count) = caption_start(runs, i, &TABLE_START, &TABLE_WORD) {
            self.table_page = Some(page);
            return (Section::Table, count);
        }

        if let Some(count) = caption_start(runs, i, &FIGURE_START, &FIGURE_WORD) {
            return (Section::Figure, count);
        }

        if let Some((section, count)) = header_at(runs, i) {
            debug!(%section, page, start_char = runs[i].start_char, "section header");
            self.current = section;
            self.table_page = None;
            return (section, count);
        }

        if self.table_page.is_some() {
            return (Section::Table, 1);
        }
        match table_cell_at(runs, i) {
            Some(count) => (Section::Table, count),
            None => (self.current, 1),
        }
    }
}

/// Label runs in place with a fresh classifier.
pub fn classify(runs: &mut [PositionedTextRun], config: &ClassifierConfig) {
    SectionClassifier::new(config.clone()).classify(runs);
}

/// A contiguous stretch of runs sharing one section label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpan {
    pub section: Section,
    pub start_char: usize,
    pub end_char: usize,
    pub start_page: usize,
    pub end_page: usize,
    pub run_count: usize,
}

/// Fold classified runs into contiguous section spans, skipping `unknown`.
pub fn section_spans(runs: &[PositionedTextRun]) -> Vec<SectionSpan> {
    let mut spans: Vec<SectionSpan> = Vec::new();
    let mut open: Option<SectionSpan> = None;

    for run in runs {
        match open.as_mut() {
            Some(span) if span.section == run.section => {
                span.end_char = run.end_char;
                span.end_page = run.page;
                span.run_count += 1;
            }
            _ => {
                spans.extend(open.take());
                open = Some(SectionSpan {
                    section: run.section,
                    start_char: run.start_char,
                    end_char: run.end_char,
                    start_page: run.page,
                    end_page: run.page,
                    run_count: 1,
                });
            }
        }
    }
    spans.extend(open);

    spans.retain(|s| s.section != Section::Unknown);
    spans
}

/// A table caption line such as "Table 1. Patient demographics".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCaption {
    pub page: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub text: String,
}

/// Collect table captions: a table-start run plus the rest of its line.
pub fn table_captions(runs: &[PositionedTextRun]) -> Vec<TableCaption> {
    let mut captions = Vec::new();
    let mut i = 0;
    while i < runs.len() {
        if caption_start(runs, i, &TABLE_START, &TABLE_WORD).is_none() {
            i += 1;
            continue;
        }
        let line = &runs[i..i + line_len(runs, i)];
        let (first, last) = (&line[0], &line[line.len() - 1]);
        captions.push(TableCaption {
            page: first.page,
            start_char: first.start_char,
            end_char: last.end_char,
            text: line.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(" "),
        });
        i += line.len();
    }
    captions
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Words laid out left to right; `;` starts a new line, `|` a new page.
    fn runs(words: &[&str]) -> Vec<PositionedTextRun> {
        let mut out = Vec::new();
        let (mut cursor, mut page) = (0, 1);
        let (mut x, mut y) = (10.0_f32, 100.0_f32);
        for word in words {
            match *word {
                ";" => {
                    y += 14.0;
                    x = 10.0;
                }
                "|" => {
                    page += 1;
                    cursor += 2;
                    x = 10.0;
                    y = 100.0;
                }
                _ => {
                    let run = PositionedTextRun::new(*word, cursor, page, x, y, 6.0 * word.len() as f32, 12.0);
                    cursor = run.end_char + 1;
                    x += run.width + 4.0;
                    out.push(run);
                }
            }
        }
        out
    }

    fn labels(runs: &[PositionedTextRun]) -> Vec<Section> {
        runs.iter().map(|r| r.section).collect()
    }

    #[test]
    fn table_caption_is_table() {
        let mut r = runs(&["Table 2."]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(r[0].section, Section::Table);
    }

    #[test]
    fn split_table_caption_covers_both_runs() {
        let mut r = runs(&["Results", ";", "Table", "2.", "Demographics"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(
            labels(&r),
            vec![Section::Results, Section::Table, Section::Table, Section::Table]
        );
    }

    #[test]
    fn standalone_header_flips_section() {
        let mut r = runs(&["Methods", ";", "we", "enrolled", ";", "Discussion", ";", "this", "suggests"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(
            labels(&r),
            vec![
                Section::Methods,
                Section::Methods,
                Section::Methods,
                Section::Discussion,
                Section::Discussion,
                Section::Discussion,
            ]
        );
    }

    #[test]
    fn numeric_run_inside_methods_is_table() {
        let mut r = runs(&["Methods", ";", "patients", "45 (12.3%)", "were"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(r[2].section, Section::Table);
        assert_eq!(r[3].section, Section::Methods);
    }

    #[test]
    fn header_word_inside_sentence_keeps_section() {
        let mut r = runs(&[
            "Discussion", ";", "In", "our", "cohort", "the", "patients", "improved", "markedly", ";", "and",
            "results", "held", "after", "surgery",
        ]);
        classify(&mut r, &ClassifierConfig::default());
        assert!(labels(&r).iter().all(|s| *s == Section::Discussion));
    }

    #[test]
    fn header_word_opening_a_prose_line_keeps_section() {
        let mut r = runs(&["Discussion", ";", "we", "saw", ";", "Results", "were", "consistent"]);
        classify(&mut r, &ClassifierConfig::default());
        assert!(labels(&r).iter().all(|s| *s == Section::Discussion));
    }

    #[test]
    fn run_in_header_with_colon() {
        let mut r = runs(&["Abstract", ";", "Methods:", "we", "enrolled", ";", "Results:", "pain", "fell"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(labels(&r)[1..4], [Section::Methods; 3]);
        assert_eq!(labels(&r)[4..], [Section::Results; 3]);
    }

    #[test]
    fn inline_table_reference_is_not_a_caption() {
        let mut r = runs(&[
            "Discussion", ";", "As", "shown", "in", "Table", "2", "our", "findings", "hold", ";", "for",
            "older", "adults",
        ]);
        classify(&mut r, &ClassifierConfig::default());
        assert!(labels(&r).iter().all(|s| *s == Section::Discussion));
        assert!(table_captions(&r).is_empty());

        let mut r = runs(&["Results", ";", "see", "Figure 1", "for", "details"]);
        classify(&mut r, &ClassifierConfig::default());
        assert!(labels(&r).iter().all(|s| *s == Section::Results));
    }

    #[test]
    fn split_numeric_cells_are_table() {
        let mut r = runs(&[
            "Methods", ";", "45", "(12.3%)", ";", "p", "=", "0.03", ";", "62.4", "±", "8.1", ";", "aged", "40",
            "to", "70",
        ]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(&labels(&r)[1..9], &[Section::Table; 8]);
        assert_eq!(&labels(&r)[9..], &[Section::Methods; 4]);
    }

    #[test]
    fn figure_caption_does_not_persist() {
        let mut r = runs(&["Results", ";", "Figure 1", "shows", "outcomes"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(r[1].section, Section::Figure);
        assert_eq!(r[2].section, Section::Results);
    }

    #[test]
    fn table_context_persists_until_header() {
        let mut r = runs(&["Results", ";", "Table 1", ";", "Age", "Sex", ";", "Discussion", ";", "We"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(
            labels(&r),
            vec![
                Section::Results,
                Section::Table,
                Section::Table,
                Section::Table,
                Section::Discussion,
                Section::Discussion,
            ]
        );
    }

    #[test]
    fn table_context_allows_one_page_of_slack() {
        let mut r = runs(&["Results", ";", "Table 1", ";", "Age", "|", "Sex", "|", "prose"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(r[3].section, Section::Table);
        assert_eq!(r[4].section, Section::Results);
    }

    #[test]
    fn table_page_slack_is_configurable() {
        let mut r = runs(&["Results", ";", "Table 1", "|", "Sex"]);
        classify(&mut r, &ClassifierConfig { table_page_slack: 0 });
        assert_eq!(r[2].section, Section::Results);
    }

    #[test]
    fn multi_word_header_is_recognized() {
        let mut r = runs(&["Introduction", ";", "text", ";", "Materials", "and", "Methods", ";", "we"]);
        classify(&mut r, &ClassifierConfig::default());
        assert_eq!(r[1].section, Section::Introduction);
        assert_eq!(&labels(&r)[2..], &[Section::Methods; 4]);
    }

    #[test]
    fn numbered_and_uppercase_headers() {
        assert_eq!(header_section("2. RESULTS"), Some(Section::Results));
        assert_eq!(header_section("IV. Discussion"), Some(Section::Discussion));
        assert_eq!(header_section("Conclusions:"), Some(Section::Conclusion));
        assert_eq!(header_section("Results were"), None);
    }

    #[test]
    fn table_like_content_heuristic() {
        assert!(is_table_like("45 (12.3%)"));
        assert!(is_table_like("62.4 ± 8.1"));
        assert!(is_table_like("3/10"));
        assert!(is_table_like("<0.05"));
        assert!(is_table_like("≥18"));
        assert!(is_table_like("p=0.03"));
        assert!(is_table_like("P < .001"));
        assert!(is_table_like("n = 120"));
        assert!(!is_table_like("size=45"));
        assert!(!is_table_like("patients"));
    }

    #[test]
    fn primary_sections() {
        assert!(Section::Methods.is_primary());
        assert!(Section::Table.is_primary());
        assert!(Section::Figure.is_primary());
        assert!(!Section::Discussion.is_primary());
        assert!(!Section::Unknown.is_primary());
    }

    #[test]
    fn spans_skip_unknown_and_merge_runs() {
        let mut r = runs(&["preamble", ";", "Abstract", ";", "short", ";", "Results", ";", "found"]);
        classify(&mut r, &ClassifierConfig::default());
        let spans = section_spans(&r);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].section, Section::Abstract);
        assert_eq!(spans[0].run_count, 2);
        assert_eq!(spans[0].start_char, r[1].start_char);
        assert_eq!(spans[1].section, Section::Results);
        assert_eq!(spans[1].end_char, r[4].end_char);
    }

    #[test]
    fn captions_collect_rest_of_line() {
        let r = runs(&["Table", "1.", "Patient", "demographics", ";", "Age"]);
        let captions = table_captions(&r);
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text, "Table 1. Patient demographics");
        assert_eq!(captions[0].end_char, r[3].end_char);
    }

    #[test]
    fn section_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Section::Methods).unwrap(), "\"methods\"");
    }
}
