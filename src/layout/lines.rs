//! Line and word-run reconstruction from positioned characters.
//!
//! ```text
//! chars → sort by page / baseline → group into lines → split at gaps → runs
//! ```
//!
//! Pure geometry, no pdfium dependency, so it is tested directly.

use super::types::{PageRuns, PdfChar, RawRun, TextLine};

/// Fraction of char height within which two baselines count as one line.
const LINE_TOLERANCE: f32 = 0.4;

/// Fraction of the line's average char width above which a gap splits words.
const SPACE_THRESHOLD: f32 = 0.3;

/// Reconstruct text lines from positioned characters.
///
/// 1. Sort by page, then bottom edge (top-to-bottom), then X ascending.
/// 2. Group characters whose bottom edges are within tolerance into a line.
/// 3. Re-sort each line left-to-right (glyph bottoms differ within a line).
pub fn reconstruct_lines(chars: &[PdfChar]) -> Vec<TextLine> {
    if chars.is_empty() {
        return Vec::new();
    }

    let mut sorted = chars.to_vec();
    sorted.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(
                a.bottom()
                    .partial_cmp(&b.bottom())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<PdfChar> = Vec::new();

    for ch in sorted {
        let same_line = current.last().is_some_and(|last| {
            let tolerance = last.height.max(ch.height) * LINE_TOLERANCE;
            ch.page == last.page && (ch.bottom() - last.bottom()).abs() < tolerance
        });
        if !same_line && !current.is_empty() {
            lines.push(build_line(std::mem::take(&mut current)));
        }
        current.push(ch);
    }

    if !current.is_empty() {
        lines.push(build_line(current));
    }

    lines
}

/// Build a [`TextLine`] from grouped characters in left-to-right order.
fn build_line(mut chars: Vec<PdfChar>) -> TextLine {
    chars.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    TextLine {
        page: chars[0].page,
        chars,
    }
}

fn space_threshold(chars: &[PdfChar]) -> f32 {
    let visible: Vec<&PdfChar> = chars.iter().filter(|c| !c.ch.is_whitespace()).collect();
    if visible.is_empty() {
        return 0.0;
    }
    let avg = visible.iter().map(|c| c.width).sum::<f32>() / visible.len() as f32;
    avg * SPACE_THRESHOLD
}

/// Split a line into word runs at whitespace chars and wide gaps.
pub fn split_runs(line: &TextLine) -> Vec<RawRun> {
    let threshold = space_threshold(&line.chars);
    let mut runs = Vec::new();
    let mut word: Vec<&PdfChar> = Vec::new();

    for ch in &line.chars {
        if ch.ch.is_whitespace() {
            flush_word(&mut word, &mut runs);
            continue;
        }
        if let Some(prev) = word.last() {
            if ch.x - prev.right() > threshold {
                flush_word(&mut word, &mut runs);
            }
        }
        word.push(ch);
    }
    flush_word(&mut word, &mut runs);

    runs
}

fn flush_word(word: &mut Vec<&PdfChar>, runs: &mut Vec<RawRun>) {
    if word.is_empty() {
        return;
    }
    let text: String = word.iter().map(|c| c.ch).collect();
    let x_min = word.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
    let x_max = word.iter().map(|c| c.right()).fold(f32::NEG_INFINITY, f32::max);
    let y_min = word.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
    let y_max = word.iter().map(|c| c.bottom()).fold(f32::NEG_INFINITY, f32::max);
    runs.push(RawRun::new(text, x_min, y_min, x_max - x_min, y_max - y_min));
    word.clear();
}

/// Turn one page's characters into reading-order word runs.
pub fn page_runs(page: usize, chars: &[PdfChar]) -> PageRuns {
    let runs = reconstruct_lines(chars)
        .iter()
        .flat_map(split_runs)
        .collect();
    PageRuns::new(page, runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pc(ch: char, x: f32, y: f32, width: f32) -> PdfChar {
        PdfChar {
            ch,
            x,
            y,
            width,
            height: 12.0,
            page: 1,
        }
    }

    fn word_chars(word: &str, x_start: f32, y: f32) -> Vec<PdfChar> {
        word.chars()
            .enumerate()
            .map(|(i, ch)| pc(ch, x_start + i as f32 * 6.0, y, 6.0))
            .collect()
    }

    #[test]
    fn reconstruct_lines_empty() {
        assert!(reconstruct_lines(&[]).is_empty());
    }

    fn text(line: &TextLine) -> String {
        line.chars.iter().map(|c| c.ch).collect()
    }

    #[test]
    fn wide_gap_splits_words() {
        let chars = vec![
            pc('H', 10.0, 100.0, 6.0),
            pc('i', 16.0, 100.0, 3.0),
            // Gap of 11 points (> 0.3 * avg_width)
            pc('W', 30.0, 100.0, 8.0),
        ];
        let lines = reconstruct_lines(&chars);
        assert_eq!(lines.len(), 1);
        let words: Vec<String> = split_runs(&lines[0]).into_iter().map(|r| r.text).collect();
        assert_eq!(words, vec!["Hi", "W"]);
    }

    #[test]
    fn reconstruct_lines_separates_by_y_top_down() {
        let mut chars = word_chars("second", 10.0, 130.0);
        chars.extend(word_chars("first", 10.0, 100.0));
        let lines = reconstruct_lines(&chars);
        assert_eq!(lines.len(), 2);
        assert_eq!(text(&lines[0]), "first");
        assert_eq!(text(&lines[1]), "second");
    }

    #[test]
    fn reconstruct_lines_separates_by_page() {
        let mut chars = vec![pc('A', 10.0, 100.0, 6.0)];
        chars.push(PdfChar { page: 2, ..pc('B', 10.0, 100.0, 6.0) });
        let lines = reconstruct_lines(&chars);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].page, 2);
    }

    #[test]
    fn ragged_glyph_bottoms_stay_on_one_line_in_x_order() {
        let chars = vec![
            PdfChar { height: 10.0, ..pc('a', 10.0, 102.0, 6.0) },
            PdfChar { height: 14.0, ..pc('g', 16.0, 102.0, 6.0) },
            PdfChar { height: 12.0, ..pc('h', 22.0, 100.0, 6.0) },
        ];
        let lines = reconstruct_lines(&chars);
        assert_eq!(lines.len(), 1);
        assert_eq!(text(&lines[0]), "agh");
    }

    #[test]
    fn split_runs_breaks_on_gaps_and_whitespace() {
        let mut chars = word_chars("Sample", 10.0, 100.0);
        chars.push(pc(' ', 46.0, 100.0, 3.0));
        chars.extend(word_chars("size=45", 49.0, 100.0));
        let lines = reconstruct_lines(&chars);
        let runs = split_runs(&lines[0]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Sample");
        assert_eq!(runs[1].text, "size=45");
        assert!((runs[0].x - 10.0).abs() < f32::EPSILON);
        assert!((runs[0].width - 36.0).abs() < 1e-3);
        assert!((runs[1].height - 12.0).abs() < 1e-3);
    }

    #[test]
    fn page_runs_are_in_reading_order() {
        let mut chars = word_chars("world", 60.0, 100.0);
        chars.extend(word_chars("below", 10.0, 130.0));
        chars.extend(word_chars("hello", 10.0, 100.0));
        let page = page_runs(1, &chars);
        let words: Vec<&str> = page.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(words, vec!["hello", "world", "below"]);
    }
}
