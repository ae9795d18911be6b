//! Shared types for layout extraction.
//!
//! Character and line types used by the pdfium reader and the pure line/run
//! reconstruction. Kept separate so reconstruction can be tested without
//! linking pdfium.

/// A positioned character extracted from a PDF page.
#[derive(Debug, Clone)]
pub struct PdfChar {
    pub ch: char,
    /// Left edge in PDF points (1pt = 1/72 inch).
    pub x: f32,
    /// Top edge, measured downward from the top of the page.
    pub y: f32,
    pub width: f32,
    /// Font size approximation (character height).
    pub height: f32,
    /// Page number (1-based).
    pub page: usize,
}

impl PdfChar {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Characters sharing one baseline, sorted left to right.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub chars: Vec<PdfChar>,
    pub page: usize,
}

/// A word-level fragment of one page, before document offsets are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RawRun {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }
}

/// All runs of a single page in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRuns {
    /// Page number (1-based).
    pub page: usize,
    pub runs: Vec<RawRun>,
}

impl PageRuns {
    pub fn new(page: usize, runs: Vec<RawRun>) -> Self {
        Self { page, runs }
    }
}
