//! Text-layout extraction: PDF → concatenated text + positioned runs.
//!
//! | Module | Role | Feature Flag |
//! |--------|------|-------------|
//! | [`types`] | chars, lines, page-local runs | always |
//! | [`lines`] | char → line → word-run geometry | always |
//! | [`index`] | [`DocumentTextIndex`] and offset assembly | always |
//! | `pdf` | pdfium binding | `pdf` |

pub mod index;
pub mod lines;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod types;

pub use index::{DocumentTextIndex, IndexBuilder, PositionedTextRun};
pub use types::{PageRuns, RawRun};
