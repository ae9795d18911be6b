//! `citemap` - map language-model citations back to PDF page rectangles
//!
//! # Features
//!
//! - **Text layout**: per-character PDF extraction, word runs with page
//!   coordinates and document-wide character offsets (`pdf` feature)
//! - **Sections**: heuristic labelling of runs as methods, results, tables…
//! - **Highlights**: character range → one rectangle per touched run
//! - **Citation lookup**: exact, fuzzy (normalized Levenshtein over run
//!   blocks) and the exact-then-fuzzy "smart" strategy
//!
//! # Example
//!
//! ```rust
//! use citemap::{find_smart, IndexBuilder, LocateOptions, MatchMethod, PageRuns, RawRun};
//!
//! let index = IndexBuilder::new()
//!     .page(PageRuns::new(1, vec![
//!         RawRun::new("Sample", 72.0, 100.0, 36.0, 12.0),
//!         RawRun::new("size=45", 112.0, 100.0, 42.0, 12.0),
//!     ]))
//!     .build()?;
//!
//! let hit = find_smart("sample size=45", &index.positions, &LocateOptions::default());
//! assert_eq!(hit.method, MatchMethod::Fuzzy);
//! assert_eq!(hit.highlights.len(), 2);
//! # Ok::<(), citemap::CiteError>(())
//! ```

pub mod blocks;
pub mod config;
pub mod error;
pub mod highlight;
pub mod layout;
pub mod locate;
pub mod section;

pub use blocks::{build_blocks, TextBlock};
pub use config::{load_config, Config};
pub use error::{CiteError, Result};
pub use highlight::{map_range, Highlight};
pub use layout::{DocumentTextIndex, IndexBuilder, PageRuns, PositionedTextRun, RawRun};
pub use locate::{
    find_all_fuzzy, find_exact, find_fuzzy, find_smart, find_smart_batch, FuzzyMatchResult, LocateOptions,
    MatchMethod, SmartMatch,
};
pub use section::{classify, section_spans, table_captions, ClassifierConfig, Section, SectionSpan, TableCaption};

#[cfg(feature = "pdf")]
pub use layout::pdf::{extract_bytes, extract_file};

/// Version of citemap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
