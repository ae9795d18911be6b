use std::path::Path;

use anyhow::{Context, Result};

use citemap::Config;

use super::input::{load_index, print_json};

pub fn cmd_extract(input: &Path, out: Option<&Path>, config: &Config) -> Result<()> {
    eprintln!("📄 Extracting: {}", input.display());
    let index = load_index(input, config)?;

    eprintln!(
        "   {} pages, {} runs, {} chars",
        index.page_count,
        index.positions.len(),
        index.char_len()
    );

    match out {
        Some(path) => {
            index
                .save_json(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("💾 Saved index to {}", path.display());
        }
        None => print_json(&index)?,
    }

    Ok(())
}
