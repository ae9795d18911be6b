use std::path::Path;

use anyhow::{Context, Result};

use citemap::{map_range, Config};

use super::input::{highlight_line, load_index, print_json};
use crate::OutputFormat;

pub fn cmd_map(input: &Path, start: usize, end: usize, format: OutputFormat, config: &Config) -> Result<()> {
    let index = load_index(input, config)?;
    let highlights = map_range(&index, start, end).with_context(|| format!("cannot map {start}..{end}"))?;

    match format {
        OutputFormat::Json => print_json(&highlights)?,
        OutputFormat::Text => {
            for hl in &highlights {
                println!("{}", highlight_line(hl));
            }
            if highlights.is_empty() {
                println!("(no runs in {start}..{end})");
            }
        }
    }

    Ok(())
}
