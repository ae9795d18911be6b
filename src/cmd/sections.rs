use std::path::Path;

use anyhow::Result;

use citemap::{section_spans, table_captions, Config};

use super::input::{load_index, print_json};
use crate::OutputFormat;

pub fn cmd_sections(input: &Path, tables: bool, format: OutputFormat, config: &Config) -> Result<()> {
    let index = load_index(input, config)?;

    if tables {
        let captions = table_captions(&index.positions);
        return match format {
            OutputFormat::Json => print_json(&captions),
            OutputFormat::Text => {
                for caption in &captions {
                    println!("p{} [{}..{}] {}", caption.page, caption.start_char, caption.end_char, caption.text);
                }
                println!("\n({} tables)", captions.len());
                Ok(())
            }
        };
    }

    let spans = section_spans(&index.positions);
    match format {
        OutputFormat::Json => print_json(&spans)?,
        OutputFormat::Text => {
            for span in &spans {
                let pages = if span.start_page == span.end_page {
                    format!("p{}", span.start_page)
                } else {
                    format!("p{}-{}", span.start_page, span.end_page)
                };
                println!(
                    "{:<13} {:>7}..{:<7} {pages:<8} ({} runs)",
                    span.section.as_str(),
                    span.start_char,
                    span.end_char,
                    span.run_count
                );
            }
        }
    }

    Ok(())
}
