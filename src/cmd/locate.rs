use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use citemap::{find_all_fuzzy, find_smart_batch, Config, FuzzyMatchResult, LocateOptions, MatchMethod, SmartMatch};

use super::input::{highlight_line, load_index, print_json};
use crate::OutputFormat;

#[derive(Serialize)]
struct LocateReport<'a> {
    citation: &'a str,
    #[serde(flatten)]
    result: SmartMatch,
}

#[derive(Serialize)]
struct FuzzyReport<'a> {
    citation: &'a str,
    matches: Vec<FuzzyMatchResult>,
}

pub fn cmd_locate(
    input: &Path,
    citations: &[String],
    all: bool,
    options: &LocateOptions,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let index = load_index(input, config)?;

    if all {
        let reports: Vec<FuzzyReport<'_>> = citations
            .iter()
            .map(|c| FuzzyReport {
                citation: c,
                matches: find_all_fuzzy(c, &index.positions, options),
            })
            .collect();
        return match format {
            OutputFormat::Json => print_json(&reports),
            OutputFormat::Text => {
                reports.iter().for_each(print_fuzzy_report);
                Ok(())
            }
        };
    }

    let reports: Vec<LocateReport<'_>> = citations
        .iter()
        .zip(find_smart_batch(citations, &index.positions, options))
        .map(|(c, result)| LocateReport { citation: c, result })
        .collect();

    match format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Text => reports.iter().for_each(print_locate_report),
    }

    Ok(())
}

fn print_locate_report(report: &LocateReport<'_>) {
    let m = &report.result;
    match m.method {
        MatchMethod::None => println!("{:?}: not found", report.citation),
        MatchMethod::Exact | MatchMethod::Fuzzy => {
            let method = if m.method == MatchMethod::Exact { "exact" } else { "fuzzy" };
            let section = m.section.map_or("-", |s| s.as_str());
            println!(
                "{:?}: {method} (confidence {:.2}, section {section})",
                report.citation, m.confidence
            );
            for hl in &m.highlights {
                println!("  {}", highlight_line(hl));
            }
        }
    }
}

fn print_fuzzy_report(report: &FuzzyReport<'_>) {
    println!("{:?}: {} matches", report.citation, report.matches.len());
    for hit in &report.matches {
        println!("  score {:.3} p{} {:?}", hit.score, hit.highlight.page, hit.matched_text);
    }
}
