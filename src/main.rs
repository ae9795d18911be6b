//! `citemap` CLI - extract PDF text layout and locate citations in it

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "citemap")]
#[command(about = "Map language-model citations back to highlight rectangles in a PDF")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ~/.config/citemap/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Compact human-readable summary
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text layout from a PDF and print or save the index as JSON
    Extract {
        /// PDF file
        input: PathBuf,

        /// Write the index to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show section spans of a document
    Sections {
        /// PDF file or saved index (.json)
        input: PathBuf,

        /// List table captions instead of sections
        #[arg(long)]
        tables: bool,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Map a character range to highlight rectangles
    Map {
        /// PDF file or saved index (.json)
        input: PathBuf,

        /// First character offset (inclusive)
        #[arg(long)]
        start: usize,

        /// Last character offset (exclusive)
        #[arg(long)]
        end: usize,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Locate cited text (exact match first, fuzzy fallback)
    Locate {
        /// PDF file or saved index (.json)
        input: PathBuf,

        /// Citation text; repeat for several citations
        #[arg(required = true)]
        citations: Vec<String>,

        /// Maximum fuzzy distance to accept (0 = exact, 1 = anything)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Only search methods, results, tables and figures
        #[arg(long)]
        primary_only: bool,

        /// List every fuzzy match instead of the best one
        #[arg(long)]
        all: bool,

        /// Cap on matches listed with --all
        #[arg(long)]
        max_results: Option<usize>,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = citemap::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { input, out } => {
            cmd::extract::cmd_extract(&input, out.as_deref(), &config)?;
        }
        Commands::Sections { input, tables, format } => {
            cmd::sections::cmd_sections(&input, tables, format, &config)?;
        }
        Commands::Map { input, start, end, format } => {
            cmd::map::cmd_map(&input, start, end, format, &config)?;
        }
        Commands::Locate {
            input,
            citations,
            threshold,
            primary_only,
            all,
            max_results,
            format,
        } => {
            let mut options = config.locate.clone();
            if let Some(t) = threshold {
                options.threshold = t;
            }
            if let Some(k) = max_results {
                options.max_results = k;
            }
            options.only_primary_sections |= primary_only;
            cmd::locate::cmd_locate(&input, &citations, all, &options, format, &config)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("citemap=debug"),
        _ => EnvFilter::new("citemap=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
