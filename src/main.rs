//! Stack Blame - hg blame for every frame of a crash stack
//!
//! # Usage
//! ```bash
//! stack-blame bp-1234abcd-56ef-78ab-90cd-1234567890ab   # Fetch from crash-stats
//! stack-blame stackwalk.txt                             # `minidump_stackwalk -m` output
//! stack-blame gdb-bt.txt -c 10                          # gdb `bt` output, more context
//! stack-blame crash.txt --allthreads -R ~/src/m-c       # All threads, explicit checkout
//! ```
//!
//! Prints a transcript while it works and writes an HTML report with lines
//! shaded by how recently they were committed.

mod error;
mod hg;
mod input;
mod models;
mod report;
mod stack;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hg::{normalize_repository_dir, BlameSource, HgCli, RepoLocator};
use input::InputSource;
use report::{ContextRenderer, Freshness, Report, DEFAULT_CONTEXT_LINES};
use stack::{ParseOptions, StackParser};

/// Show hg blame for each line of a stack trace, along with nearby lines.
#[derive(Parser)]
#[command(name = "stack-blame")]
#[command(about = "Show hg blame for each line of a stack trace, along with nearby lines", long_about = None)]
struct Cli {
    /// Show all threads (default: only the crashing thread)
    #[arg(short, long)]
    allthreads: bool,

    /// Lines of context above and below each frame's line
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_CONTEXT_LINES)]
    context: usize,

    /// Local repository (default: guess ~/<repo-name>/ from the stack)
    #[arg(short = 'R', long, value_name = "DIR")]
    repository: Option<String>,

    /// Where to write the HTML report (default: derived from the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Crash report ID, file containing `minidump_stackwalk -m` output, or file containing gdb `bt` output
    #[arg(value_name = "INPUT")]
    input: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the transcript
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let repository = cli
        .repository
        .as_deref()
        .map(normalize_repository_dir)
        .transpose()?;

    let source = InputSource::detect(&cli.input)?;
    let dump = input::load(&source)?;

    let vcs = HgCli::default();
    let frames = StackParser::new(
        &vcs,
        ParseOptions {
            all_threads: cli.allthreads,
        },
    )
    .parse(&dump.text)?;
    tracing::debug!("parsed {} frames", frames.len());

    let blame = BlameSource::new(&vcs, RepoLocator::new(repository));
    let mut renderer = ContextRenderer::new(blame, Freshness::today(), cli.context);
    let mut report = Report::new(dump.heading);

    let stdout = std::io::stdout();
    let mut transcript = stdout.lock();
    report::assemble(&frames, &mut renderer, &mut report, &mut transcript)?;

    let output = cli.output.unwrap_or_else(|| source.output_file_name());
    report.write_to(&output)?;

    writeln!(transcript)?;
    writeln!(transcript, "Created {}", output.display())?;

    Ok(())
}
