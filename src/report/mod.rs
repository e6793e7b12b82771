//! Report assembly.
//!
//! - `freshness`: commit date → recency score, color, star bar
//! - `context`: frame header + blame context rendering
//! - `html`: escaping, links, document shell
//!
//! `Report` owns both projections (terminal text and HTML) and only ever
//! appends to them, in frame order.

pub mod context;
pub mod freshness;
pub mod html;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::models::{FrameFormat, StackFrame};

pub use context::{ContextRenderer, DEFAULT_CONTEXT_LINES};
pub use freshness::Freshness;

/// One rendered piece of the report in both projections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub text: String,
    pub html: String,
}

impl Section {
    pub fn append(&mut self, other: Section) {
        self.text.push_str(&other.text);
        self.html.push_str(&other.html);
    }

    pub fn thread_header(thread_index: u32, crashed: bool) -> Self {
        if crashed {
            Section {
                text: format!("\n\nThread {} (crashed)\n", thread_index),
                html: format!(
                    "\n\n<h2 class='crashedthread'>Thread {} (crashed)</h2>",
                    thread_index
                ),
            }
        } else {
            Section {
                text: format!("\n\nThread {}\n", thread_index),
                html: format!("\n\n<h2 class='otherthread'>Thread {}</h2>", thread_index),
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Report {
    heading: Option<String>,
    sections: Vec<Section>,
}

impl Report {
    /// `heading` is raw HTML placed above the body.
    pub fn new(heading: Option<String>) -> Self {
        Self {
            heading,
            sections: Vec::new(),
        }
    }

    pub fn push(&mut self, section: Section) -> &Section {
        self.sections.push(section);
        &self.sections[self.sections.len() - 1]
    }

    pub fn text(&self) -> String {
        self.sections.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn to_html(&self) -> String {
        let body: String = self.sections.iter().map(|s| s.html.as_str()).collect();
        html::render_document(self.heading.as_deref(), &body)
    }

    /// Write the HTML document; the file is flushed and closed before returning.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(self.to_html().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Render every frame into `report`, echoing each section's text to
/// `transcript` as soon as it is produced.
///
/// Stackwalk frames get a thread header whenever the thread changes; the
/// first thread seen is the crashed one.
pub fn assemble(
    frames: &[StackFrame],
    renderer: &mut ContextRenderer<'_>,
    report: &mut Report,
    transcript: &mut dyn Write,
) -> Result<()> {
    let mut last_thread: Option<u32> = None;

    for frame in frames {
        if frame.format == FrameFormat::Stackwalk && last_thread != Some(frame.thread_index) {
            let header = Section::thread_header(frame.thread_index, last_thread.is_none());
            last_thread = Some(frame.thread_index);
            transcript.write_all(report.push(header).text.as_bytes())?;
        }

        let section = renderer.render_frame(frame)?;
        transcript.write_all(report.push(section).text.as_bytes())?;
        transcript.flush()?;
    }

    let stats = renderer.blame_source().cache_stats();
    tracing::debug!(
        "blame cache: {} files, {} hits, {} misses",
        stats.cached_files,
        stats.hits,
        stats.misses
    );

    Ok(())
}
