//! Where the stack dump comes from: a local file or a crash report id.

pub mod crash_stats;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};

pub use crash_stats::CrashStatsClient;

static CRASH_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:bp-)?([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})")
        .expect("valid crash id regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    LocalFile(PathBuf),
    /// Lowercased UUID without the `bp-` prefix
    CrashReport(String),
}

impl InputSource {
    /// An existing path wins over anything that merely looks like a crash id.
    pub fn detect(input: &str) -> Result<Self> {
        let path = Path::new(input);
        if path.exists() {
            return Ok(InputSource::LocalFile(path.to_path_buf()));
        }

        match CRASH_ID.captures(input) {
            Some(caps) => Ok(InputSource::CrashReport(caps[1].to_ascii_lowercase())),
            None => Err(AppError::InvalidInput(format!(
                "{} is neither a local file nor a crash report ID from {}",
                input,
                crash_stats::CRASH_STATS_HOST
            ))),
        }
    }

    /// `<stem>.html` next to the working directory, or `<crash-id>.html`.
    pub fn output_file_name(&self) -> PathBuf {
        match self {
            InputSource::LocalFile(path) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "stackblame".to_string());
                let is_html = path
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case("html"));
                if is_html {
                    PathBuf::from(format!("{}.blame.html", stem))
                } else {
                    PathBuf::from(format!("{}.html", stem))
                }
            }
            InputSource::CrashReport(id) => PathBuf::from(format!("{}.html", id)),
        }
    }
}

/// The raw dump plus an optional HTML heading for the report.
#[derive(Debug, Clone)]
pub struct StackDump {
    pub text: String,
    pub heading: Option<String>,
}

pub fn load(source: &InputSource) -> Result<StackDump> {
    match source {
        InputSource::LocalFile(path) => Ok(StackDump {
            text: std::fs::read_to_string(path)?,
            heading: None,
        }),
        InputSource::CrashReport(id) => {
            println!("Fetching crash report {}", id);
            let client = CrashStatsClient::new()?;
            Ok(StackDump {
                text: client.fetch_dump(id)?,
                heading: Some(client.report_heading(id)),
            })
        }
    }
}
