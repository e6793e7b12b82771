//! Application error types.
//!
//! Defines `AppError` enum for all error conditions of a stack-blame run.
//! Every variant except `BlameRetrieval` aborts the run; blame failures are
//! confined to the frame that triggered them (see `report::context`).
//!
//! - `InvalidInput` → input is neither a file nor a crash report id
//! - `RepoNotFound` → override or guessed checkout is missing `.hg`
//! - `BlameRetrieval` → `hg blame` failed or printed something unparseable
//! - `FrameParse` → a `#N` debugger line whose body could not be parsed
//! - `Http`, `Network` → crash report fetch or payload problems

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Blame failed for {file} @ {changeset}: {reason}")]
    BlameRetrieval {
        file: String,
        changeset: String,
        reason: String,
    },

    #[error("Could not parse stack frame {line:?}: {reason}")]
    FrameParse { line: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn blame(file: &str, changeset: &str, reason: impl Into<String>) -> Self {
        AppError::BlameRetrieval {
            file: file.to_string(),
            changeset: changeset.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
