//! Blame records.
//!
//! Provides per-line author attribution for file content at a pinned
//! changeset, as printed by `hg blame -c -d -q -u -n`.

use chrono::NaiveDate;

/// Blame information for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameLine {
    /// Line number (1-indexed)
    pub line_number: usize,
    /// Short user name of the author who last modified this line
    pub author_name: String,
    /// Local revision number of the changeset that introduced the line
    pub revision_number: String,
    /// Short changeset hash that introduced the line
    pub changeset_id: String,
    /// Day the line was committed
    pub commit_date: NaiveDate,
    /// Line content with its original indentation
    pub source_text: String,
}

/// Cache key for a blame sequence: one `hg blame` run per pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlameKey {
    pub changeset_id: String,
    pub file_path: String,
}

impl BlameKey {
    pub fn new(changeset_id: &str, file_path: &str) -> Self {
        Self {
            changeset_id: changeset_id.to_string(),
            file_path: file_path.to_string(),
        }
    }
}
