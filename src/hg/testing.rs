//! In-memory `Vcs` for tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::hg::repository::Vcs;
use crate::models::BlameLine;

#[derive(Default)]
pub struct FakeVcs {
    files: HashMap<String, Vec<BlameLine>>,
    parent: Option<String>,
    blame_calls: Cell<usize>,
    parent_calls: Cell<usize>,
}

impl FakeVcs {
    /// A file of `len` lines; line N was committed N days after 2007-03-22.
    pub fn with_file(file: &str, len: usize) -> Self {
        let mut vcs = Self::default();
        vcs.add_file(file, len);
        vcs
    }

    pub fn add_file(&mut self, file: &str, len: usize) {
        let epoch = NaiveDate::from_ymd_opt(2007, 3, 22).unwrap_or_default();
        let lines = (1..=len)
            .map(|n| BlameLine {
                line_number: n,
                author_name: "jruderman".to_string(),
                revision_number: n.to_string(),
                changeset_id: format!("{:012x}", n),
                commit_date: epoch + chrono::Duration::days(n as i64),
                source_text: format!("line {} of {}", n, file),
            })
            .collect();
        self.files.insert(file.to_string(), lines);
    }

    pub fn with_parent(mut self, node: &str) -> Self {
        self.parent = Some(node.to_string());
        self
    }

    pub fn blame_calls(&self) -> usize {
        self.blame_calls.get()
    }

    pub fn parent_calls(&self) -> usize {
        self.parent_calls.get()
    }
}

impl Vcs for FakeVcs {
    fn blame(&self, _repo: &Path, file: &str, changeset: &str) -> Result<Vec<BlameLine>> {
        self.blame_calls.set(self.blame_calls.get() + 1);
        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| AppError::blame(file, changeset, "no such file"))
    }

    fn parent_revision(&self, repo: &Path) -> Result<String> {
        self.parent_calls.set(self.parent_calls.get() + 1);
        self.parent
            .clone()
            .ok_or_else(|| AppError::RepoNotFound(repo.display().to_string()))
    }
}
