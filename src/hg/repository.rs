//! Mercurial checkout access.
//!
//! `Vcs` is the narrow seam between the tool and the revision-control
//! system: per-line blame at a changeset, and the working copy's parent
//! revision. `HgCli` implements it by shelling out to `hg`; tests swap in a
//! fake returning canned lines.
//!
//! `RepoLocator` decides which local checkout a frame is blamed against.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::process::Command;

use crate::error::{AppError, Result};
use crate::hg::blame::parse_blame_output;
use crate::models::BlameLine;

/// Number of hex digits kept from a full changeset hash.
pub const SHORT_HASH_LEN: usize = 12;

pub trait Vcs {
    /// Per-line blame of `file` (relative to `repo`) at `changeset`, in file order.
    fn blame(&self, repo: &Path, file: &str, changeset: &str) -> Result<Vec<BlameLine>>;

    /// Short hash of the first parent of the working copy in `repo`.
    fn parent_revision(&self, repo: &Path) -> Result<String>;
}

/// `Vcs` backed by the `hg` command line client.
pub struct HgCli {
    program: String,
}

impl Default for HgCli {
    fn default() -> Self {
        Self {
            program: "hg".to_string(),
        }
    }
}

impl HgCli {
    /// Run `hg -R <repo> <args>` and return stdout untouched.
    fn hg_at(&self, repo: &Path, args: &[&str]) -> std::result::Result<String, String> {
        tracing::debug!("{} -R {} {}", self.program, repo.display(), args.join(" "));

        let output = Command::new(&self.program)
            .arg("-R")
            .arg(repo)
            .args(args)
            .output()
            .map_err(|e| format!("failed to invoke {}: {}", self.program, e))?;

        if !output.status.success() {
            return Err(format!(
                "{} {:?} failed: {}",
                self.program,
                args,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Vcs for HgCli {
    fn blame(&self, repo: &Path, file: &str, changeset: &str) -> Result<Vec<BlameLine>> {
        let full_path = repo.join(file);
        let full_path = full_path.to_string_lossy();
        let raw = self
            .hg_at(
                repo,
                &["blame", "-c", "-d", "-q", "-u", "-n", "-r", changeset, &full_path],
            )
            .map_err(|reason| AppError::blame(file, changeset, reason))?;

        parse_blame_output(file, changeset, &raw)
    }

    fn parent_revision(&self, repo: &Path) -> Result<String> {
        let node = self
            .hg_at(
                repo,
                &["log", "--template", "{node}", "-r", "first(parents(.))"],
            )
            .map_err(|reason| AppError::RepoNotFound(format!("{} ({})", repo.display(), reason)))?;

        let node = node.trim();
        if node.is_empty() {
            return Err(AppError::RepoNotFound(format!(
                "{} has no working copy parent",
                repo.display()
            )));
        }
        Ok(node.chars().take(SHORT_HASH_LEN).collect())
    }
}

/// Validate a `--repository` argument: it must be an existing directory.
/// The returned path always ends with a separator.
pub fn normalize_repository_dir(dir: &str) -> Result<PathBuf> {
    if !Path::new(dir).is_dir() {
        return Err(AppError::RepoNotFound(format!(
            "{} is not a directory",
            dir
        )));
    }

    if dir.ends_with('/') || dir.ends_with('\\') {
        Ok(PathBuf::from(dir))
    } else {
        Ok(PathBuf::from(format!("{}{}", dir, MAIN_SEPARATOR)))
    }
}

/// Picks the local checkout for a frame.
///
/// Precedence: the checkout named by the frame itself (debugger dumps),
/// then the `--repository` override, then `~/<official-name>/`.
#[derive(Debug, Clone)]
pub struct RepoLocator {
    override_dir: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl RepoLocator {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self::with_home(override_dir, dirs::home_dir())
    }

    pub fn with_home(override_dir: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        Self { override_dir, home }
    }

    pub fn resolve(&self, frame_repo: Option<&Path>, repository_name: &str) -> Result<PathBuf> {
        if let Some(repo) = frame_repo {
            return Ok(repo.to_path_buf());
        }
        if let Some(dir) = &self.override_dir {
            return Ok(dir.clone());
        }
        self.guess(repository_name)
    }

    fn guess(&self, repository_name: &str) -> Result<PathBuf> {
        let home = self.home.as_ref().ok_or_else(|| {
            AppError::RepoNotFound(format!(
                "no --repository given and no home directory to look for {}",
                repository_name
            ))
        })?;

        let guess = home.join(repository_name);
        if guess.join(".hg").exists() {
            return Ok(guess);
        }

        Err(AppError::RepoNotFound(format!(
            "repository not specified, and my guess of {}{} isn't a local repo",
            guess.display(),
            MAIN_SEPARATOR
        )))
    }
}
