//! Blame retrieval: parses `hg blame -c -d -q -u -n` output and memoizes it
//! per `(changeset, file)`.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::hg::cache::{BlameCache, CacheStats, RunCache};
use crate::hg::repository::{RepoLocator, Vcs};
use crate::models::{BlameKey, BlameLine, BlameTarget};

/// Parse raw `hg blame -c -d -q -u -n` output, e.g.
///
/// ```text
///    arpad 24551 a206aff7a9c6 2009-02-03: #include "nsTArray.h"
/// ```
///
/// User and revision are space-padded; the code keeps its own indentation.
pub fn parse_blame_output(file: &str, changeset: &str, raw: &str) -> Result<Vec<BlameLine>> {
    raw.lines()
        .enumerate()
        .map(|(idx, line)| {
            parse_blame_line(idx + 1, line).ok_or_else(|| {
                AppError::blame(file, changeset, format!("unparseable blame line {}: {:?}", idx + 1, line))
            })
        })
        .collect()
}

fn parse_blame_line(line_number: usize, line: &str) -> Option<BlameLine> {
    let mut rest = line.trim_start();
    let mut fields = [""; 3];
    for field in &mut fields {
        let end = rest.find(char::is_whitespace)?;
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }

    let commit_date = NaiveDate::parse_from_str(rest.get(..10)?, "%Y-%m-%d").ok()?;
    if rest.get(10..11)? != ":" {
        return None;
    }
    let source_text = rest.get(12..).unwrap_or("");

    let [author_name, revision_number, changeset_id] = fields;
    Some(BlameLine {
        line_number,
        author_name: author_name.to_string(),
        revision_number: revision_number.to_string(),
        changeset_id: changeset_id.to_string(),
        commit_date,
        source_text: source_text.to_string(),
    })
}

/// Cached blame adapter over a `Vcs`.
pub struct BlameSource<'a> {
    vcs: &'a dyn Vcs,
    locator: RepoLocator,
    cache: Box<dyn BlameCache + 'a>,
    failures: HashMap<BlameKey, String>,
}

impl<'a> BlameSource<'a> {
    pub fn new(vcs: &'a dyn Vcs, locator: RepoLocator) -> Self {
        Self::with_cache(vcs, locator, Box::new(RunCache::default()))
    }

    pub fn with_cache(vcs: &'a dyn Vcs, locator: RepoLocator, cache: Box<dyn BlameCache + 'a>) -> Self {
        Self {
            vcs,
            locator,
            cache,
            failures: HashMap::new(),
        }
    }

    /// Blame for the target's file at the target's changeset.
    ///
    /// A pair that failed once fails again from memory instead of re-running hg.
    pub fn get_blame(&mut self, target: &BlameTarget<'_>) -> Result<Rc<Vec<BlameLine>>> {
        let key = BlameKey::new(target.changeset_id, target.source_file);

        if let Some(lines) = self.cache.lookup(&key) {
            tracing::debug!("blame cache hit: {} @ {}", key.file_path, key.changeset_id);
            return Ok(lines);
        }
        if let Some(reason) = self.failures.get(&key) {
            return Err(AppError::blame(target.source_file, target.changeset_id, reason.clone()));
        }

        let repo = self
            .locator
            .resolve(target.local_repo_path, target.repository_name)?;

        match self.vcs.blame(&repo, target.source_file, target.changeset_id) {
            Ok(lines) => {
                let lines = Rc::new(lines);
                self.cache.store(key, Rc::clone(&lines));
                Ok(lines)
            }
            Err(AppError::BlameRetrieval { reason, .. }) => {
                self.failures.insert(key, reason.clone());
                Err(AppError::blame(target.source_file, target.changeset_id, reason))
            }
            Err(e) => Err(e),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hg::testing::FakeVcs;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const RAW: &str = "   arpad 24551 a206aff7a9c6 2009-02-03: #include \"nsTArray.h\"\n\
                       jruderman 100001 0123456789ab 2012-07-30:     return true;\n\
                       \x20 bz  7 fedcba987654 2007-03-22: \n";

    #[test]
    fn parses_padded_fields_and_keeps_indentation() {
        let lines = parse_blame_output("a.cpp", "tip", RAW).unwrap();
        assert_eq!(lines.len(), 3);

        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[0].author_name, "arpad");
        assert_eq!(lines[0].revision_number, "24551");
        assert_eq!(lines[0].changeset_id, "a206aff7a9c6");
        assert_eq!(lines[0].commit_date, NaiveDate::from_ymd_opt(2009, 2, 3).unwrap());
        assert_eq!(lines[0].source_text, "#include \"nsTArray.h\"");

        assert_eq!(lines[1].source_text, "    return true;");
        assert_eq!(lines[2].source_text, "");
        assert_eq!(lines[2].line_number, 3);
    }

    #[test]
    fn garbage_is_a_blame_error() {
        let err = parse_blame_output("a.cpp", "tip", "abort: no such file\n").unwrap_err();
        assert!(matches!(err, AppError::BlameRetrieval { .. }));

        let err = parse_blame_output("a.cpp", "tip", "u 1 abc 2009-13-45: x\n").unwrap_err();
        assert!(matches!(err, AppError::BlameRetrieval { .. }));
    }

    fn target<'a>(file: &'a str, changeset: &'a str) -> BlameTarget<'a> {
        BlameTarget {
            repository_name: "mozilla-central",
            source_file: file,
            line_number: 1,
            changeset_id: changeset,
            local_repo_path: None,
        }
    }

    #[test]
    fn same_pair_is_fetched_once() {
        let vcs = FakeVcs::with_file("a.cpp", 20);
        let locator = RepoLocator::with_home(Some(PathBuf::from("/repo/")), None);
        let mut source = BlameSource::new(&vcs, locator);

        source.get_blame(&target("a.cpp", "aaaaaaaaaaaa")).unwrap();
        source.get_blame(&target("a.cpp", "aaaaaaaaaaaa")).unwrap();
        assert_eq!(vcs.blame_calls(), 1);

        source.get_blame(&target("a.cpp", "bbbbbbbbbbbb")).unwrap();
        assert_eq!(vcs.blame_calls(), 2);
        assert_eq!(source.cache_stats().hits, 1);
    }

    #[test]
    fn failures_are_remembered() {
        let vcs = FakeVcs::default();
        let locator = RepoLocator::with_home(Some(PathBuf::from("/repo/")), None);
        let mut source = BlameSource::new(&vcs, locator);

        assert!(source.get_blame(&target("missing.cpp", "aaaaaaaaaaaa")).is_err());
        assert!(source.get_blame(&target("missing.cpp", "aaaaaaaaaaaa")).is_err());
        assert_eq!(vcs.blame_calls(), 1);
    }

    #[test]
    fn unknown_checkout_is_fatal() {
        let vcs = FakeVcs::with_file("a.cpp", 5);
        let mut source = BlameSource::new(&vcs, RepoLocator::with_home(None, None));

        let err = source.get_blame(&target("a.cpp", "aaaaaaaaaaaa")).unwrap_err();
        assert!(matches!(err, AppError::RepoNotFound(_)));
        assert_eq!(vcs.blame_calls(), 0);
    }
}
