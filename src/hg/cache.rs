//! Blame cache for repeated frames.
//!
//! Several frames of one stack often point into the same file at the same
//! changeset. Blame output is cached per `(changeset, file)` so each pair is
//! fetched from `hg` at most once per run.
//!
//! Eviction: none. The cache lives exactly as long as the run.
//!
//! Used by: `BlameSource::get_blame()` in blame.rs

use std::collections::HashMap;
use std::rc::Rc;

use crate::models::{BlameKey, BlameLine};

/// Storage seam for blame sequences; swap in a bounded implementation
/// without touching `BlameSource`.
pub trait BlameCache {
    fn lookup(&mut self, key: &BlameKey) -> Option<Rc<Vec<BlameLine>>>;
    fn store(&mut self, key: BlameKey, lines: Rc<Vec<BlameLine>>);
    fn stats(&self) -> CacheStats;
}

/// Unbounded, run-scoped cache.
#[derive(Debug, Default)]
pub struct RunCache {
    entries: HashMap<BlameKey, Rc<Vec<BlameLine>>>,
    hits: usize,
    misses: usize,
}

impl BlameCache for RunCache {
    fn lookup(&mut self, key: &BlameKey) -> Option<Rc<Vec<BlameLine>>> {
        match self.entries.get(key) {
            Some(lines) => {
                self.hits += 1;
                Some(Rc::clone(lines))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn store(&mut self, key: BlameKey, lines: Rc<Vec<BlameLine>>) {
        self.entries.insert(key, lines);
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            cached_files: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached_files: usize,
    pub hits: usize,
    pub misses: usize,
}
