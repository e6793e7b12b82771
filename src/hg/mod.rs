pub mod blame;
pub mod cache;
pub mod repository;

#[cfg(test)]
pub mod testing;

pub use blame::BlameSource;
pub use repository::{normalize_repository_dir, HgCli, RepoLocator, Vcs};
