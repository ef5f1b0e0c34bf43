use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors fatal to a whole organize call. Per-file failures are reported in
/// the run's results instead.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("cannot read directory {}: {source}", .path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl OrganizeError {
    pub(crate) fn access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DirectoryAccess {
            path: path.into(),
            source,
        }
    }
}
