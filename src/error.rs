use std::io;
use std::path::{Path, PathBuf};

use crate::hash::Sha;
use crate::object::ObjectError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] ObjectError),

    #[error("Object {0} does not exist")]
    NotFound(Sha),

    #[error("Object {sha} is corrupt: {reason}")]
    Corrupt { sha: Sha, reason: String },

    #[error("Not a gitrs repository (or any of the parent directories): {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error("Repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Expected a directory at {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Attaches the path an I/O operation was performed on.
pub(crate) trait IoContext<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| Error::io(path, e))
    }
}
