use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, IoContext, Result};
use crate::ignore::IgnoreSet;
use crate::store::ObjectStore;

/// Name of the metadata directory at the root of every worktree.
pub const GITDIR: &str = ".gitrs";

const DEFAULT_HEAD: &[u8] = b"ref: refs/heads/master\n";
const DEFAULT_CONFIG: &[u8] =
    b"[core]\nrepositoryformatversion = 0\nfilemode = false\nbare = false\n";

/// A discovered repository. This is the context value handed to every operation that touches
/// the object store, so nothing depends on the process working directory after discovery.
pub struct Repository {
    pub worktree: PathBuf,
    pub gitdir: PathBuf,
    store: ObjectStore,
}

impl Repository {
    fn open(worktree: PathBuf) -> Self {
        let gitdir = worktree.join(GITDIR);
        let store = ObjectStore::new(gitdir.join("objects"));
        Self {
            worktree,
            gitdir,
            store,
        }
    }

    /// Creates an empty repository rooted at `worktree`, creating the worktree itself if needed.
    pub fn init(worktree: &Path) -> Result<Self> {
        if worktree.exists() && !worktree.is_dir() {
            return Err(Error::NotADirectory(worktree.to_path_buf()));
        }
        fs::create_dir_all(worktree).at(worktree)?;
        let worktree = fs::canonicalize(worktree).at(worktree)?;

        let repository = Self::open(worktree);
        let gitdir = &repository.gitdir;
        if gitdir.exists() {
            if !gitdir.is_dir() {
                return Err(Error::NotADirectory(gitdir.clone()));
            }
            if !is_empty_dir(gitdir)? {
                return Err(Error::AlreadyInitialized(gitdir.clone()));
            }
        }

        repository.repo_dir(&["objects"])?;
        repository.repo_dir(&["refs", "heads"])?;
        repository.repo_dir(&["refs", "tags"])?;

        repository.write_repo_file(&["HEAD"], DEFAULT_HEAD)?;
        repository.write_repo_file(&["config"], DEFAULT_CONFIG)?;

        info!("Initialized repository in {}", repository.gitdir.display());
        Ok(repository)
    }

    /// Walks from `start` towards the filesystem root looking for a directory that directly
    /// contains a metadata directory. Stops after checking the root.
    pub fn find(start: &Path) -> Result<Self> {
        let start = fs::canonicalize(start).at(start)?;

        let mut current = Some(start.as_path());
        while let Some(dir) = current {
            if dir.join(GITDIR).is_dir() {
                debug!("Found repository at {}", dir.display());
                return Ok(Self::open(dir.to_path_buf()));
            }
            current = dir.parent();
        }

        Err(Error::RepositoryNotFound(start))
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// The paths `write-tree` skips: just the metadata directory.
    pub fn default_ignores(&self) -> IgnoreSet {
        let mut ignores = IgnoreSet::new();
        ignores.insert(self.gitdir.clone());
        ignores
    }

    // Computes the path under a repository's gitrs directory
    fn repo_path(&self, paths: &[&str]) -> PathBuf {
        paths.iter().fold(self.gitdir.clone(), |mut acc, path| {
            acc.push(path);
            acc
        })
    }

    // Same as repo_path, but creates the directory if it doesn't exist
    fn repo_dir(&self, paths: &[&str]) -> Result<PathBuf> {
        let path = self.repo_path(paths);
        if path.exists() {
            if !path.is_dir() {
                return Err(Error::NotADirectory(path));
            }
        } else {
            fs::create_dir_all(&path).at(&path)?;
        }
        Ok(path)
    }

    fn write_repo_file(&self, paths: &[&str], content: &[u8]) -> Result<()> {
        if let Some((_, parents)) = paths.split_last() {
            self.repo_dir(parents)?;
        }
        let path = self.repo_path(paths);
        fs::write(&path, content).at(&path)
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).at(path)?;
    Ok(entries.next().is_none())
}
