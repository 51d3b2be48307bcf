// Snapshots a directory into blob and tree objects

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, IoContext, Result};
use crate::hash::Sha;
use crate::ignore::IgnoreSet;
use crate::object::{Blob, FileMode, Object, Tree, TreeEntry};
use crate::store::ObjectStore;

// A directory whose children are still being stored.
struct PendingDir {
    path: PathBuf,
    name: String,
    children: std::vec::IntoIter<PathBuf>,
    entries: Vec<TreeEntry>,
}

impl PendingDir {
    fn open(path: PathBuf, name: String, ignore: &IgnoreSet) -> Result<Self> {
        let mut children = Vec::new();
        for dir_entry in fs::read_dir(&path).at(&path)? {
            let child = dir_entry.at(&path)?.path();
            if ignore.contains(&child) {
                debug!("Ignoring {}", child.display());
                continue;
            }
            children.push(child);
        }
        children.sort();

        Ok(Self {
            path,
            name,
            children: children.into_iter(),
            entries: Vec::new(),
        })
    }

    // Sorts and stores the tree, returning the entry that refers to it from the parent
    fn finish(self, store: &ObjectStore) -> Result<(TreeEntry, Sha)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        let tree = Tree::new(entries);
        debug_assert!(tree.is_sorted());
        let sha = store.write(&tree)?;
        debug!("Stored tree {} for {}", sha, self.path.display());

        let entry = TreeEntry::builder()
            .mode(FileMode::Directory)
            .name(self.name)
            .sha(sha.clone())
            .size(tree.size)
            .build();
        Ok((entry, sha))
    }
}

/// Stores every file under `root` (minus anything in `ignore`) and returns the digest of the
/// tree describing `root`.
///
/// Entries are sorted by name before a tree is serialized, so an unchanged directory always
/// yields the same digest. The first failure aborts the build: no tree is stored for the
/// failing directory or any of its ancestors, though blobs already stored stay in place.
pub fn build(store: &ObjectStore, root: &Path, ignore: &IgnoreSet) -> Result<Sha> {
    debug!(
        "Building tree for {}, ignoring {:?}",
        root.display(),
        ignore.iter().collect::<Vec<_>>()
    );
    let mut ancestors: Vec<PendingDir> = Vec::new();
    let mut current = PendingDir::open(root.to_path_buf(), String::new(), ignore)?;

    loop {
        match current.children.next() {
            Some(child) => {
                let name = entry_name(&child)?;
                let file_type = fs::symlink_metadata(&child).at(&child)?.file_type();

                if file_type.is_dir() {
                    let pending = PendingDir::open(child, name, ignore)?;
                    ancestors.push(std::mem::replace(&mut current, pending));
                } else if file_type.is_symlink() {
                    let entry = store_symlink(store, &child, name)?;
                    current.entries.push(entry);
                } else if file_type.is_file() {
                    let entry = store_file(store, &child, name)?;
                    current.entries.push(entry);
                } else {
                    warn!(
                        "Skipping {}: not a regular file, directory or symlink",
                        child.display()
                    );
                }
            }
            None => {
                let (entry, sha) = current.finish(store)?;
                match ancestors.pop() {
                    Some(parent) => {
                        current = parent;
                        current.entries.push(entry);
                    }
                    None => return Ok(sha),
                }
            }
        }
    }
}

fn store_file(store: &ObjectStore, path: &Path, name: String) -> Result<TreeEntry> {
    let blob = Blob::new(fs::read(path).at(path)?);
    let sha = store.write(&blob)?;
    debug!("Stored blob {} for {}", sha, path.display());

    Ok(TreeEntry::builder()
        .mode(FileMode::Regular)
        .name(name)
        .sha(sha)
        .size(blob.size() as u64)
        .build())
}

// The blob holds the link target itself, never the bytes of the file it points to
fn store_symlink(store: &ObjectStore, path: &Path, name: String) -> Result<TreeEntry> {
    // Dangling links abort the build
    fs::metadata(path).at(path)?;

    let target = fs::read_link(path).at(path)?;
    let blob = Blob::new(os_bytes(target));
    let sha = store.write(&blob)?;
    debug!("Stored symlink {} for {}", sha, path.display());

    Ok(TreeEntry::builder()
        .mode(FileMode::Symlink)
        .name(name)
        .sha(sha)
        .size(blob.size() as u64)
        .build())
}

fn entry_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::io(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
            )
        })
}

#[cfg(unix)]
fn os_bytes(path: PathBuf) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    path.into_os_string().into_vec()
}

#[cfg(not(unix))]
fn os_bytes(path: PathBuf) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        worktree: PathBuf,
        store: ObjectStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let worktree = dir.path().join("work");
        fs::create_dir(&worktree).unwrap();
        let store = ObjectStore::new(dir.path().join("objects"));
        Fixture {
            _dir: dir,
            worktree,
            store,
        }
    }

    fn names(tree: &Tree) -> Vec<&str> {
        tree.records.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn builds_nested_directories() {
        let fx = fixture();
        fs::write(fx.worktree.join("a.txt"), b"alpha").unwrap();
        fs::create_dir(fx.worktree.join("sub")).unwrap();
        fs::write(fx.worktree.join("sub/b.txt"), b"bravo!").unwrap();

        let sha = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        let root = fx.store.read_tree(&sha).unwrap();

        assert_eq!(names(&root), ["a.txt", "sub"]);
        assert_eq!(root.records[0].mode, FileMode::Regular);
        assert_eq!(
            root.records[0].sha,
            hash::digest(&Blob::new(b"alpha".to_vec()).serialize())
        );
        assert_eq!(root.records[1].mode, FileMode::Directory);
        assert_eq!(root.size, 11);

        let sub = fx.store.read_tree(&root.records[1].sha).unwrap();
        assert_eq!(names(&sub), ["b.txt"]);
        assert_eq!(sub.size, 6);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let fx = fixture();
        fs::write(fx.worktree.join("one"), b"1").unwrap();
        fs::create_dir_all(fx.worktree.join("x/y")).unwrap();
        fs::write(fx.worktree.join("x/y/two"), b"2").unwrap();

        let first = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        let second = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn entries_sorted_bytewise() {
        let fx = fixture();
        for name in ["b", "a", "C", "_", "aa"] {
            fs::write(fx.worktree.join(name), name).unwrap();
        }

        let sha = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        let tree = fx.store.read_tree(&sha).unwrap();
        assert_eq!(names(&tree), ["C", "_", "a", "aa", "b"]);
        assert!(tree.is_sorted());
    }

    #[test]
    fn identical_directories_share_digest() {
        let fx = fixture();
        for dir in ["left", "right"] {
            fs::create_dir(fx.worktree.join(dir)).unwrap();
            fs::write(fx.worktree.join(dir).join("f"), b"same").unwrap();
        }

        let sha = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        let tree = fx.store.read_tree(&sha).unwrap();
        assert_eq!(tree.records[0].sha, tree.records[1].sha);
    }

    #[test]
    fn empty_directory_is_empty_tree() {
        let fx = fixture();
        fs::create_dir(fx.worktree.join("empty")).unwrap();

        let sha = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        let tree = fx.store.read_tree(&sha).unwrap();
        assert_eq!(tree.records[0].sha, Tree::new(Vec::new()).sha());
    }

    #[test]
    fn skips_exact_ignored_paths() {
        let fx = fixture();
        fs::create_dir_all(fx.worktree.join(".gitrs/objects")).unwrap();
        fs::create_dir_all(fx.worktree.join("nested/.gitrs")).unwrap();
        fs::write(fx.worktree.join("nested/.gitrs/kept"), b"k").unwrap();
        fs::write(fx.worktree.join("file"), b"f").unwrap();

        let ignore: IgnoreSet = [fx.worktree.join(".gitrs")].into_iter().collect();
        let sha = build(&fx.store, &fx.worktree, &ignore).unwrap();
        let tree = fx.store.read_tree(&sha).unwrap();
        assert_eq!(names(&tree), ["file", "nested"]);

        let nested = fx.store.read_tree(&tree.records[1].sha).unwrap();
        assert_eq!(names(&nested), [".gitrs"]);
    }

    #[test]
    fn missing_root_is_io_error() {
        let fx = fixture();
        let missing = fx.worktree.join("nope");
        assert!(matches!(
            build(&fx.store, &missing, &IgnoreSet::new()),
            Err(Error::Io { path, .. }) if path == missing
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_stores_target_path() {
        let fx = fixture();
        fs::write(fx.worktree.join("a.txt"), b"file contents").unwrap();
        std::os::unix::fs::symlink("a.txt", fx.worktree.join("link")).unwrap();

        let sha = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        let tree = fx.store.read_tree(&sha).unwrap();
        let link = &tree.records[1];
        assert_eq!(link.name, "link");
        assert_eq!(link.mode, FileMode::Symlink);

        let blob = fx.store.read(&link.sha).unwrap().into_blob().unwrap();
        assert_eq!(blob.content(), b"a.txt");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_is_not_followed() {
        let fx = fixture();
        fs::create_dir(fx.worktree.join("real")).unwrap();
        fs::write(fx.worktree.join("real/f"), b"x").unwrap();
        std::os::unix::fs::symlink("real", fx.worktree.join("alias")).unwrap();

        let sha = build(&fx.store, &fx.worktree, &IgnoreSet::new()).unwrap();
        let tree = fx.store.read_tree(&sha).unwrap();
        assert_eq!(names(&tree), ["alias", "real"]);
        assert_eq!(tree.records[0].mode, FileMode::Symlink);
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_aborts_build() {
        let fx = fixture();
        fs::write(fx.worktree.join("ok"), b"fine").unwrap();
        std::os::unix::fs::symlink("does-not-exist", fx.worktree.join("dangling")).unwrap();

        let result = build(&fx.store, &fx.worktree, &IgnoreSet::new());
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
