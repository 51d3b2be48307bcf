// Lists the entries of a stored tree, optionally descending into subtrees

use std::fmt;

use crate::error::Result;
use crate::hash::Sha;
use crate::object::{FileMode, ObjectType, TreeEntry};
use crate::store::ObjectStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRecord {
    pub mode: FileMode,
    pub object_type: ObjectType,
    pub sha: Sha,
    /// `/` separated path relative to the tree the walk started from, including its prefix.
    pub path: String,
}

impl fmt::Display for TreeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}\t{}",
            self.mode, self.object_type, self.sha, self.path
        )
    }
}

/// Lazy walk over a stored tree. Trees are read from the store only as the walk reaches them.
/// The first failure is yielded once and ends the walk.
pub struct TreeWalk<'a> {
    store: &'a ObjectStore,
    recursive: bool,
    next_tree: Option<(Sha, String)>,
    stack: Vec<(String, std::vec::IntoIter<TreeEntry>)>,
    failed: bool,
}

/// Walks the tree at `sha`, joining `prefix` onto every listed path. When `recursive` is set,
/// subtrees are expanded in place of their own record.
pub fn list<'a>(store: &'a ObjectStore, sha: &Sha, prefix: &str, recursive: bool) -> TreeWalk<'a> {
    TreeWalk {
        store,
        recursive,
        next_tree: Some((sha.clone(), prefix.to_owned())),
        stack: Vec::new(),
        failed: false,
    }
}

impl Iterator for TreeWalk<'_> {
    type Item = Result<TreeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if let Some((sha, prefix)) = self.next_tree.take() {
                match self.store.read_tree(&sha) {
                    Ok(tree) => self.stack.push((prefix, tree.records.into_iter())),
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
            }

            let (prefix, entries) = self.stack.last_mut()?;
            let Some(entry) = entries.next() else {
                self.stack.pop();
                continue;
            };

            let path = join(prefix, &entry.name);
            if self.recursive && entry.mode == FileMode::Directory {
                self.next_tree = Some((entry.sha, path));
                continue;
            }

            return Some(Ok(TreeRecord {
                mode: entry.mode,
                object_type: entry.mode.object_type(),
                sha: entry.sha,
                path,
            }));
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hash;
    use crate::object::{Blob, Tree};
    use tempfile::TempDir;

    struct Layout {
        _dir: TempDir,
        store: ObjectStore,
        root: Sha,
        a_txt: Sha,
        sub: Sha,
        b_txt: Sha,
    }

    // root/
    //   a.txt
    //   sub/
    //     b.txt
    fn layout() -> Layout {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"));

        let a_txt = store.write(&Blob::new(b"a".to_vec())).unwrap();
        let b_txt = store.write(&Blob::new(b"b".to_vec())).unwrap();
        let sub = store
            .write(&Tree::new(vec![file_entry("b.txt", &b_txt)]))
            .unwrap();
        let root = store
            .write(&Tree::new(vec![
                file_entry("a.txt", &a_txt),
                TreeEntry::builder()
                    .mode(FileMode::Directory)
                    .name("sub")
                    .sha(sub.clone())
                    .build(),
            ]))
            .unwrap();

        Layout {
            _dir: dir,
            store,
            root,
            a_txt,
            sub,
            b_txt,
        }
    }

    fn file_entry(name: &str, sha: &Sha) -> TreeEntry {
        TreeEntry::builder()
            .mode(FileMode::Regular)
            .name(name)
            .sha(sha.clone())
            .build()
    }

    fn record(mode: FileMode, sha: &Sha, path: &str) -> TreeRecord {
        TreeRecord {
            mode,
            object_type: mode.object_type(),
            sha: sha.clone(),
            path: path.to_owned(),
        }
    }

    #[test]
    fn lists_top_level_entries() {
        let l = layout();
        let records: Vec<_> = list(&l.store, &l.root, "", false)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            records,
            [
                record(FileMode::Regular, &l.a_txt, "a.txt"),
                record(FileMode::Directory, &l.sub, "sub"),
            ]
        );
        assert_eq!(records[1].object_type, ObjectType::Tree);
    }

    #[test]
    fn recursive_replaces_subtree_records() {
        let l = layout();
        let records: Vec<_> = list(&l.store, &l.root, "", true)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            records,
            [
                record(FileMode::Regular, &l.a_txt, "a.txt"),
                record(FileMode::Regular, &l.b_txt, "sub/b.txt"),
            ]
        );
    }

    #[test]
    fn prefix_is_joined() {
        let l = layout();
        let paths: Vec<_> = list(&l.store, &l.root, "top", true)
            .map(|r| r.unwrap().path)
            .collect();
        assert_eq!(paths, ["top/a.txt", "top/sub/b.txt"]);
    }

    #[test]
    fn display_matches_ls_tree() {
        let l = layout();
        let first = list(&l.store, &l.root, "", false).next().unwrap().unwrap();
        assert_eq!(first.to_string(), format!("100644 blob {}\ta.txt", l.a_txt));
    }

    #[test]
    fn missing_root_fails_lazily() {
        let l = layout();
        let missing = hash::digest(b"tree 0\nnothing");
        let mut walk = list(&l.store, &missing, "", false);

        assert!(matches!(walk.next(), Some(Err(Error::NotFound(_)))));
        assert!(walk.next().is_none());
    }

    #[test]
    fn missing_subtree_aborts_walk() {
        let l = layout();
        let gone = hash::digest(b"tree 0\ngone");
        let root = l
            .store
            .write(&Tree::new(vec![
                file_entry("a.txt", &l.a_txt),
                TreeEntry::builder()
                    .mode(FileMode::Directory)
                    .name("gone")
                    .sha(gone.clone())
                    .build(),
                file_entry("z.txt", &l.b_txt),
            ]))
            .unwrap();

        let results: Vec<_> = list(&l.store, &root, "", true).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().path, "a.txt");
        assert!(matches!(&results[1], Err(Error::NotFound(sha)) if *sha == gone));
    }

    #[test]
    fn non_recursive_does_not_read_subtrees() {
        let l = layout();
        std::fs::remove_file(l.store.object_path(&l.sub)).unwrap();
        let count = list(&l.store, &l.root, "", false)
            .collect::<Result<Vec<_>>>()
            .unwrap()
            .len();
        assert_eq!(count, 2);
    }
}
