use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use typed_builder::TypedBuilder;

use super::{Object, ObjectError, ObjectType, parse_size, strip_tag};
use crate::hash::Sha;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    Regular,
    Directory,
    Symlink,
}

impl FileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Directory => "040000",
            FileMode::Symlink => "120000",
        }
    }

    /// The type of object an entry with this mode refers to. Symlinks are stored as blobs
    /// holding the link target.
    pub fn object_type(&self) -> ObjectType {
        match self {
            FileMode::Directory => ObjectType::Tree,
            FileMode::Regular | FileMode::Symlink => ObjectType::Blob,
        }
    }
}

impl FromStr for FileMode {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "100644" => Ok(FileMode::Regular),
            "040000" => Ok(FileMode::Directory),
            "120000" => Ok(FileMode::Symlink),
            _ => Err(ObjectError::invalid("tree", "mode", s.as_bytes())),
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named reference to another stored object.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct TreeEntry {
    pub mode: FileMode,
    #[builder(setter(into))]
    pub name: String,
    pub sha: Sha,
    /// Aggregate size of what the entry refers to. Only known while building; parsed entries
    /// carry zero.
    #[builder(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub size: u64,
    pub records: Vec<TreeEntry>,
}

impl Tree {
    /// Entries are serialized in the order given. Canonical trees need them sorted by name,
    /// which is up to the caller.
    pub fn new(records: Vec<TreeEntry>) -> Self {
        let size = records.iter().map(|entry| entry.size).sum();
        Self { size, records }
    }

    pub fn is_sorted(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[0].name.as_bytes() < pair[1].name.as_bytes())
    }
}

impl Object for Tree {
    const TYPE: ObjectType = ObjectType::Tree;

    // tree <size>\n
    // <mode> <name>\x00<sha>\n ...
    fn serialize(&self) -> Vec<u8> {
        let mut output = format!("{} {}\n", Self::TYPE, self.size).into_bytes();

        self.records.iter().for_each(|entry| {
            output.extend_from_slice(
                format!("{}\x20{}\x00{}\n", entry.mode, entry.name, entry.sha).as_bytes(),
            );
        });

        output
    }

    fn deserialize(data: &[u8]) -> Result<Self, ObjectError> {
        let rest = strip_tag(data, Self::TYPE)?;

        let newline_idx = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(ObjectError::missing("tree", "header"))?;
        let size = parse_size("tree", &rest[..newline_idx])? as u64;

        let body = &rest[newline_idx + 1..];
        let mut records: Vec<TreeEntry> = Vec::new();
        let mut seen = HashSet::new();
        let mut pos = 0;
        while pos < body.len() {
            let (entry, next) = parse_entry(body, pos)?;
            if !seen.insert(entry.name.clone()) {
                return Err(ObjectError::invalid("tree", "name", entry.name.as_bytes()));
            }
            records.push(entry);
            pos = next;
        }

        Ok(Self { size, records })
    }
}

// Parses the entry starting at `pos`, returning it with the offset just past its newline.
fn parse_entry(data: &[u8], pos: usize) -> Result<(TreeEntry, usize), ObjectError> {
    let space_idx = data[pos..]
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ObjectError::missing("tree", "mode separator"))?
        + pos;
    let raw_mode = &data[pos..space_idx];
    let mode: FileMode = std::str::from_utf8(raw_mode)
        .map_err(|_| ObjectError::invalid("tree", "mode", raw_mode))?
        .parse()?;

    let null_idx = data[space_idx..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(ObjectError::missing("tree", "name separator"))?
        + space_idx;
    let raw_name = &data[space_idx + 1..null_idx];
    let name = match std::str::from_utf8(raw_name) {
        Ok(name) if !name.is_empty() && !name.contains('/') => name.to_owned(),
        _ => return Err(ObjectError::invalid("tree", "name", raw_name)),
    };

    let newline_idx = data[null_idx..]
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(ObjectError::missing("tree", "entry terminator"))?
        + null_idx;
    let raw_sha = &data[null_idx + 1..newline_idx];
    let sha: Sha = std::str::from_utf8(raw_sha)
        .map_err(|_| ObjectError::invalid("tree", "digest", raw_sha))?
        .parse()
        .map_err(|_| ObjectError::invalid("tree", "digest", raw_sha))?;

    let entry = TreeEntry::builder().mode(mode).name(name).sha(sha).build();
    Ok((entry, newline_idx + 1))
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.records {
            writeln!(
                f,
                "{} {} {}\t{}",
                entry.mode,
                entry.mode.object_type(),
                entry.sha,
                entry.name
            )?;
        }
        Ok(())
    }
}
