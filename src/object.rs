// Definitions and methods for the object types tracked by gitrs

pub mod blob;
pub mod error;
pub mod tree;

use std::fmt;
use std::str::FromStr;

use crate::hash::{self, Sha};

pub use blob::Blob;
pub use error::ObjectError;
pub use tree::{FileMode, Tree, TreeEntry};

/// An object with a canonical serialized form. The serialized bytes are both what gets stored
/// and what gets hashed.
pub trait Object: Sized {
    const TYPE: ObjectType;

    fn serialize(&self) -> Vec<u8>;
    fn deserialize(data: &[u8]) -> Result<Self, ObjectError>;

    fn sha(&self) -> Sha {
        hash::digest(&self.serialize())
    }
}

#[derive(Debug)]
pub enum GitrsObject {
    BlobObject(Blob),
    TreeObject(Tree),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
        }
    }
}

impl FromStr for ObjectType {
    type Err = ObjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            _ => Err(ObjectError::UnrecognizedObjectType(value.to_owned())),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GitrsObject {
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            GitrsObject::BlobObject(blob) => blob.serialize(),
            GitrsObject::TreeObject(tree) => tree.serialize(),
        }
    }

    /// Parses a full serialized object, dispatching on the leading type tag.
    pub fn parse(data: &[u8]) -> Result<Self, ObjectError> {
        let space_idx = data
            .iter()
            .position(|&b| b == b' ')
            .ok_or(ObjectError::missing("object", "type"))?;

        let tag = std::str::from_utf8(&data[..space_idx])
            .map_err(|_| ObjectError::invalid("object", "type", &data[..space_idx]))?;

        match tag.parse::<ObjectType>()? {
            ObjectType::Blob => Ok(Self::BlobObject(Blob::deserialize(data)?)),
            ObjectType::Tree => Ok(Self::TreeObject(Tree::deserialize(data)?)),
        }
    }

    pub fn get_type(&self) -> ObjectType {
        match self {
            GitrsObject::BlobObject(_) => ObjectType::Blob,
            GitrsObject::TreeObject(_) => ObjectType::Tree,
        }
    }

    pub fn sha(&self) -> Sha {
        hash::digest(&self.serialize())
    }

    pub fn into_tree(self) -> Result<Tree, ObjectError> {
        match self {
            GitrsObject::TreeObject(tree) => Ok(tree),
            other => Err(ObjectError::TypeMismatch {
                expected: ObjectType::Tree,
                found: other.get_type(),
            }),
        }
    }

    pub fn into_blob(self) -> Result<Blob, ObjectError> {
        match self {
            GitrsObject::BlobObject(blob) => Ok(blob),
            other => Err(ObjectError::TypeMismatch {
                expected: ObjectType::Blob,
                found: other.get_type(),
            }),
        }
    }
}

impl From<Blob> for GitrsObject {
    fn from(blob: Blob) -> Self {
        GitrsObject::BlobObject(blob)
    }
}

impl From<Tree> for GitrsObject {
    fn from(tree: Tree) -> Self {
        GitrsObject::TreeObject(tree)
    }
}

/// Strips `<tag> ` from the front of `data`, returning the remainder.
pub(crate) fn strip_tag(data: &[u8], object_type: ObjectType) -> Result<&[u8], ObjectError> {
    let object = object_type.as_str();
    let space_idx = data
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ObjectError::missing(object, "type"))?;

    if &data[..space_idx] != object.as_bytes() {
        return Err(ObjectError::invalid(object, "type", &data[..space_idx]));
    }

    Ok(&data[space_idx + 1..])
}

/// Parses a canonical decimal ASCII length. Signs, whitespace, leading zeros and empty input
/// are rejected.
pub(crate) fn parse_size(object: &'static str, raw: &[u8]) -> Result<usize, ObjectError> {
    let leading_zero = raw.len() > 1 && raw[0] == b'0';
    if raw.is_empty() || leading_zero || !raw.iter().all(u8::is_ascii_digit) {
        return Err(ObjectError::invalid(object, "size", raw));
    }

    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ObjectError::invalid(object, "size", raw))
}
