// Represents a blob object type. This is used to store user files being tracked by gitrs.

use super::{Object, ObjectError, ObjectType, parse_size, strip_tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn content(&self) -> &[u8] {
        &self.data
    }

    pub fn into_content(self) -> Vec<u8> {
        self.data
    }
}

impl Object for Blob {
    const TYPE: ObjectType = ObjectType::Blob;

    // blob <size>\x00<content>
    fn serialize(&self) -> Vec<u8> {
        let header = format!("{} {}\x00", Self::TYPE, self.data.len());
        let mut output = Vec::with_capacity(header.len() + self.data.len());
        output.extend_from_slice(header.as_bytes());
        output.extend_from_slice(&self.data);
        output
    }

    fn deserialize(data: &[u8]) -> Result<Self, ObjectError> {
        let rest = strip_tag(data, Self::TYPE)?;

        let null_idx = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ObjectError::missing("blob", "size separator"))?;

        let declared = parse_size("blob", &rest[..null_idx])?;
        let content = &rest[null_idx + 1..];
        if declared != content.len() {
            return Err(ObjectError::SizeMismatch {
                declared,
                actual: content.len(),
            });
        }

        Ok(Self::new(content.to_vec()))
    }
}
