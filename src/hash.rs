// Content addressing: SHA-1 digests of serialized objects and the on-disk layout derived from them

use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};

use crate::object::ObjectError;

/// Number of hex characters in a rendered digest.
pub const SHA_HEX_LEN: usize = 40;

/// Length of the fan-out directory name under `objects/`.
const FANOUT_LEN: usize = 2;

/// A lower-case, 40 character hex rendering of a SHA-1 digest.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha(String);

impl Sha {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the digest into its fan-out directory name and the file name within it.
    pub fn locate(&self) -> (&str, &str) {
        self.0.split_at(FANOUT_LEN)
    }
}

/// Hashes the exact bytes given. Callers pass the serialized form of an object, never raw content.
pub fn digest(data: &[u8]) -> Sha {
    Sha(hex::encode(Sha1::digest(data)))
}

impl FromStr for Sha {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SHA_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ObjectError::InvalidSha(s.to_owned()));
        }

        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sha {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
