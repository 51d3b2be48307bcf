//! Plumbing for a small content addressed object store: blobs and trees keyed by the SHA-1 of
//! their serialized form, stored zlib compressed under a repository's `.gitrs/objects`.

pub mod error;
pub mod hash;
pub mod ignore;
pub mod object;
pub mod repository;
pub mod store;
pub mod tree_builder;
pub mod tree_walk;

pub use error::{Error, Result};
pub use hash::Sha;
pub use repository::Repository;
