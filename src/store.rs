// Zlib compressed, content addressed object storage under `objects/<2 hex>/<38 hex>`

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::bufread::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::debug;

use crate::error::{Error, IoContext, Result};
use crate::hash::{self, Sha};
use crate::object::{GitrsObject, Object, Tree};

pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    pub fn object_path(&self, sha: &Sha) -> PathBuf {
        let (dir, file) = sha.locate();
        self.objects_dir.join(dir).join(file)
    }

    pub fn contains(&self, sha: &Sha) -> bool {
        self.object_path(sha).is_file()
    }

    /// Stores already serialized object bytes and returns their digest.
    ///
    /// The compressed bytes are written to a temporary file next to the destination and moved
    /// into place without replacing anything, so readers either see no file or a complete one.
    /// If the object is already present (or another process wins the race), the existing file is
    /// left untouched.
    pub fn put(&self, serialized: &[u8]) -> Result<Sha> {
        let sha = hash::digest(serialized);
        let path = self.object_path(&sha);
        if path.exists() {
            debug!("Object {} already stored", sha);
            return Ok(sha);
        }

        let (fanout, _) = sha.locate();
        let dir = self.objects_dir.join(fanout);
        fs::create_dir_all(&dir).at(&dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempfile_in(&dir)
            .at(&dir)?;
        let tmp_path = tmp.path().to_path_buf();

        let mut encoder = ZlibEncoder::new(&mut tmp, Compression::default());
        encoder.write_all(serialized).at(&tmp_path)?;
        encoder.finish().at(&tmp_path)?;
        tmp.as_file().sync_all().at(&tmp_path)?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!("Wrote object {} ({} bytes)", sha, serialized.len());
                Ok(sha)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Object {} appeared concurrently", sha);
                Ok(sha)
            }
            Err(e) => Err(Error::io(&path, e.error)),
        }
    }

    /// Reads and inflates the serialized bytes stored under `sha`.
    pub fn get(&self, sha: &Sha) -> Result<Vec<u8>> {
        let path = self.object_path(sha);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(sha.clone()));
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        let mut decoder = ZlibDecoder::new(BufReader::new(file));
        let mut decompressed_data = Vec::new();
        if let Err(e) = decoder.read_to_end(&mut decompressed_data) {
            return match e.kind() {
                io::ErrorKind::InvalidInput
                | io::ErrorKind::InvalidData
                | io::ErrorKind::UnexpectedEof => Err(Error::Corrupt {
                    sha: sha.clone(),
                    reason: e.to_string(),
                }),
                _ => Err(Error::io(&path, e)),
            };
        }

        // A truncated stream can inflate cleanly to a prefix of the object
        let actual = hash::digest(&decompressed_data);
        if &actual != sha {
            return Err(Error::Corrupt {
                sha: sha.clone(),
                reason: format!("content hashes to {}", actual),
            });
        }

        Ok(decompressed_data)
    }

    pub fn write<O: Object>(&self, object: &O) -> Result<Sha> {
        self.put(&object.serialize())
    }

    pub fn read(&self, sha: &Sha) -> Result<GitrsObject> {
        let data = self.get(sha)?;
        Ok(GitrsObject::parse(&data)?)
    }

    pub fn read_tree(&self, sha: &Sha) -> Result<Tree> {
        Ok(self.read(sha)?.into_tree()?)
    }
}
