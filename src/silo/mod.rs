//! The silo loader (§6): the external contract `ensure()` depends on to
//! validate, hold, and persist a compiled byte blob.

pub mod header;
pub mod record;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{CompileError, Result};
use header::Header;

/// An immutable, validated silo: a header plus the raw bytes it was decoded
/// from. Once constructed, the bytes never change — a recompile produces a
/// brand new `Silo`, never a mutation of an existing one.
#[derive(Debug, Clone)]
pub struct Silo {
    header: Header,
    bytes: Vec<u8>,
}

impl Silo {
    /// Wraps an already-assembled byte blob without re-validating it. Used
    /// by the compiler right after it finishes emission.
    pub(crate) fn from_parts(header: Header, bytes: Vec<u8>) -> Self {
        Silo { header, bytes }
    }

    /// Validates `blob`'s magic/version and wraps it as a `Silo`.
    pub fn load_from_bytes(blob: Vec<u8>) -> Result<Self> {
        let header = Header::decode(&blob)?;
        Ok(Silo { header, bytes: blob })
    }

    /// Reads `path` from disk and loads it as a silo.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let blob = fs::read(path).map_err(|e| CompileError::io(path, e))?;
        Self::load_from_bytes(blob)
    }

    /// Writes the raw bytes to `path`, overwriting any existing file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.bytes).map_err(|e| CompileError::io(path, e))?;
        debug!(bytes = self.bytes.len(), ?path, "wrote silo to disk");
        Ok(())
    }

    /// The 16-byte GUID stored in the header, formatted as a hyphenated
    /// hex string for logs. These bytes are an opaque fingerprint, not a
    /// valid RFC 4122 UUID — `uuid::Uuid::from_bytes` is used purely as a
    /// display helper, never `Uuid::new_v5`.
    pub fn get_guid(&self) -> String {
        uuid::Uuid::from_bytes(self.header.guid).to_string()
    }

    pub fn guid_bytes(&self) -> [u8; 16] {
        self.header.guid
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn get_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
