//! The fixed-size header at the start of every silo (§3).

use crate::error::{CompileError, Result};

/// Fixed byte pattern identifying a silo file. Spells "SILO" in ASCII.
pub const MAGIC: [u8; 4] = *b"SILO";

/// Current format version. A reader should refuse anything else.
pub const VERSION: u32 = 1;

/// `magic + version + strtab + strtab_ntags` is 16 bytes; padding brings the
/// header to a 16-byte-aligned 32 bytes before the 16-byte GUID.
pub const HEADER_SIZE: usize = 4 + 4 + 4 + 4 + 16 + 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    /// Byte offset of the string table start (== end of the node table).
    pub strtab: u32,
    /// Count of distinct element-name strings interned first.
    pub strtab_ntags: u32,
    pub guid: [u8; 16],
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&self.strtab.to_le_bytes());
        buf[12..16].copy_from_slice(&self.strtab_ntags.to_le_bytes());
        // buf[16..32] stays zeroed padding.
        buf[32..48].copy_from_slice(&self.guid);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CompileError::FormatMismatch(format!(
                "buffer too short for a silo header: {} bytes",
                bytes.len()
            )));
        }
        if bytes[0..4] != MAGIC {
            return Err(CompileError::FormatMismatch(
                "bad magic: not a silo file".to_string(),
            ));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(CompileError::FormatMismatch(format!(
                "unsupported silo version: {version}"
            )));
        }
        let strtab = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let strtab_ntags = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&bytes[32..48]);
        Ok(Header {
            version,
            strtab,
            strtab_ntags,
            guid,
        })
    }
}
