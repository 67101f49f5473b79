use crate::error::{PakError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Two ASCII digits, stored inside the magic token
pub const FORMAT_VERSION: [u8; 2] = *b"00";

/// Magic token: 0xA9 'p' 'a' 'k' 0xFF <version digits> 0xA9
pub const MAGIC_BYTES: [u8; 8] = [
    0xA9,
    b'p',
    b'a',
    b'k',
    0xFF,
    FORMAT_VERSION[0],
    FORMAT_VERSION[1],
    0xA9,
];

/// Length of the magic token, including the version digits
pub const MAGIC_SIZE: usize = MAGIC_BYTES.len();

/// Upper bound on the envelope JSON text scanned after the magic token (64MB)
pub const MAX_HEADER_SIZE: usize = 64 * 1024 * 1024;

/// Header index entry describing one stored blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Offset into the data section (relative to the end of the envelope)
    pub offset: u64,
    /// Stored length, after compression and encryption
    pub size: u64,
    /// Hex SHA-256 of the original plaintext
    pub hash: String,
}

impl Entry {
    /// Exclusive end of this entry's range in the data section
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

/// Outer JSON wrapper around the encoded header document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub encrypted: bool,
    pub data: String,
}

/// Decoded header document: `{"entries": {...}, "offset": n}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct HeaderDocument {
    #[serde(default)]
    pub entries: BTreeMap<String, Entry>,
    /// Older producers omit this; it is reconstructed from the entries.
    #[serde(default, rename = "offset", skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

/// Read and validate the magic token at the current stream position
pub fn read_magic<R: Read>(mut reader: R) -> Result<()> {
    let mut magic = [0u8; MAGIC_SIZE];
    reader.read_exact(&mut magic).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => PakError::InvalidMagic,
        _ => PakError::Io(e),
    })?;

    let fixed_matches = magic[..5] == MAGIC_BYTES[..5] && magic[7] == MAGIC_BYTES[7];
    if !fixed_matches {
        return Err(PakError::InvalidMagic);
    }

    let version = &magic[5..7];
    if !version.iter().all(u8::is_ascii_digit) {
        return Err(PakError::InvalidMagic);
    }
    if version != FORMAT_VERSION {
        return Err(PakError::UnsupportedVersion(
            String::from_utf8_lossy(version).into_owned(),
        ));
    }

    Ok(())
}
