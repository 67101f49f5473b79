use std::io;
use thiserror::Error;

/// Result type for pak operations
pub type Result<T> = std::result::Result<T, PakError>;

/// Unified error type for all pak operations
#[derive(Debug, Error)]
pub enum PakError {
    // Format errors
    #[error("Invalid magic bytes in pak header")]
    InvalidMagic,

    #[error("Unsupported pak format version: {0}")]
    UnsupportedVersion(String),

    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    // Entry errors
    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("Duplicate entry in archive: {0}")]
    DuplicateEntry(String),

    #[error("Truncated read of {path}: expected {expected} bytes, got {actual}")]
    TruncatedRead {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Integrity check failed for {path}: {detail}")]
    Integrity { path: String, detail: String },

    // Codec errors
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed (wrong key?): {0}")]
    DecryptionFailed(String),

    #[error("Archive is encrypted but no decryption key was supplied")]
    MissingDecryptionKey,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Path error: {0}")]
    PathError(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PakError {
    /// True for every error that means the archive bytes themselves are not a
    /// well-formed pak (bad magic or version, unterminated header, bad JSON/base64).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            PakError::InvalidMagic
                | PakError::UnsupportedVersion(_)
                | PakError::MalformedArchive(_)
        )
    }

    /// True for wrong, garbled or missing keys.
    pub fn is_decryption(&self) -> bool {
        matches!(
            self,
            PakError::DecryptionFailed(_) | PakError::MissingDecryptionKey
        )
    }
}

impl From<base64::DecodeError> for PakError {
    fn from(err: base64::DecodeError) -> Self {
        PakError::MalformedArchive(format!("invalid base64 in header envelope: {}", err))
    }
}

impl From<walkdir::Error> for PakError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io_err) => PakError::Io(io_err),
            None => PakError::PathError("filesystem loop while walking directory".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_family() {
        assert!(PakError::InvalidMagic.is_malformed());
        assert!(PakError::UnsupportedVersion("01".into()).is_malformed());
        assert!(PakError::MalformedArchive("x".into()).is_malformed());
        assert!(!PakError::EntryNotFound("/a".into()).is_malformed());
        assert!(!PakError::MissingDecryptionKey.is_malformed());

        // Only raised while serializing on the write path
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!PakError::from(json).is_malformed());
    }

    #[test]
    fn test_decryption_family() {
        assert!(PakError::MissingDecryptionKey.is_decryption());
        assert!(PakError::DecryptionFailed("bad padding".into()).is_decryption());
        assert!(!PakError::InvalidMagic.is_decryption());
    }

    #[test]
    fn test_display_messages() {
        let err = PakError::TruncatedRead {
            path: "/a.txt".into(),
            expected: 10,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "Truncated read of /a.txt: expected 10 bytes, got 4"
        );
    }
}
