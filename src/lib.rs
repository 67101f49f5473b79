//! assetpak: packed content archive for game assets
//!
//! A pak is a single file bundling many named byte blobs behind a compact
//! header index:
//! - Per-entry gzip compression
//! - Optional AES-256-CBC encryption of entries and header (caller-supplied key/IV)
//! - SHA-256 integrity hash of every entry's plaintext, checked on request
//! - Random-access reads by path through the [`Archive`] capability
//!
//! Layout: `MAGIC_BYTES ++ {"encrypted": bool, "data": base64} ++ entry payloads`.
//!
//! Encryption provides confidentiality at rest only. There is no authentication
//! tag; tampering is caught by verified reads, not by decryption.
//!
//! # Example
//!
//! ```
//! use assetpak::{create_pak, Archive, PakReader};
//! use std::io::{Cursor, Read};
//!
//! // Build a pak in memory
//! let buffer = create_pak(vec![("/a.txt", "hello"), ("/b/c.txt", "world!!")], None)?;
//!
//! // Read it back
//! let reader = PakReader::from_stream(Cursor::new(buffer), None)?;
//! assert!(reader.exists("/a.txt"));
//! assert_eq!(reader.get("/b/c.txt", true)?, b"world!!");
//!
//! let mut text = String::new();
//! reader.open("/a.txt")?.read_to_string(&mut text)?;
//! assert_eq!(text, "hello");
//! # Ok::<(), assetpak::PakError>(())
//! ```

// Core modules
pub mod archive;
pub mod error;
pub mod vfs;

// Re-export commonly used types
pub use archive::{
    create_pak, create_pak_from_dir, read_entries, EncryptionKey, Entry, HeaderIndex, PakReader,
    PakWriter, FORMAT_VERSION, MAGIC_BYTES,
};
pub use error::{PakError, Result};
pub use vfs::{Archive, EntryStream};
