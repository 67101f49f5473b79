//! Archive capability consumed by asset-loading code
//!
//! Asset loaders only need to ask whether a path exists and to open it as a
//! seekable byte stream. [`PakReader`] provides that surface over a pak file;
//! other backends (a plain directory, an in-memory map) can implement the same
//! trait.

use crate::archive::PakReader;
use crate::error::Result;
use std::io::{Cursor, Read, Seek};

/// Fully decoded entry contents, positioned at offset 0
pub type EntryStream = Cursor<Vec<u8>>;

/// Named byte blobs addressed by path
pub trait Archive {
    /// Check if `path` names an entry
    fn exists(&self, path: &str) -> bool;

    /// Open `path` as a readable, seekable stream over its decoded contents
    fn open(&self, path: &str) -> Result<EntryStream>;
}

impl<S: Read + Seek> Archive for PakReader<S> {
    fn exists(&self, path: &str) -> bool {
        PakReader::exists(self, path)
    }

    fn open(&self, path: &str) -> Result<EntryStream> {
        Ok(Cursor::new(self.get(path, false)?))
    }
}

impl<A: Archive + ?Sized> Archive for Box<A> {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn open(&self, path: &str) -> Result<EntryStream> {
        (**self).open(path)
    }
}
