use crate::archive::codec::{
    decode_entry, gzip_compress, gzip_decompress, has_canonical_gzip_header, sha256_hex,
    verify_entry, EncryptionKey,
};
use crate::archive::format::{read_magic, Entry, MAGIC_SIZE, MAX_HEADER_SIZE};
use crate::archive::index::HeaderIndex;
use crate::archive::scan::read_balanced_object;
use crate::error::{PakError, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

/// Random-access reader over a pak stream
///
/// The header is parsed eagerly when the reader is built; entry payloads are
/// decoded on each [`get`](Self::get). The stream sits behind a mutex so each
/// seek-then-read runs as one unit, which lets `get` take `&self`. The reader
/// owns the stream and drops it with itself.
pub struct PakReader<S> {
    stream: Mutex<S>,
    index: Arc<HeaderIndex>,
    data_begin: u64,
    encrypted: bool,
    key: Option<EncryptionKey>,
}

impl PakReader<File> {
    /// Open a pak file from disk
    pub fn open_file<P: AsRef<Path>>(path: P, key: Option<EncryptionKey>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_stream(file, key)
    }
}

impl<S: Read + Seek> PakReader<S> {
    /// Parse the magic token and header envelope from `stream`.
    ///
    /// On any failure the stream is dropped and no reader is produced.
    pub fn from_stream(mut stream: S, key: Option<EncryptionKey>) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        read_magic(&mut stream)?;

        let scanned = read_balanced_object(BufReader::new(&mut stream), MAX_HEADER_SIZE)?;
        let data_begin = MAGIC_SIZE as u64 + scanned.consumed;

        let (index, encrypted) = HeaderIndex::decode_envelope_with_mode(&scanned.text, key.as_ref())?;

        tracing::debug!(
            entries = index.len(),
            encrypted,
            data_begin,
            "opened pak archive"
        );

        Ok(Self {
            stream: Mutex::new(stream),
            index: Arc::new(index),
            data_begin,
            encrypted,
            key: if encrypted { key } else { None },
        })
    }

    /// Build a second reader over an independent handle to the same archive.
    ///
    /// The parsed header is shared, not re-read; only the magic token of the new
    /// stream is checked. Useful for parallel extraction.
    pub fn share_with<T: Read + Seek>(&self, mut stream: T) -> Result<PakReader<T>> {
        stream.seek(SeekFrom::Start(0))?;
        read_magic(&mut stream)?;

        Ok(PakReader {
            stream: Mutex::new(stream),
            index: Arc::clone(&self.index),
            data_begin: self.data_begin,
            encrypted: self.encrypted,
            key: self.key.clone(),
        })
    }

    /// Check if an entry exists in the archive
    pub fn exists(&self, path: &str) -> bool {
        self.index.contains(path)
    }

    /// Get entry information without reading data
    pub fn entry(&self, path: &str) -> Result<&Entry> {
        self.index.lookup(path)
    }

    /// Number of entries in the archive
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    /// All entry paths, sorted
    pub fn list_entries(&self) -> Vec<&str> {
        self.index.iter().map(|(path, _)| path).collect()
    }

    pub fn index(&self) -> &Arc<HeaderIndex> {
        &self.index
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Absolute stream position where the data section starts
    pub fn data_begin(&self) -> u64 {
        self.data_begin
    }

    /// Read and decode an entry without hash verification
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.get(path, false)
    }

    /// Read and decode an entry.
    ///
    /// With `verify`, the plaintext hash is checked, the gzip member must be the
    /// exact bytes this crate writes for that plaintext, and any decode failure is
    /// reported as `Integrity`, so a damaged payload can never pass silently.
    pub fn get(&self, path: &str, verify: bool) -> Result<Vec<u8>> {
        let entry = self.index.lookup(path)?;
        let stored = self.read_stored(path, entry)?;

        tracing::trace!(path, size = entry.size, verify, "reading pak entry");

        if verify {
            return self.decode_verified(path, entry, stored);
        }

        decode_entry(&stored, self.key.as_ref())
    }

    /// Verified read of every entry, stopping at the first failure
    pub fn verify_all(&self) -> Result<()> {
        for (path, _) in self.index.iter() {
            self.get(path, true)?;
        }
        Ok(())
    }

    /// Consume the reader and hand back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    /// Seek to the entry and read exactly its stored size
    fn read_stored(&self, path: &str, entry: &Entry) -> Result<Vec<u8>> {
        let start = self.data_begin.checked_add(entry.offset).ok_or_else(|| {
            PakError::MalformedArchive(format!("entry {} offset overflows", path))
        })?;

        let mut stored = Vec::new();
        let read = {
            let mut stream = self.stream.lock();
            stream.seek(SeekFrom::Start(start))?;
            (&mut *stream).take(entry.size).read_to_end(&mut stored)?
        };

        if read as u64 != entry.size {
            return Err(PakError::TruncatedRead {
                path: path.to_string(),
                expected: entry.size,
                actual: read as u64,
            });
        }

        Ok(stored)
    }

    fn decode_verified(&self, path: &str, entry: &Entry, stored: Vec<u8>) -> Result<Vec<u8>> {
        let integrity = |detail: String| {
            tracing::warn!(path, %detail, "pak entry failed verification");
            PakError::Integrity {
                path: path.to_string(),
                detail,
            }
        };

        let compressed = match self.key.as_ref() {
            Some(key) => key.decrypt(&stored).map_err(|e| integrity(e.to_string()))?,
            None => stored,
        };

        if !has_canonical_gzip_header(&compressed) {
            return Err(integrity("unexpected gzip member header".to_string()));
        }

        let plaintext = gzip_decompress(&compressed).map_err(|e| integrity(e.to_string()))?;

        if !verify_entry(&plaintext, &entry.hash) {
            return Err(integrity(format!(
                "hash mismatch: expected {}, got {}",
                entry.hash,
                sha256_hex(&plaintext)
            )));
        }

        // Deflate padding bits in the final byte are invisible to the hash and CRC
        let canonical = gzip_compress(&plaintext).map_err(|e| integrity(e.to_string()))?;
        if canonical != compressed {
            return Err(integrity("non-canonical gzip member".to_string()));
        }

        Ok(plaintext)
    }
}

impl<S> std::fmt::Debug for PakReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PakReader")
            .field("entries", &self.index.len())
            .field("data_begin", &self.data_begin)
            .field("encrypted", &self.encrypted)
            .finish()
    }
}
