use crate::archive::codec::{gzip_compress, gzip_decompress, EncryptionKey};
use crate::archive::format::{Entry, Envelope, HeaderDocument};
use crate::error::{PakError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::BTreeMap;

/// In-memory header: path -> entry, plus the append-only offset counter
///
/// Entries are only ever appended. `next_offset` always equals the sum of the
/// stored sizes appended so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    entries: BTreeMap<String, Entry>,
    next_offset: u64,
}

impl HeaderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new entry at the current end of the data section.
    ///
    /// Returns the assigned offset. Fails with `DuplicateEntry` (leaving the index
    /// untouched) if the path is already present.
    pub fn append(&mut self, path: &str, stored_size: u64, hash: String) -> Result<u64> {
        if self.entries.contains_key(path) {
            return Err(PakError::DuplicateEntry(path.to_string()));
        }

        let offset = self.next_offset;
        let next_offset = offset.checked_add(stored_size).ok_or_else(|| {
            PakError::MalformedArchive("data section exceeds u64 offsets".to_string())
        })?;

        self.entries.insert(
            path.to_string(),
            Entry {
                offset,
                size: stored_size,
                hash,
            },
        );
        self.next_offset = next_offset;

        tracing::trace!(path, offset, size = stored_size, "appended pak entry");
        Ok(offset)
    }

    pub fn lookup(&self, path: &str) -> Result<&Entry> {
        self.entries
            .get(path)
            .ok_or_else(|| PakError::EntryNotFound(path.to_string()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total stored size of the data section
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    /// Serialize to the envelope JSON: `{"encrypted": bool, "data": base64}`.
    ///
    /// `data` is the header document, gzip-compressed and then (with a key)
    /// AES-encrypted.
    pub fn encode_envelope(&self, key: Option<&EncryptionKey>) -> Result<Vec<u8>> {
        let document = HeaderDocument {
            entries: self.entries.clone(),
            next_offset: Some(self.next_offset),
        };
        let json = serde_json::to_vec(&document)?;

        let compressed = gzip_compress(&json)?;
        let payload = match key {
            Some(key) => key.encrypt(&compressed),
            None => compressed,
        };

        let envelope = Envelope {
            encrypted: key.is_some(),
            data: STANDARD.encode(payload),
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// Parse envelope JSON produced by [`encode_envelope`](Self::encode_envelope)
    pub fn decode_envelope(bytes: &[u8], key: Option<&EncryptionKey>) -> Result<Self> {
        Self::decode_envelope_with_mode(bytes, key).map(|(index, _)| index)
    }

    /// Like [`decode_envelope`](Self::decode_envelope), also returning the
    /// envelope's `encrypted` flag
    pub(crate) fn decode_envelope_with_mode(
        bytes: &[u8],
        key: Option<&EncryptionKey>,
    ) -> Result<(Self, bool)> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(|e| {
            PakError::MalformedArchive(format!("invalid header envelope: {}", e))
        })?;
        let payload = STANDARD.decode(envelope.data.as_bytes())?;

        let json = if envelope.encrypted {
            let key = key.ok_or(PakError::MissingDecryptionKey)?;
            let compressed = key.decrypt(&payload).map_err(|_| {
                PakError::DecryptionFailed("failed to decrypt pak header".to_string())
            })?;
            gzip_decompress(&compressed).map_err(|e| {
                PakError::DecryptionFailed(format!("failed to decompress pak header: {}", e))
            })?
        } else {
            if key.is_some() {
                tracing::debug!("archive header is not encrypted, ignoring supplied key");
            }
            gzip_decompress(&payload).map_err(|e| {
                PakError::MalformedArchive(format!("failed to decompress pak header: {}", e))
            })?
        };

        let document: HeaderDocument = serde_json::from_slice(&json).map_err(|e| {
            if envelope.encrypted {
                PakError::DecryptionFailed(format!("invalid header document: {}", e))
            } else {
                PakError::MalformedArchive(format!("invalid header document: {}", e))
            }
        })?;

        Ok((Self::from_document(document)?, envelope.encrypted))
    }

    /// Rebuild the index, checking that entry ranges are disjoint and in bounds
    fn from_document(document: HeaderDocument) -> Result<Self> {
        let mut ranges = Vec::with_capacity(document.entries.len());
        let mut max_end = 0u64;
        for (path, entry) in &document.entries {
            let end = entry.end().ok_or_else(|| {
                PakError::MalformedArchive(format!("entry {} range overflows", path))
            })?;
            max_end = max_end.max(end);
            if entry.size > 0 {
                ranges.push((entry.offset, end, path.as_str()));
            }
        }

        let next_offset = document.next_offset.unwrap_or(max_end);
        if max_end > next_offset {
            return Err(PakError::MalformedArchive(format!(
                "entry range ends at {} past data section end {}",
                max_end, next_offset
            )));
        }

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            let (_, prev_end, prev_path) = pair[0];
            let (next_start, _, next_path) = pair[1];
            if next_start < prev_end {
                return Err(PakError::MalformedArchive(format!(
                    "entries {} and {} overlap",
                    prev_path, next_path
                )));
            }
        }

        Ok(Self {
            entries: document.entries,
            next_offset,
        })
    }
}
