use crate::archive::codec::{encode_entry, EncryptionKey};
use crate::archive::format::MAGIC_BYTES;
use crate::archive::index::HeaderIndex;
use crate::archive::source::read_entries;
use crate::error::Result;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Builds a pak buffer in memory
///
/// Entries are encoded as they are added; `finish` prepends the magic token and
/// the header envelope. The writer is consumed by `finish`, so nothing is kept
/// around once the buffer has been produced.
#[derive(Debug, Default)]
pub struct PakWriter {
    index: HeaderIndex,
    data: Vec<u8>,
    encryption_key: Option<EncryptionKey>,
}

impl PakWriter {
    /// Create an unencrypted writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Encrypt every entry and the header with the given key
    pub fn with_encryption(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    /// Add one entry and return its offset in the data section.
    ///
    /// Fails with `DuplicateEntry` if `path` was already added; the writer is
    /// left exactly as it was.
    pub fn add_entry(&mut self, path: &str, data: &[u8]) -> Result<u64> {
        let encoded = encode_entry(data, self.encryption_key.as_ref())?;
        let offset = self
            .index
            .append(path, encoded.stored.len() as u64, encoded.hash)?;
        self.data.extend_from_slice(&encoded.stored);
        Ok(offset)
    }

    /// Add a file from disk under `archive_path`
    pub fn add_file_from_disk(&mut self, archive_path: &str, disk_path: &Path) -> Result<u64> {
        let data = std::fs::read(disk_path)?;
        self.add_entry(archive_path, &data)
    }

    /// Add every regular file below `root`, named `/<relative path>`
    pub fn add_directory(&mut self, root: &Path) -> Result<()> {
        for (path, data) in read_entries(root)? {
            self.add_entry(&path, &data)?;
        }
        Ok(())
    }

    /// Produce the final buffer: magic ++ envelope ++ data
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.write_to(&mut output)?;
        Ok(output)
    }

    /// Stream the final archive into `writer`
    pub fn write_to<W: Write>(self, mut writer: W) -> Result<()> {
        let envelope = self.index.encode_envelope(self.encryption_key.as_ref())?;

        writer.write_all(&MAGIC_BYTES)?;
        writer.write_all(&envelope)?;
        writer.write_all(&self.data)?;
        writer.flush()?;

        tracing::debug!(
            entries = self.index.len(),
            header_size = envelope.len(),
            data_size = self.data.len(),
            encrypted = self.encryption_key.is_some(),
            "wrote pak archive"
        );
        Ok(())
    }
}

/// Build a pak buffer from `(path, bytes)` pairs.
///
/// Pairs are encoded in path order, so the output depends only on the set of
/// pairs and the key. A repeated path fails the whole build with `DuplicateEntry`.
pub fn create_pak<I, P, D>(entries: I, key: Option<&EncryptionKey>) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (P, D)>,
    P: AsRef<str>,
    D: AsRef<[u8]>,
{
    let mut sorted: Vec<(P, D)> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    let mut writer = match key {
        Some(key) => PakWriter::new().with_encryption(key.clone()),
        None => PakWriter::new(),
    };
    for (path, data) in &sorted {
        writer.add_entry(path.as_ref(), data.as_ref())?;
    }
    writer.finish()
}

/// Pack a directory tree: every regular file below `root` becomes `/<relative path>`
pub fn create_pak_from_dir(root: &Path, key: Option<&EncryptionKey>) -> Result<Vec<u8>> {
    let entries: BTreeMap<String, Vec<u8>> = read_entries(root)?;
    create_pak(entries, key)
}
