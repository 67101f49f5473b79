//! Per-entry transform pipeline
//!
//! Write path: gzip -> optional AES-256-CBC. Read path: optional AES-256-CBC -> gunzip.
//! The integrity hash is always taken over the original plaintext. Swapping the
//! order of the transforms produces archives no reader can open.
//!
//! AES-CBC gives confidentiality at rest only. There is no authentication tag, so
//! a wrong key is detected indirectly when the padding, gzip framing or JSON
//! parse of the decrypted bytes fails.

use crate::error::{PakError, Result};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{Read, Write};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES key length in bytes
pub const KEY_SIZE: usize = 32;

/// AES block / IV length in bytes
pub const IV_SIZE: usize = 16;

/// Header of every gzip member this crate writes (mtime 0, no flags, OS unknown)
pub const CANONICAL_GZIP_HEADER: [u8; 10] = [0x1F, 0x8B, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0xFF];

/// Smallest possible gzip member: 10 byte header + 8 byte trailer
const MIN_GZIP_SIZE: usize = 18;

/// Maximum allowed decompression size (1GB)
pub const MAX_DECOMPRESSION_SIZE: usize = 1024 * 1024 * 1024;

/// Caller-supplied AES key and IV
///
/// Never persisted inside an archive and never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl EncryptionKey {
    pub fn new(key: [u8; KEY_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Build a key from byte slices, checking their lengths
    pub fn from_slices(key: &[u8], iv: &[u8]) -> Result<Self> {
        let key: [u8; KEY_SIZE] = key.try_into().map_err(|_| {
            PakError::EncryptionFailed(format!(
                "key must be {} bytes, got {}",
                KEY_SIZE,
                key.len()
            ))
        })?;
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| {
            PakError::EncryptionFailed(format!("IV must be {} bytes, got {}", IV_SIZE, iv.len()))
        })?;
        Ok(Self::new(key, iv))
    }

    /// Encrypt with PKCS#7 padding; empty input yields one padding block
    pub fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        Aes256CbcEnc::new(&self.key.into(), &self.iv.into()).encrypt_padded_vec_mut::<Pkcs7>(data)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(|_| PakError::DecryptionFailed("invalid ciphertext padding".to_string()))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

/// Stored form of one entry plus the hash of its plaintext
#[derive(Debug, Clone)]
pub struct EncodedEntry {
    pub stored: Vec<u8>,
    pub hash: String,
}

/// Compress, optionally encrypt, and hash one plaintext blob
pub fn encode_entry(plaintext: &[u8], key: Option<&EncryptionKey>) -> Result<EncodedEntry> {
    let compressed = gzip_compress(plaintext)?;
    let stored = match key {
        Some(key) => key.encrypt(&compressed),
        None => compressed,
    };

    Ok(EncodedEntry {
        stored,
        hash: sha256_hex(plaintext),
    })
}

/// Optionally decrypt, then decompress one stored blob
pub fn decode_entry(stored: &[u8], key: Option<&EncryptionKey>) -> Result<Vec<u8>> {
    match key {
        Some(key) => {
            let compressed = key.decrypt(stored)?;
            // Garbage after decryption means the key was wrong
            gzip_decompress(&compressed).map_err(|e| PakError::DecryptionFailed(e.to_string()))
        }
        None => gzip_decompress(stored),
    }
}

/// Recompute the plaintext hash and compare against the recorded one
pub fn verify_entry(plaintext: &[u8], expected_hash: &str) -> bool {
    sha256_hex(plaintext).eq_ignore_ascii_case(expected_hash)
}

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Gzip-compress into a single member with the canonical header
pub fn gzip_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(0xFF)
        .write(Vec::with_capacity(data.len() / 2 + MIN_GZIP_SIZE), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PakError::CompressionFailed(format!("gzip compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PakError::CompressionFailed(format!("gzip compression failed: {}", e)))
}

/// Decompress a single gzip member, enforcing [`MAX_DECOMPRESSION_SIZE`]
pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < MIN_GZIP_SIZE || data[..3] != CANONICAL_GZIP_HEADER[..3] {
        return Err(PakError::DecompressionFailed(
            "not a gzip member".to_string(),
        ));
    }

    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();

    // Read in chunks to enforce size limit
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = decoder
            .read(&mut buffer)
            .map_err(|e| PakError::DecompressionFailed(format!("gzip decompression failed: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        if decompressed.len() + bytes_read > MAX_DECOMPRESSION_SIZE {
            return Err(PakError::DecompressionFailed(format!(
                "decompressed size exceeds limit of {} bytes",
                MAX_DECOMPRESSION_SIZE
            )));
        }

        decompressed.extend_from_slice(&buffer[..bytes_read]);
    }

    Ok(decompressed)
}

/// True when `compressed` starts with the exact gzip header this crate writes
pub fn has_canonical_gzip_header(compressed: &[u8]) -> bool {
    compressed.starts_with(&CANONICAL_GZIP_HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> EncryptionKey {
        EncryptionKey::new([0x42; KEY_SIZE], [0x24; IV_SIZE])
    }

    #[test]
    fn test_gzip_header_is_canonical() {
        let compressed = gzip_compress(b"hello").unwrap();
        assert!(has_canonical_gzip_header(&compressed));
        assert_eq!(gzip_decompress(&compressed).unwrap(), b"hello");
    }

    #[test]
    fn test_empty_plaintext_is_well_defined() {
        let plain = encode_entry(b"", None).unwrap();
        assert!(plain.stored.len() >= MIN_GZIP_SIZE);
        assert_eq!(
            plain.hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(decode_entry(&plain.stored, None).unwrap(), b"");

        let key = test_key();
        let encrypted = encode_entry(b"", Some(&key)).unwrap();
        assert_eq!(encrypted.stored.len() % IV_SIZE, 0);
        assert_eq!(encrypted.hash, plain.hash);
        assert_eq!(decode_entry(&encrypted.stored, Some(&key)).unwrap(), b"");
    }

    #[test]
    fn test_hash_covers_plaintext_not_stored_bytes() {
        let encoded = encode_entry(b"world!!", Some(&test_key())).unwrap();
        assert_eq!(encoded.hash, sha256_hex(b"world!!"));
        assert_ne!(encoded.hash, sha256_hex(&encoded.stored));
    }

    #[test]
    fn test_encrypted_roundtrip() {
        let key = test_key();
        let data = b"Secret asset data ".repeat(50);
        let encoded = encode_entry(&data, Some(&key)).unwrap();
        assert!(!has_canonical_gzip_header(&encoded.stored));
        assert_eq!(decode_entry(&encoded.stored, Some(&key)).unwrap(), data);
    }

    #[test]
    fn test_wrong_key_never_returns_plaintext() {
        let data = b"Secret asset data".to_vec();
        let encoded = encode_entry(&data, Some(&test_key())).unwrap();
        let wrong = EncryptionKey::new([0x99; KEY_SIZE], [0x24; IV_SIZE]);

        match decode_entry(&encoded.stored, Some(&wrong)) {
            Err(e) => assert!(e.is_decryption(), "unexpected error: {:?}", e),
            Ok(bytes) => assert!(!verify_entry(&bytes, &encoded.hash)),
        }
    }

    #[test]
    fn test_decrypt_rejects_partial_block() {
        let key = test_key();
        let result = key.decrypt(&[0u8; 15]);
        assert!(matches!(result, Err(PakError::DecryptionFailed(_))));
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        assert!(gzip_decompress(b"").is_err());
        assert!(gzip_decompress(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let hash = sha256_hex(b"hello").to_uppercase();
        assert!(verify_entry(b"hello", &hash));
        assert!(!verify_entry(b"hellO", &hash));
    }

    #[test]
    fn test_key_from_slices() {
        assert!(EncryptionKey::from_slices(&[1u8; 32], &[2u8; 16]).is_ok());
        assert!(EncryptionKey::from_slices(&[1u8; 16], &[2u8; 16]).is_err());
        assert!(EncryptionKey::from_slices(&[1u8; 32], &[2u8; 8]).is_err());
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let rendered = format!("{:?}", test_key());
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains("66")); // 0x42
    }
}
