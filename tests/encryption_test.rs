//! Encryption tests: key handling, wrong keys, codec behaviour under keys

use assetpak::archive::{decode_entry, encode_entry, verify_entry};
use assetpak::{create_pak, EncryptionKey, PakError, PakReader};
use proptest::prelude::*;
use std::io::Cursor;

/// Fixed key for deterministic tests
fn test_key() -> EncryptionKey {
    EncryptionKey::new([0x42; 32], [0x17; 16])
}

/// Different key, same IV
fn different_key() -> EncryptionKey {
    EncryptionKey::new([0x99; 32], [0x17; 16])
}

fn scenario_buffer(key: &EncryptionKey) -> Vec<u8> {
    create_pak(vec![("/a.txt", "hello"), ("/b/c.txt", "world!!")], Some(key)).unwrap()
}

#[test]
fn test_scenario_encrypted_archive() {
    let buffer = scenario_buffer(&test_key());
    let reader = PakReader::from_stream(Cursor::new(buffer), Some(test_key())).unwrap();

    assert!(reader.is_encrypted());
    assert!(reader.exists("/a.txt"));
    assert_eq!(reader.get("/a.txt", true).unwrap(), b"hello");
    assert_eq!(reader.get("/b/c.txt", false).unwrap(), b"world!!");
}

#[test]
fn test_scenario_wrong_key_fails_open() {
    let buffer = scenario_buffer(&test_key());
    let result = PakReader::from_stream(Cursor::new(buffer), Some(different_key()));

    match result {
        Err(PakError::DecryptionFailed(_)) => {}
        other => panic!("Expected DecryptionFailed, got: {:?}", other),
    }
}

#[test]
fn test_wrong_iv_fails_open() {
    let buffer = scenario_buffer(&test_key());
    let wrong_iv = EncryptionKey::new([0x42; 32], [0x18; 16]);
    let result = PakReader::from_stream(Cursor::new(buffer), Some(wrong_iv));
    assert!(result.unwrap_err().is_decryption());
}

#[test]
fn test_missing_key_fails_open() {
    let buffer = scenario_buffer(&test_key());
    let result = PakReader::from_stream(Cursor::new(buffer), None);
    assert!(matches!(result, Err(PakError::MissingDecryptionKey)));
}

#[test]
fn test_key_ignored_for_plain_archive() {
    let buffer = create_pak(vec![("/a.txt", "hello")], None).unwrap();
    let reader = PakReader::from_stream(Cursor::new(buffer), Some(test_key())).unwrap();
    assert!(!reader.is_encrypted());
    assert_eq!(reader.get("/a.txt", true).unwrap(), b"hello");
}

#[test]
fn test_plaintext_not_visible_in_encrypted_buffer() {
    let secret = b"TOP-SECRET-ASSET-CONTENT".repeat(4);
    let buffer = create_pak(vec![("/secret.bin", secret.clone())], Some(&test_key())).unwrap();
    assert!(!buffer
        .windows(b"TOP-SECRET".len())
        .any(|w| w == b"TOP-SECRET"));
    // Paths live inside the encrypted header too
    assert!(!buffer.windows(b"secret.bin".len()).any(|w| w == b"secret.bin"));
}

#[test]
fn test_key_is_not_persisted() {
    let key = test_key();
    let buffer = scenario_buffer(&key);
    assert!(!buffer.windows(32).any(|w| w == [0x42; 32]));
}

#[test]
fn test_same_key_same_output() {
    assert_eq!(scenario_buffer(&test_key()), scenario_buffer(&test_key()));
    assert_ne!(scenario_buffer(&test_key()), scenario_buffer(&different_key()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_codec_roundtrip(
        data in prop::collection::vec(any::<u8>(), 0..2048),
        key in any::<[u8; 32]>(),
        iv in any::<[u8; 16]>(),
    ) {
        let key = EncryptionKey::new(key, iv);
        let encoded = encode_entry(&data, Some(&key)).unwrap();
        prop_assert_eq!(decode_entry(&encoded.stored, Some(&key)).unwrap(), data.clone());

        let plain = encode_entry(&data, None).unwrap();
        prop_assert_eq!(&plain.hash, &encoded.hash);
        prop_assert_eq!(decode_entry(&plain.stored, None).unwrap(), data);
    }

    #[test]
    fn prop_wrong_key_never_yields_plaintext(
        data in prop::collection::vec(any::<u8>(), 0..512),
        key1 in any::<[u8; 32]>(),
        key2 in any::<[u8; 32]>(),
    ) {
        prop_assume!(key1 != key2);
        let iv = [0x5A; 16];
        let encoded = encode_entry(&data, Some(&EncryptionKey::new(key1, iv))).unwrap();

        match decode_entry(&encoded.stored, Some(&EncryptionKey::new(key2, iv))) {
            Err(e) => prop_assert!(e.is_decryption()),
            Ok(bytes) => prop_assert!(!verify_entry(&bytes, &encoded.hash)),
        }
    }
}
