//! Generate seed corpus for fuzzing

use assetpak::{create_pak, EncryptionKey, PakWriter};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_pak_open";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    let seeds: Vec<(&str, Vec<u8>)> = vec![
        // Empty archive (no entries)
        ("seed_empty.pak", PakWriter::new().finish()?),
        // Single small entry
        ("seed_single_small.pak", create_pak(vec![("/test.txt", "Hello, World!")], None)?),
        // Nested paths
        (
            "seed_multi.pak",
            create_pak(
                vec![
                    ("/file1.txt", "First file"),
                    ("/file2.txt", "Second file"),
                    ("/dir/file3.txt", "Third file in directory"),
                ],
                None,
            )?,
        ),
        // Compressible payload
        (
            "seed_large.pak",
            create_pak(
                vec![("/large.txt", b"This is test data for compression. ".repeat(1000))],
                None,
            )?,
        ),
        // Zero-length entry
        ("seed_zero_length.pak", create_pak(vec![("/empty.txt", "")], None)?),
        // Encrypted, matching the key the fuzz target tries
        (
            "seed_encrypted.pak",
            create_pak(
                vec![("/secret.bin", (0..=255u8).collect::<Vec<u8>>())],
                Some(&EncryptionKey::new([0x42; 32], [0x17; 16])),
            )?,
        ),
    ];

    for (name, buffer) in &seeds {
        let path = format!("{}/{}", corpus_dir, name);
        fs::write(&path, buffer)?;
        println!("Generated: {}", path);
    }

    println!("\nGenerated {} seed files in {}", seeds.len(), corpus_dir);
    Ok(())
}
