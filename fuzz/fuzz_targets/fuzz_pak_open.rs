#![no_main]

use assetpak::{EncryptionKey, PakReader};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

/// Key used by the encrypted seeds in the corpus
const SEED_KEY: [u8; 32] = [0x42; 32];
const SEED_IV: [u8; 16] = [0x17; 16];

fuzz_target!(|data: &[u8]| {
    // Plain open, then keyed open; neither may panic
    for key in [None, Some(EncryptionKey::new(SEED_KEY, SEED_IV))] {
        let reader = match PakReader::from_stream(Cursor::new(data.to_vec()), key) {
            Ok(r) => r,
            Err(_) => continue, // Expected for invalid data
        };

        let paths: Vec<String> = reader.list_entries().iter().map(|p| p.to_string()).collect();

        for path in &paths {
            let _ = reader.get(path, false);
            let _ = reader.get(path, true);
        }

        let _ = reader.exists("");
        let _ = reader.exists("/");
        let _ = reader.get("/../../etc/passwd", true);
        let _ = reader.verify_all();
    }
});
