mod codec;
mod format;
mod index;
mod reader;
mod scan;
mod source;
mod writer;

pub use codec::{
    decode_entry, encode_entry, gzip_compress, gzip_decompress, sha256_hex, verify_entry,
    EncodedEntry, EncryptionKey, CANONICAL_GZIP_HEADER, IV_SIZE, KEY_SIZE,
    MAX_DECOMPRESSION_SIZE,
};
pub use format::{
    Entry, Envelope, FORMAT_VERSION, MAGIC_BYTES, MAGIC_SIZE, MAX_HEADER_SIZE,
};
pub use index::HeaderIndex;
pub use reader::PakReader;
pub use scan::{read_balanced_object, ScannedObject};
pub use source::read_entries;
pub use writer::{create_pak, create_pak_from_dir, PakWriter};
