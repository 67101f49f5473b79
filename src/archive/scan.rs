//! Read one balanced top-level JSON object from a stream with no length prefix
//!
//! The envelope sits between the magic token and the data section, so its end
//! is found by tracking brace depth byte by byte. Braces inside string literals
//! (including escaped quotes) do not count towards the depth.

use crate::error::{PakError, Result};
use std::io::Read;

/// Result of a successful scan
#[derive(Debug, Clone)]
pub struct ScannedObject {
    /// The object text, from the opening `{` to the matching `}` inclusive
    pub text: Vec<u8>,
    /// Bytes consumed from the stream, including skipped leading whitespace
    pub consumed: u64,
}

/// Consume bytes up to and including the `}` that closes the first object.
///
/// Leading ASCII whitespace is skipped. Fails with `MalformedArchive` if the first
/// non-whitespace byte is not `{`, if the stream ends before the object closes,
/// or if more than `limit` bytes (skipped whitespace included) would be consumed.
pub fn read_balanced_object<R: Read>(reader: R, limit: usize) -> Result<ScannedObject> {
    let mut text = Vec::new();
    let mut consumed: u64 = 0;
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for byte in reader.bytes() {
        let byte = byte?;
        if consumed >= limit as u64 {
            return Err(PakError::MalformedArchive(format!(
                "header exceeds {} bytes",
                limit
            )));
        }
        consumed += 1;

        if depth == 0 {
            // Nothing captured yet
            if byte.is_ascii_whitespace() {
                continue;
            }
            if byte != b'{' {
                return Err(PakError::MalformedArchive(format!(
                    "expected '{{' at start of header, found byte 0x{:02x}",
                    byte
                )));
            }
        }

        text.push(byte);

        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(ScannedObject { text, consumed });
                }
            }
            _ => {}
        }
    }

    Err(PakError::MalformedArchive(
        "unterminated header: stream ended inside the envelope".to_string(),
    ))
}
