//! Zlib adapter over byte buffers.
//!
//! Both directions use the zlib wrapper format, not raw deflate. `inflate`
//! consumes exactly one compressed stream and ignores any trailing bytes in
//! the input, which is what pack entry decoding relies on.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Decompress a zlib stream, returning the full uncompressed content.
pub fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Compress bytes into a zlib stream at the given level.
pub fn deflate(data: &[u8], level: Compression) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    encoder.finish()
}
