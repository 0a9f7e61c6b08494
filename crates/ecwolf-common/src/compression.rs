// compression.rs — raw deflate for save-game bodies
//
// Save bodies are stored as raw deflate (no zlib header). Decompression is
// bounded so a damaged or hostile file cannot exhaust memory.

use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;
use std::io::Read;

/// Largest body a save file may inflate to.
pub const MAX_DECOMPRESS_SIZE: usize = 64 * 1024 * 1024;

/// Compress data unconditionally using raw deflate.
pub fn compress_data(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut encoder = DeflateEncoder::new(data, Compression::default());
    let mut compressed = Vec::with_capacity(data.len() / 2 + 16);

    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| format!("Compression failed: {}", e))?;

    Ok(compressed)
}

/// Decompress raw deflate data whose inflated size is known up front.
///
/// Fails when the size exceeds `MAX_DECOMPRESS_SIZE`, when the stream is
/// corrupt, or when the inflated length differs from `expected_size`.
pub fn decompress_with_size(data: &[u8], expected_size: usize) -> Result<Vec<u8>, String> {
    if expected_size > MAX_DECOMPRESS_SIZE {
        return Err(format!(
            "Uncompressed size {} exceeds maximum {}",
            expected_size, MAX_DECOMPRESS_SIZE
        ));
    }

    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::with_capacity(expected_size);

    // Read in chunks so an understated size cannot balloon the buffer.
    let mut buffer = [0u8; 8192];
    loop {
        let n = decoder
            .read(&mut buffer)
            .map_err(|e| format!("Decompression failed: {}", e))?;
        if n == 0 {
            break;
        }
        if decompressed.len() + n > expected_size {
            return Err(format!(
                "Size mismatch: expected {}, got more",
                expected_size
            ));
        }
        decompressed.extend_from_slice(&buffer[..n]);
    }

    if decompressed.len() != expected_size {
        return Err(format!(
            "Size mismatch: expected {}, got {}",
            expected_size,
            decompressed.len()
        ));
    }

    Ok(decompressed)
}
