use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZLIB_MAGICS: [[u8; 2]; 3] = [[0x78, 0x01], [0x78, 0x9c], [0x78, 0xda]];

/// Safely decompresses a response body if it is gzip/deflate compressed, using both the
/// `Content-Encoding` header and magic-byte sniffing independently. Some providers send
/// compressed bodies without the header, which otherwise surfaces as a UTF-8 decode error
/// deep inside JSON parsing instead of a clear decoding failure.
pub fn maybe_decompress(body: &[u8], content_encoding: Option<&str>) -> Result<Vec<u8>, DecodeError> {
    let encoding = content_encoding.unwrap_or("").to_lowercase();

    if encoding.contains("gzip") {
        return gunzip(body);
    }
    if encoding.contains("deflate") {
        return inflate(body);
    }
    if body.starts_with(&GZIP_MAGIC) {
        return gunzip(body);
    }
    if ZLIB_MAGICS.iter().any(|m| body.starts_with(m)) {
        return inflate(body);
    }
    Ok(body.to_vec())
}

fn gunzip(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::Gzip(e.to_string()))?;
    Ok(out)
}

/// Zlib-wrapped deflate first (the common case), falling back to raw deflate if the
/// stream has no zlib header.
fn inflate(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    if ZlibDecoder::new(body).read_to_end(&mut out).is_ok() && !out.is_empty() {
        return Ok(out);
    }
    out.clear();
    DeflateDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::Deflate(e.to_string()))?;
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("gzip decode failed: {0}")]
    Gzip(String),
    #[error("deflate decode failed: {0}")]
    Deflate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn passes_through_uncompressed_json() {
        let body = br#"{"results":[]}"#;
        let out = maybe_decompress(body, None).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn decompresses_gzip_by_header() {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"hello").unwrap();
        let compressed = enc.finish().unwrap();
        let out = maybe_decompress(&compressed, Some("gzip")).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn decompresses_gzip_by_magic_bytes_without_header() {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"sniffed").unwrap();
        let compressed = enc.finish().unwrap();
        let out = maybe_decompress(&compressed, None).unwrap();
        assert_eq!(out, b"sniffed");
    }

    #[test]
    fn decompresses_zlib_by_magic_bytes() {
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"zlib body").unwrap();
        let compressed = enc.finish().unwrap();
        let out = maybe_decompress(&compressed, None).unwrap();
        assert_eq!(out, b"zlib body");
    }
}
