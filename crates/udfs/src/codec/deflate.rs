//! DEFLATE compress/decompress of nullable text.

use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::UdfError;
use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};

/// Growth step for the inflate output buffer.
const CHUNK_LEN: usize = 4096;

/// Compress `input` and Base64-encode the resulting stream.
///
/// A `None` input returns `None`.
///
/// # Errors
///
/// Returns [`UdfError::Internal`] if the encoder fails; writing into an
/// in-memory buffer does not fail in practice.
pub fn compress(input: Option<&str>) -> Result<Option<String>, UdfError> {
    let Some(input) = input else {
        return Ok(None);
    };

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(input.len()), Compression::default());
    encoder
        .write_all(input.as_bytes())
        .map_err(|e| UdfError::Internal(format!("deflate failed: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| UdfError::Internal(format!("deflate failed: {e}")))?;

    Ok(Some(STANDARD.encode(compressed)))
}

/// Base64-decode `input`, inflate it to completion, and return the UTF-8 text.
///
/// A `None` input returns `None`.
///
/// # Errors
///
/// Returns [`UdfError::MalformedCompressedData`] for invalid Base64, an
/// invalid or truncated DEFLATE stream, or bytes that are not UTF-8.
pub fn decompress(input: Option<&str>) -> Result<Option<String>, UdfError> {
    let Some(input) = input else {
        return Ok(None);
    };

    let bytes = STANDARD
        .decode(input)
        .map_err(|e| malformed(format!("invalid Base64: {e}")))?;

    let inflated = if has_zlib_header(&bytes) {
        // A raw stream can start with bytes that pass the header check.
        inflate(&bytes, true).or_else(|err| inflate(&bytes, false).map_err(|_| err))?
    } else {
        inflate(&bytes, false)?
    };

    String::from_utf8(inflated)
        .map(Some)
        .map_err(|_| malformed("decompressed bytes are not valid UTF-8"))
}

/// RFC 1950 header check: deflate method, window <= 32K, no preset dictionary,
/// and `CMF*256 + FLG` divisible by 31.
fn has_zlib_header(bytes: &[u8]) -> bool {
    match bytes {
        [cmf, flg, ..] => {
            cmf & 0x0F == 8
                && cmf >> 4 <= 7
                && flg & 0x20 == 0
                && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

/// Drive the inflater until it reports end of stream.
///
/// Stalling with all input consumed means the stream is truncated. Bytes after
/// the end of the stream are ignored.
fn inflate(bytes: &[u8], zlib_header: bool) -> Result<Vec<u8>, UdfError> {
    let mut inflater = Decompress::new(zlib_header);
    let mut out = Vec::with_capacity(bytes.len().saturating_mul(2).max(CHUNK_LEN));

    loop {
        if out.len() == out.capacity() {
            out.reserve(CHUNK_LEN);
        }
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();

        let status = inflater
            .decompress_vec(&bytes[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| malformed(format!("invalid deflate stream: {e}")))?;

        if matches!(status, Status::StreamEnd) {
            return Ok(out);
        }

        let stalled = inflater.total_in() as usize == consumed && inflater.total_out() == produced;
        if stalled {
            return Err(if consumed == bytes.len() {
                malformed("input is truncated")
            } else {
                malformed("deflate stream made no progress")
            });
        }
    }
}

fn malformed(message: impl Into<String>) -> UdfError {
    UdfError::MalformedCompressedData(message.into())
}
