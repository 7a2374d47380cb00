//! Chunk payload decompression.
//!
//! Region files tag each chunk payload with a one byte compression marker:
//! 1 = GZip (rarely used), 2 = Zlib (the default), 3 = uncompressed.
//! Standalone files such as `level.dat` are usually gzip-wrapped as a whole.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read};

use flate2::bufread::GzDecoder;
use flate2::{Decompress, FlushDecompress, Status};
use num_enum::TryFromPrimitive;

use crate::error::CorruptChunkError;

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Initial output reservation when the ratio is unknown.
const MIN_OUTPUT_CAPACITY: usize = 16 * 1024;

/// Compression markers used in the Anvil format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Compression {
    Gzip = 1,
    Zlib = 2,
    None = 3,
}

impl Compression {
    pub fn from_marker(marker: u8) -> Result<Self, CorruptChunkError> {
        Self::try_from(marker)
            .map_err(|_| CorruptChunkError::UnknownCompression { marker })
    }

    pub fn marker(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::Gzip => "gzip",
            Compression::Zlib => "zlib",
            Compression::None => "uncompressed",
        })
    }
}

/// Decompress a chunk payload tagged with `marker`.
///
/// Either the whole stream inflates and verifies, or an error is returned;
/// a short buffer is never handed out.
pub fn decompress(bytes: &[u8], marker: u8) -> Result<Vec<u8>, CorruptChunkError> {
    match Compression::from_marker(marker)? {
        Compression::Gzip => gunzip(bytes),
        Compression::Zlib => inflate_zlib(bytes),
        Compression::None => Ok(bytes.to_vec()),
    }
}

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Unwrap a standalone NBT file: gunzip it if it carries the gzip magic,
/// otherwise hand the bytes back untouched.
pub fn decompress_standalone(bytes: &[u8]) -> Result<Cow<'_, [u8]>, CorruptChunkError> {
    if is_gzip(bytes) {
        log::debug!("standalone payload is gzip-wrapped ({} bytes)", bytes.len());
        gunzip(bytes).map(Cow::Owned)
    } else {
        log::debug!("standalone payload is raw NBT ({} bytes)", bytes.len());
        Ok(Cow::Borrowed(bytes))
    }
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, CorruptChunkError> {
    // the decoder checks the CRC32/ISIZE trailer, so truncation surfaces here
    let mut decoder = GzDecoder::new(bytes);
    let mut decompressed = Vec::with_capacity(output_hint(bytes.len()));
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|source| CorruptChunkError::Inflate {
            compression: Compression::Gzip,
            source,
        })?;
    Ok(decompressed)
}

/// Inflate a zlib stream, requiring its end marker and adler32 checksum.
///
/// `flate2::read::ZlibDecoder` reports a clean EOF when the input simply
/// stops, so the stream is driven by hand to tell truncation from success.
fn inflate_zlib(input: &[u8]) -> Result<Vec<u8>, CorruptChunkError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(output_hint(input.len()));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(MIN_OUTPUT_CAPACITY));
        }
        let before = (inflater.total_in(), inflater.total_out());
        let consumed = before.0 as usize;

        let status = inflater
            .decompress_vec(&input[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| CorruptChunkError::Inflate {
                compression: Compression::Zlib,
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })?;

        if status == Status::StreamEnd {
            return Ok(out);
        }
        if (inflater.total_in(), inflater.total_out()) == before {
            return Err(CorruptChunkError::Truncated {
                compression: Compression::Zlib,
                consumed: inflater.total_in(),
                produced: inflater.total_out(),
            });
        }
    }
}

fn output_hint(input_len: usize) -> usize {
    input_len.saturating_mul(4).max(MIN_OUTPUT_CAPACITY)
}
