//! Corruption taxonomy for region, chunk payload and NBT decoding.
//!
//! Every failure is classified at the layer that detected it:
//! - [`CorruptRegionError`]: container header or index entry is malformed
//! - [`CorruptChunkError`]: a payload could not be decompressed
//! - [`CorruptNbtError`]: the tag tree itself is malformed
//!
//! All three are cases of [`CorruptionError`], so callers can match broadly
//! on the category or narrowly on one layer.

use std::fmt;

use thiserror::Error;

use crate::compression::Compression;
use crate::nbt::TagKind;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error: either the OS refused us, or the data is corrupt.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Corrupt(#[from] CorruptionError),
}

impl Error {
    /// The corruption, if this error is one.
    pub fn corruption(&self) -> Option<&CorruptionError> {
        match self {
            Error::Corrupt(c) => Some(c),
            Error::Io(_) => None,
        }
    }
}

impl From<CorruptRegionError> for Error {
    fn from(e: CorruptRegionError) -> Self {
        Error::Corrupt(CorruptionError::Region(e))
    }
}

/// Which layer a [`CorruptionError`] was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    Region,
    Chunk,
    Nbt,
}

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLocation {
    /// Local chunk coordinates (0-31) inside a region file.
    Chunk { x: i32, z: i32 },
    /// A file outside any container, e.g. `level.dat`.
    Standalone,
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLocation::Chunk { x, z } => write!(f, "chunk ({}, {})", x, z),
            DataLocation::Standalone => f.write_str("standalone data"),
        }
    }
}

/// The shared corruption category.
#[derive(Debug, Error)]
pub enum CorruptionError {
    #[error("corrupt region: {0}")]
    Region(#[from] CorruptRegionError),

    #[error("corrupt payload in {location}: {source}")]
    Chunk {
        location: DataLocation,
        #[source]
        source: CorruptChunkError,
    },

    #[error("corrupt NBT in {location}: {source}")]
    Nbt {
        location: DataLocation,
        #[source]
        source: CorruptNbtError,
    },
}

impl CorruptionError {
    pub fn kind(&self) -> CorruptionKind {
        match self {
            CorruptionError::Region(_) => CorruptionKind::Region,
            CorruptionError::Chunk { .. } => CorruptionKind::Chunk,
            CorruptionError::Nbt { .. } => CorruptionKind::Nbt,
        }
    }

    pub(crate) fn chunk(location: DataLocation, source: CorruptChunkError) -> Self {
        CorruptionError::Chunk { location, source }
    }

    pub(crate) fn nbt(location: DataLocation, source: CorruptNbtError) -> Self {
        CorruptionError::Nbt { location, source }
    }
}

/// Container-level corruption. Offsets are absolute byte offsets in the file,
/// coordinates are local (0-31).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorruptRegionError {
    #[error("file is {len} bytes, shorter than the 8192 byte header")]
    HeaderTooShort { len: u64 },

    #[error("chunk ({x}, {z}) points at sector {sector}, inside the header")]
    EntryInHeader {
        x: i32,
        z: i32,
        sector: u32,
    },

    #[error("chunk ({x}, {z}) spans bytes {offset}..{end}, past end of file ({file_len} bytes)")]
    EntryOutOfBounds {
        x: i32,
        z: i32,
        offset: u64,
        end: u64,
        file_len: u64,
    },

    #[error("chunks {first:?} and {second:?} both claim sector {sector}")]
    SectorOverlap {
        first: (i32, i32),
        second: (i32, i32),
        sector: u32,
    },

    #[error("chunk ({x}, {z}) at byte {offset} declares invalid length {length}")]
    InvalidChunkLength {
        x: i32,
        z: i32,
        offset: u64,
        length: u32,
    },

    #[error("chunk ({x}, {z}) length {length} does not fit its {sectors} sector(s)")]
    ChunkExceedsSectors {
        x: i32,
        z: i32,
        length: u32,
        sectors: u8,
    },

    #[error("chunk ({x}, {z}) payload ends at byte {end}, past end of file ({file_len} bytes)")]
    ChunkOutOfBounds {
        x: i32,
        z: i32,
        offset: u64,
        end: u64,
        file_len: u64,
    },
}

/// Payload-level corruption: the bytes could not be turned into an NBT buffer.
#[derive(Debug, Error)]
pub enum CorruptChunkError {
    #[error("unknown compression type: {marker}")]
    UnknownCompression { marker: u8 },

    #[error("{compression} stream ended early after {consumed} bytes ({produced} inflated)")]
    Truncated {
        compression: Compression,
        consumed: u64,
        produced: u64,
    },

    #[error("{compression} stream failed to inflate: {source}")]
    Inflate {
        compression: Compression,
        #[source]
        source: std::io::Error,
    },
}

/// Tree-level corruption, with the buffer cursor at which it was detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at byte {offset}")]
pub struct CorruptNbtError {
    pub offset: usize,
    pub kind: NbtErrorKind,
}

impl CorruptNbtError {
    pub fn new(offset: usize, kind: NbtErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NbtErrorKind {
    #[error("unexpected end of data (needed {needed} bytes, {remaining} left)")]
    UnexpectedEof {
        needed: usize,
        remaining: usize,
    },

    #[error("invalid tag kind {0}")]
    InvalidTagKind(u8),

    #[error("invalid list element kind {0}")]
    InvalidListKind(u8),

    #[error("list of End tags declares {len} elements")]
    NonEmptyEndList { len: i32 },

    #[error("negative array length {0}")]
    NegativeLength(i32),

    /// Names and strings are decoded as strict UTF-8. Java's modified UTF-8
    /// (supplementary characters as CESU-8 surrogate pairs, NUL as `C0 80`)
    /// is not accepted and lands here.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("duplicate name {0:?} in compound")]
    DuplicateName(String),

    #[error("nesting deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("root tag is {0:?}, expected Compound")]
    RootNotCompound(TagKind),
}
