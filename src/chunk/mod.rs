//! Chunk payloads and their decode pipeline.
//!
//! A [`ChunkPayload`] is the raw compressed blob of one chunk, already cut
//! out of its region file. It owns its bytes, so payloads read on one thread
//! can be decoded on another:
//! 1. decompress according to the compression marker
//! 2. parse the resulting buffer as NBT

use crate::compression;
use crate::error::{CorruptionError, DataLocation};
use crate::nbt::{self, ParserConfig, Tag};

/// One chunk's compressed payload: `[Length: 4][Type: 1][Data...]` minus the
/// length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPayload {
    /// Local x (0-31).
    pub x: i32,
    /// Local z (0-31).
    pub z: i32,
    /// Raw compression marker byte, validated only on decompression.
    pub marker: u8,
    pub data: Vec<u8>,
}

impl ChunkPayload {
    pub fn location(&self) -> DataLocation {
        DataLocation::Chunk {
            x: self.x,
            z: self.z,
        }
    }

    /// Inflate the payload into an NBT buffer.
    pub fn decompress(&self) -> Result<Vec<u8>, CorruptionError> {
        compression::decompress(&self.data, self.marker)
            .map_err(|e| CorruptionError::chunk(self.location(), e))
    }

    /// Decompress and parse, returning the root compound.
    pub fn decode(&self, config: ParserConfig) -> Result<Tag, CorruptionError> {
        self.decode_named(config).map(|(_, root)| root)
    }

    /// Decompress and parse, returning the root name and compound.
    pub fn decode_named(&self, config: ParserConfig) -> Result<(String, Tag), CorruptionError> {
        let nbt_bytes = self.decompress()?;
        nbt::parse_named_with(&nbt_bytes, config)
            .map_err(|e| CorruptionError::nbt(self.location(), e))
    }
}
