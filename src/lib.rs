//! mca-core: read-only decoding of Minecraft world data.
//!
//! Three layers, each depending only on the one below:
//! - [`region`]: opens a region file, loads its index and cuts chunk payloads out
//! - [`compression`]: inflates a payload (gzip, zlib or uncompressed)
//! - [`nbt`]: decodes the NBT tree into an owned [`Tag`]
//!
//! Failures are reported as one of three [`CorruptionError`] cases, named
//! after the layer that detected them.
//!
//! ```no_run
//! let mut region = mca_core::open_container("world/region/r.0.0.mca")?;
//! if let Some(chunk) = mca_core::read_chunk(&mut region, 3, 7)? {
//!     println!("{:?}", chunk.get_path("Status"));
//! }
//! # Ok::<(), mca_core::Error>(())
//! ```

pub mod chunk;
pub mod compression;
pub mod error;
pub mod json;
pub mod nbt;
pub mod region;

use std::io::{Read, Seek};
use std::path::Path;

pub use chunk::ChunkPayload;
pub use compression::Compression;
pub use error::{
    CorruptChunkError, CorruptNbtError, CorruptRegionError, CorruptionError, CorruptionKind,
    DataLocation, Error, NbtErrorKind, Result,
};
pub use nbt::{Compound, List, ParserConfig, Tag, TagKind};
pub use region::{ChunkPos, RegionFile, RegionPos};

/// Open a region file. Fails if it is shorter than its header or if any
/// index entry points outside the file.
pub fn open_container(path: impl AsRef<Path>) -> Result<RegionFile> {
    RegionFile::open(path)
}

/// Read and decode one chunk. `None` if the slot is empty.
pub fn read_chunk<R: Read + Seek>(
    handle: &mut RegionFile<R>,
    x: i32,
    z: i32,
) -> Result<Option<Tag>> {
    handle.read_chunk(x, z)
}

/// Decode a standalone NBT file such as `level.dat`, gzip-wrapped or raw.
pub fn parse_standalone(bytes: &[u8]) -> std::result::Result<Tag, CorruptionError> {
    parse_standalone_named(bytes, ParserConfig::default())
        .map(|(_, root)| root)
}

/// Like [`parse_standalone`], with the root name and an explicit parser config.
pub fn parse_standalone_named(
    bytes: &[u8],
    config: ParserConfig,
) -> std::result::Result<(String, Tag), CorruptionError> {
    let nbt_bytes = compression::decompress_standalone(bytes)
        .map_err(|e| CorruptionError::chunk(DataLocation::Standalone, e))?;
    nbt::parse_named_with(&nbt_bytes, config)
        .map_err(|e| CorruptionError::nbt(DataLocation::Standalone, e))
}

/// Read a standalone NBT file from disk.
pub fn load(path: impl AsRef<Path>) -> Result<Tag> {
    let bytes = std::fs::read(path)?;
    Ok(parse_standalone(&bytes)?)
}
