//! Random-access reader over one region file.
//!
//! Only the 8KB header is read at open time. Each chunk request seeks to the
//! chunk's sector, reads its 5 byte prefix and then exactly the payload, so a
//! reader never touches bytes outside `[0, file_len)`.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use super::{chunk_index, index_to_local, RegionHeader, CHUNK_HEADER_SIZE, HEADER_SIZE};
use crate::chunk::ChunkPayload;
use crate::error::{CorruptRegionError, Result};
use crate::nbt::{ParserConfig, Tag};

/// An open region file with its header loaded.
///
/// The header is immutable after open. Chunk reads need `&mut self` because
/// they move the underlying cursor; use one `RegionFile` per worker, or read
/// payloads on one thread and decode them elsewhere.
pub struct RegionFile<R = File> {
    source: R,
    file_len: u64,
    header: RegionHeader,
    config: ParserConfig,
}

impl RegionFile<File> {
    /// Open a region file and validate its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, ParserConfig::default())
    }

    pub fn open_with(path: impl AsRef<Path>, config: ParserConfig) -> Result<Self> {
        let path = path.as_ref();
        let region = Self::from_reader(File::open(path)?)?.with_config(config);
        log::debug!(
            "Opened region {} ({} bytes, {} chunks)",
            path.display(),
            region.file_len,
            region.header.present().count()
        );
        Ok(region)
    }
}

impl<R: Read + Seek> RegionFile<R> {
    /// Treat any seekable byte source as a region file.
    pub fn from_reader(mut source: R) -> Result<Self> {
        let file_len = source.seek(SeekFrom::End(0))?;
        if file_len < HEADER_SIZE as u64 {
            return Err(CorruptRegionError::HeaderTooShort { len: file_len }.into());
        }

        source.seek(SeekFrom::Start(0))?;
        let mut raw = vec![0u8; HEADER_SIZE];
        source.read_exact(&mut raw).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                crate::Error::from(CorruptRegionError::HeaderTooShort { len: file_len })
            }
            _ => crate::Error::Io(e),
        })?;

        let header = RegionHeader::parse(&raw)?;
        header.validate(file_len)?;

        Ok(Self {
            source,
            file_len,
            header,
            config: ParserConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn header(&self) -> &RegionHeader {
        &self.header
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Local `(x, z)` of every present chunk, in index order.
    pub fn chunks(&self) -> Vec<(i32, i32)> {
        self.header
            .present()
            .map(|(index, _)| index_to_local(index))
            .collect()
    }

    /// Coordinates wrap into the region, like [`RegionFile::read_chunk`].
    pub fn chunk_exists(&self, x: i32, z: i32) -> bool {
        self.header.location(chunk_index(x, z)).is_present()
    }

    /// Last-modified seconds of a slot. Meaningless for absent chunks.
    pub fn timestamp(&self, x: i32, z: i32) -> u32 {
        self.header.timestamp(chunk_index(x, z))
    }

    /// Read a chunk and return its root compound, or `None` if the slot is
    /// empty. `x` and `z` are taken modulo 32, so world chunk coordinates work.
    pub fn read_chunk(&mut self, x: i32, z: i32) -> Result<Option<Tag>> {
        Ok(self.load_chunk_named(x, z)?.map(|(_, root)| root))
    }

    /// Like [`RegionFile::read_chunk`], but keeps the root tag's name.
    pub fn load_chunk_named(&mut self, x: i32, z: i32) -> Result<Option<(String, Tag)>> {
        let Some(payload) = self.read_chunk_payload(x, z)? else {
            return Ok(None);
        };
        Ok(Some(payload.decode_named(self.config)?))
    }

    /// Cut one chunk's compressed payload out of the file without decoding it.
    pub fn read_chunk_payload(&mut self, x: i32, z: i32) -> Result<Option<ChunkPayload>> {
        let index = chunk_index(x, z);
        let (x, z) = index_to_local(index);
        let location = self.header.location(index);
        if !location.is_present() {
            return Ok(None);
        }

        // validate() already placed the 5 byte prefix inside the file
        let offset = location.byte_offset();
        let mut prefix = [0u8; CHUNK_HEADER_SIZE];
        self.read_at(offset, &mut prefix, x, z)?;

        // Length includes the compression byte
        let length = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        let marker = prefix[4];
        if length == 0 {
            return Err(CorruptRegionError::InvalidChunkLength {
                x,
                z,
                offset,
                length,
            }
            .into());
        }

        let end = offset + 4 + length as u64;
        if end > self.file_len {
            return Err(CorruptRegionError::ChunkOutOfBounds {
                x,
                z,
                offset,
                end,
                file_len: self.file_len,
            }
            .into());
        }
        if 4 + length as u64 > location.byte_len() {
            return Err(CorruptRegionError::ChunkExceedsSectors {
                x,
                z,
                length,
                sectors: location.sector_count(),
            }
            .into());
        }

        let mut data = vec![0u8; length as usize - 1];
        self.read_at(offset + CHUNK_HEADER_SIZE as u64, &mut data, x, z)?;

        log::trace!(
            "Read chunk ({}, {}) at byte {}: {} bytes, compression {}",
            x,
            z,
            offset,
            length,
            marker
        );
        Ok(Some(ChunkPayload { x, z, marker, data }))
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8], x: i32, z: i32) -> Result<()> {
        self.source.seek(SeekFrom::Start(offset))?;
        self.source.read_exact(buf).map_err(|e| match e.kind() {
            // the file shrank underneath us
            io::ErrorKind::UnexpectedEof => {
                crate::Error::from(CorruptRegionError::ChunkOutOfBounds {
                    x,
                    z,
                    offset,
                    end: offset + buf.len() as u64,
                    file_len: self.file_len,
                })
            }
            _ => crate::Error::Io(e),
        })
    }
}
