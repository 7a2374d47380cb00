//! Region file header parsing.
//!
//! The header consists of two tables:
//! - Location table: where each chunk is stored
//! - Timestamp table: when each chunk was last saved
//!
//! It is read once when a region is opened and never changes afterwards.

use super::{
    index_to_local, sector_to_offset, CHUNKS_PER_REGION, CHUNK_HEADER_SIZE, HEADER_SECTORS,
    HEADER_SIZE, SECTOR_SIZE,
};
use crate::error::CorruptRegionError;

/// One location table entry: `[offset: 3 bytes][count: 1 byte]`, big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    /// Offset in 4KiB sectors from the start of the file. 0 means absent.
    sector_offset: u32,
    /// How many sectors the chunk occupies. Max of 255 sectors.
    sector_count: u8,
}

impl Location {
    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self {
            sector_offset: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
            sector_count: bytes[3],
        }
    }

    pub fn new(sector_offset: u32, sector_count: u8) -> Self {
        Self {
            sector_offset: sector_offset & 0xFF_FFFF,
            sector_count,
        }
    }

    pub fn is_present(&self) -> bool {
        self.sector_offset != 0
    }

    pub fn sector_offset(&self) -> u32 {
        self.sector_offset
    }

    pub fn sector_count(&self) -> u8 {
        self.sector_count
    }

    /// Absolute byte offset of the chunk's length prefix.
    pub fn byte_offset(&self) -> u64 {
        sector_to_offset(self.sector_offset)
    }

    /// Bytes reserved for the chunk by its sector count.
    pub fn byte_len(&self) -> u64 {
        self.sector_count as u64 * SECTOR_SIZE as u64
    }
}

/// The location and timestamp tables of one region file.
#[derive(Debug, Clone)]
pub struct RegionHeader {
    locations: Vec<Location>,
    timestamps: Vec<u32>,
}

impl RegionHeader {
    /// Parse the first 8192 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, CorruptRegionError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CorruptRegionError::HeaderTooShort {
                len: bytes.len() as u64,
            });
        }
        let (location_table, rest) = bytes.split_at(SECTOR_SIZE);
        let timestamp_table = &rest[..SECTOR_SIZE];

        let locations = location_table
            .chunks_exact(4)
            .map(|b| Location::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let timestamps = timestamp_table
            .chunks_exact(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self {
            locations,
            timestamps,
        })
    }

    /// Check every present entry against a file of `file_len` bytes.
    ///
    /// Each entry must start after the header, its length prefix and
    /// compression marker must lie inside the file, and no two entries may
    /// claim the same sector.
    pub fn validate(&self, file_len: u64) -> Result<(), CorruptRegionError> {
        let mut spans = Vec::new();
        for (index, location) in self.present() {
            let (x, z) = index_to_local(index);
            if location.sector_offset < HEADER_SECTORS {
                return Err(CorruptRegionError::EntryInHeader {
                    x,
                    z,
                    sector: location.sector_offset,
                });
            }
            let offset = location.byte_offset();
            let end = offset + CHUNK_HEADER_SIZE as u64;
            if end > file_len {
                return Err(CorruptRegionError::EntryOutOfBounds {
                    x,
                    z,
                    offset,
                    end,
                    file_len,
                });
            }
            // a present chunk owns at least the sector holding its prefix
            let sectors = location.sector_count.max(1) as u32;
            let start = location.sector_offset;
            spans.push((start, start + sectors, index));
        }

        spans.sort_unstable();
        for pair in spans.windows(2) {
            let (_, prev_end, prev_index) = pair[0];
            let (start, _, index) = pair[1];
            if start < prev_end {
                return Err(CorruptRegionError::SectorOverlap {
                    first: index_to_local(prev_index),
                    second: index_to_local(index),
                    sector: start,
                });
            }
        }
        Ok(())
    }

    pub fn location(&self, index: usize) -> Location {
        self.locations[index % CHUNKS_PER_REGION]
    }

    /// Last modification time of a slot, in epoch seconds.
    pub fn timestamp(&self, index: usize) -> u32 {
        self.timestamps[index % CHUNKS_PER_REGION]
    }

    /// Present slots in index order.
    pub fn present(&self) -> impl Iterator<Item = (usize, Location)> + '_ {
        self.locations
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, l)| l.is_present())
    }
}
