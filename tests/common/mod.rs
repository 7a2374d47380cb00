//! Shared fixtures: chunk structures encoded with fastnbt, and region files
//! assembled byte by byte.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::{GzEncoder, ZlibEncoder};
use serde::Serialize;

pub const SECTOR: usize = 4096;

// --- Chunk structures, shaped like a 1.18+ chunk root ---
#[derive(Debug, Serialize)]
pub struct ChunkData {
    #[serde(rename = "DataVersion")]
    pub data_version: i32,
    #[serde(rename = "xPos")]
    pub x_pos: i32,
    #[serde(rename = "zPos")]
    pub z_pos: i32,
    #[serde(rename = "yPos")]
    pub y_pos: i32,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "LastUpdate")]
    pub last_update: i64,
    #[serde(rename = "InhabitedTime")]
    pub inhabited_time: i64,
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct Section {
    #[serde(rename = "Y")]
    pub y: i8,
    pub block_states: BlockStates,
    pub biomes: Biomes,
}

#[derive(Debug, Serialize)]
pub struct BlockStates {
    pub palette: Vec<BlockState>,
    pub data: fastnbt::LongArray,
}

#[derive(Debug, Serialize)]
pub struct Biomes {
    pub palette: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BlockState {
    #[serde(rename = "Name")]
    pub name: String,
}

pub fn chunk_data(x: i32, z: i32) -> ChunkData {
    ChunkData {
        data_version: 3953,
        x_pos: x,
        z_pos: z,
        y_pos: -4,
        status: "minecraft:full".to_string(),
        last_update: 1200,
        inhabited_time: 0,
        sections: vec![Section {
            y: -4,
            block_states: BlockStates {
                palette: vec![block("minecraft:bedrock"), block("minecraft:stone")],
                data: fastnbt::LongArray::new(vec![0x1111_1111_1111_1111, -1, 0]),
            },
            biomes: Biomes {
                palette: vec!["minecraft:plains".to_string()],
            },
        }],
    }
}

fn block(name: &str) -> BlockState {
    BlockState {
        name: name.to_string(),
    }
}

pub fn to_nbt<T: Serialize>(value: &T) -> Vec<u8> {
    fastnbt::to_bytes(value).unwrap()
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// One chunk slot of a hand-built region file.
pub struct Slot {
    pub x: usize,
    pub z: usize,
    pub sector: u32,
    pub count: u8,
    pub marker: u8,
    pub payload: Vec<u8>,
}

impl Slot {
    pub fn zlib(x: usize, z: usize, sector: u32, count: u8, nbt: &[u8]) -> Self {
        Self {
            x,
            z,
            sector,
            count,
            marker: 2,
            payload: zlib(nbt),
        }
    }

    /// Single-sector slot at `(x, 0)` with an arbitrary marker and payload.
    pub fn raw(x: usize, sector: u32, marker: u8, payload: Vec<u8>) -> Self {
        Self {
            x,
            z: 0,
            sector,
            count: 1,
            marker,
            payload,
        }
    }
}

/// Region file bytes: header tables, then each slot padded to its sectors.
pub fn region_bytes(slots: &[Slot]) -> Vec<u8> {
    let mut file = vec![0u8; 2 * SECTOR];
    for slot in slots {
        let entry = (slot.x + slot.z * 32) * 4;
        let offset = slot.sector.to_be_bytes();
        file[entry..entry + 3].copy_from_slice(&offset[1..]);
        file[entry + 3] = slot.count;
        let timestamp = (1_700_000_000u32 + entry as u32).to_be_bytes();
        file[SECTOR + entry..][..4].copy_from_slice(&timestamp);

        let start = slot.sector as usize * SECTOR;
        let end = start + slot.count as usize * SECTOR;
        if file.len() < end {
            file.resize(end, 0);
        }
        let length = slot.payload.len() as u32 + 1;
        file[start..start + 4].copy_from_slice(&length.to_be_bytes());
        file[start + 4] = slot.marker;
        let payload = &slot.payload;
        file[start + 5..][..payload.len()].copy_from_slice(payload);
    }
    file
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}
