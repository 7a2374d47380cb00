//! Region files on disk, end to end: open, index, decompress, parse.

mod common;

use std::collections::HashSet;

use common::{chunk_data, region_bytes, to_nbt, write_file, Slot, SECTOR};
use mca_core::{
    CorruptChunkError, CorruptRegionError, CorruptionError, Error, NbtErrorKind, ParserConfig,
    RegionFile, Tag, TagKind,
};
use serde::Serialize;
use tempfile::TempDir;

fn region_error(err: Error) -> CorruptRegionError {
    match err {
        Error::Corrupt(CorruptionError::Region(e)) => e,
        other => panic!("expected region corruption, got {other:?}"),
    }
}

#[test]
fn test_all_zero_header_has_no_chunks() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "r.0.0.mca", &vec![0u8; 2 * SECTOR]);

    let mut region = mca_core::open_container(&path).unwrap();
    for x in 0..32 {
        for z in 0..32 {
            assert!(mca_core::read_chunk(&mut region, x, z).unwrap().is_none());
            assert!(!region.chunk_exists(x, z));
        }
    }
}

#[derive(Serialize)]
struct Named {
    #[serde(rename = "Name")]
    name: String,
}

fn named(name: &str) -> Vec<u8> {
    to_nbt(&Named {
        name: name.to_string(),
    })
}

#[test]
fn test_single_zlib_chunk_at_sector_two() {
    let nbt = named("minecraft:oak_log");
    let temp = TempDir::new().unwrap();
    let path = write_file(
        temp.path(),
        "r.0.0.mca",
        &region_bytes(&[Slot::zlib(4, 9, 2, 3, &nbt)]),
    );

    let mut region = RegionFile::open(&path).unwrap();
    assert_eq!(region.file_len(), 5 * SECTOR as u64);
    let location = region.header().location(4 + 9 * 32);
    assert_eq!(location.sector_offset(), 2);
    assert_eq!(location.sector_count(), 3);

    let root = region.read_chunk(4, 9).unwrap().unwrap();
    let compound = root.as_compound().unwrap();
    assert_eq!(compound.len(), 1);
    assert_eq!(compound.get_str("Name"), Some("minecraft:oak_log"));
}

#[test]
fn test_every_slot_of_well_formed_region() {
    let slots: Vec<Slot> = (0..6)
        .map(|i| {
            let (x, z) = (i * 5 % 32, i * 7 % 32);
            let nbt = to_nbt(&chunk_data(x as i32, z as i32));
            Slot::zlib(x, z, 2 + i as u32 * 2, 2, &nbt)
        })
        .collect();
    let present: HashSet<(i32, i32)> = slots.iter().map(|s| (s.x as i32, s.z as i32)).collect();

    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "r.0.0.mca", &region_bytes(&slots));
    let mut region = RegionFile::open(&path).unwrap();

    assert_eq!(region.chunks().len(), present.len());
    for x in 0..32 {
        for z in 0..32 {
            let chunk = region.read_chunk(x, z).unwrap();
            if present.contains(&(x, z)) {
                let root = chunk.expect("present chunk");
                assert_eq!(root.get_path("xPos").and_then(Tag::as_i64), Some(x as i64));
                assert_eq!(root.get_path("zPos").and_then(Tag::as_i64), Some(z as i64));
            } else {
                assert!(chunk.is_none());
            }
        }
    }
}

#[test]
fn test_fastnbt_chunk_decodes_field_by_field() {
    let nbt = to_nbt(&chunk_data(-7, 12));
    let temp = TempDir::new().unwrap();
    let path = write_file(
        temp.path(),
        "r.-1.0.mca",
        &region_bytes(&[Slot::zlib(25, 12, 2, 1, &nbt)]),
    );
    let mut region = RegionFile::open(&path).unwrap();

    // world coordinates wrap into the region
    let root = region.read_chunk(-7, 12).unwrap().unwrap();
    let root = root.as_compound().unwrap();
    assert_eq!(root.get_int("DataVersion"), Some(3953));
    assert_eq!(root.get_str("Status"), Some("minecraft:full"));
    assert_eq!(root.get_long("LastUpdate"), Some(1200));

    let sections = root.get_list("sections").unwrap();
    assert_eq!(sections.element_kind(), TagKind::Compound);
    let section = sections.get(0).and_then(Tag::as_compound).unwrap();
    assert_eq!(section.get_byte("Y"), Some(-4));

    let block_states = section.get_compound("block_states").unwrap();
    let palette = block_states.get_list("palette").unwrap();
    let names: Vec<_> = palette
        .iter()
        .filter_map(|b| b.as_compound()?.get_str("Name"))
        .collect();
    assert_eq!(names, vec!["minecraft:bedrock", "minecraft:stone"]);
    assert_eq!(
        block_states.get_long_array("data"),
        Some(&[0x1111_1111_1111_1111, -1, 0][..])
    );
}

#[test]
fn test_truncated_file_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "r.0.0.mca", &vec![0u8; 8000]);
    let err = RegionFile::open(&path).err().unwrap();
    assert_eq!(
        region_error(err),
        CorruptRegionError::HeaderTooShort { len: 8000 }
    );
}

#[test]
fn test_index_entry_past_end_fails_to_open() {
    let nbt = named("x");
    let mut bytes = region_bytes(&[Slot::zlib(0, 0, 2, 1, &nbt)]);
    // point slot (1, 0) at sector 40 of a 3 sector file
    bytes[4..8].copy_from_slice(&[0, 0, 40, 1]);

    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "r.0.0.mca", &bytes);
    let err = RegionFile::open(&path).err().unwrap();
    assert!(matches!(
        region_error(err),
        CorruptRegionError::EntryOutOfBounds {
            x: 1,
            z: 0,
            file_len: 12288,
            ..
        }
    ));
}

#[test]
fn test_overlapping_sectors_fail_to_open() {
    let nbt = named("x");
    let bytes = region_bytes(&[
        Slot::zlib(0, 0, 2, 2, &nbt),
        Slot::zlib(1, 0, 3, 1, &nbt),
    ]);
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "r.0.0.mca", &bytes);
    assert!(matches!(
        region_error(RegionFile::open(&path).err().unwrap()),
        CorruptRegionError::SectorOverlap { sector: 3, .. }
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("r.9.9.mca");
    let err = RegionFile::open(&path).err().unwrap();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.corruption().is_none());
}

#[test]
fn test_corruption_is_classified_per_layer() {
    let good = to_nbt(&chunk_data(0, 0));
    let mut bad_tree = good.clone();
    bad_tree[0] = 1;
    let truncated = common::zlib(&good)[..20].to_vec();

    let slots = [
        Slot::zlib(0, 0, 2, 1, &good),
        Slot::raw(1, 3, 4, vec![0; 8]),
        Slot::raw(2, 4, 2, truncated),
        Slot::zlib(3, 0, 5, 1, &bad_tree),
        Slot::raw(4, 6, 1, common::gzip(&good)),
        Slot::raw(5, 7, 3, good.clone()),
    ];
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "r.0.0.mca", &region_bytes(&slots));
    let mut region = RegionFile::open(&path).unwrap();

    assert!(region.read_chunk(0, 0).unwrap().is_some());
    assert!(region.read_chunk(4, 0).unwrap().is_some());
    assert!(region.read_chunk(5, 0).unwrap().is_some());

    match region.read_chunk(1, 0).unwrap_err() {
        Error::Corrupt(CorruptionError::Chunk { source, .. }) => {
            assert!(matches!(
                source,
                CorruptChunkError::UnknownCompression { marker: 4 }
            ))
        }
        other => panic!("unexpected {other:?}"),
    }
    match region.read_chunk(2, 0).unwrap_err() {
        Error::Corrupt(CorruptionError::Chunk { source, .. }) => {
            assert!(matches!(source, CorruptChunkError::Truncated { .. }))
        }
        other => panic!("unexpected {other:?}"),
    }
    match region.read_chunk(3, 0).unwrap_err() {
        Error::Corrupt(CorruptionError::Nbt { source, .. }) => {
            assert_eq!(source.kind, NbtErrorKind::RootNotCompound(TagKind::Byte));
        }
        other => panic!("unexpected {other:?}"),
    }

    // the reader is still usable after corrupt chunks
    assert!(region.read_chunk(0, 0).unwrap().is_some());
}

#[test]
fn test_payloads_decode_on_worker_threads() {
    let slots: Vec<Slot> = (0..16)
        .map(|i| Slot::zlib(i, 0, 2 + i as u32, 1, &to_nbt(&chunk_data(i as i32, 0))))
        .collect();
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "r.0.0.mca", &region_bytes(&slots));
    let mut region = RegionFile::open(&path).unwrap();

    let payloads: Vec<_> = region
        .chunks()
        .into_iter()
        .map(|(x, z)| region.read_chunk_payload(x, z).unwrap().unwrap())
        .collect();

    let decoded: Vec<i64> = std::thread::scope(|s| {
        let handles: Vec<_> = payloads
            .iter()
            .map(|p| s.spawn(move || p.decode(ParserConfig::default())))
            .collect();
        handles
            .into_iter()
            .map(|h| {
                let root = h.join().unwrap().unwrap();
                root.get_path("xPos").and_then(Tag::as_i64).unwrap()
            })
            .collect()
    });
    assert_eq!(decoded, (0..16).collect::<Vec<i64>>());
}

#[test]
fn test_depth_limit_applies_to_chunks() {
    // compound nested 20 levels deep
    let mut nbt = vec![10, 0, 0];
    for _ in 0..20 {
        nbt.extend_from_slice(&[10, 0, 1, b'c']);
    }
    nbt.extend(std::iter::repeat_n(0, 21));

    let temp = TempDir::new().unwrap();
    let path = write_file(
        temp.path(),
        "r.0.0.mca",
        &region_bytes(&[Slot::zlib(0, 0, 2, 1, &nbt)]),
    );

    let config = ParserConfig::with_max_depth(8);
    let mut strict = RegionFile::open_with(&path, config).unwrap();
    match strict.read_chunk(0, 0).unwrap_err().corruption() {
        Some(CorruptionError::Nbt { source, .. }) => {
            assert_eq!(source.kind, NbtErrorKind::DepthExceeded { limit: 8 })
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut lenient = RegionFile::open(&path).unwrap();
    assert!(lenient.read_chunk(0, 0).unwrap().is_some());
}
