//! mca-inspect: dump Minecraft region and NBT files as JSON.
//!
//! Lists the chunks of a region file, dumps a single chunk, or dumps a
//! standalone NBT file such as `level.dat`. Logging goes through `RUST_LOG`.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;

use mca_core::json::tag_to_json;
use mca_core::nbt::DEFAULT_MAX_DEPTH;
use mca_core::{ParserConfig, RegionFile, RegionPos, Tag};

#[derive(Parser)]
#[command(
    name = "mca-inspect",
    about = "Inspect Minecraft region (.mca/.mcr) and NBT files"
)]
pub struct Args {
    /// Region file, or a standalone NBT file with --nbt
    pub path: PathBuf,

    /// Treat PATH as a standalone NBT file (gzip-wrapped or raw)
    #[arg(long)]
    pub nbt: bool,

    /// Dump one chunk; world coordinates are wrapped into the region
    #[arg(
        long,
        num_args = 2,
        value_names = ["X", "Z"],
        allow_negative_numbers = true
    )]
    pub chunk: Option<Vec<i32>>,

    /// Maximum NBT nesting depth
    #[arg(long, env = "MCA_NBT_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// One line of the chunk listing.
#[derive(Serialize)]
struct ChunkEntry {
    x: i32,
    z: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    world: Option<(i32, i32)>,
    timestamp: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = ParserConfig::with_max_depth(args.max_depth);

    if args.nbt {
        let bytes = fs::read(&args.path)
            .with_context(|| format!("Failed to read {}", args.path.display()))?;
        let (name, root) = mca_core::parse_standalone_named(&bytes, config)?;
        let mut wrapped = serde_json::Map::new();
        wrapped.insert(name, tag_to_json(&root));
        return print_json(&serde_json::Value::Object(wrapped), args.pretty);
    }

    let mut region = RegionFile::open_with(&args.path, config)
        .with_context(|| format!("Failed to open region {}", args.path.display()))?;

    if let Some(coords) = &args.chunk {
        let (x, z) = (coords[0], coords[1]);
        return match region.read_chunk(x, z)? {
            Some(root) => print_json(&tag_to_json(&root), args.pretty),
            None => bail!("Chunk ({}, {}) is not present", x, z),
        };
    }

    let region_pos = args
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(RegionPos::from_filename);

    for (x, z) in region.chunks() {
        let mut entry = ChunkEntry {
            x,
            z,
            world: region_pos.map(|r| {
                let pos = r.local_to_world(x, z);
                (pos.x, pos.z)
            }),
            timestamp: region.timestamp(x, z),
            data_version: None,
            status: None,
            error: None,
        };
        match region.read_chunk(x, z) {
            Ok(Some(root)) => {
                entry.data_version = root.get_path("DataVersion").and_then(Tag::as_i64);
                entry.status = status_of(&root).map(str::to_owned);
            }
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Skipping chunk ({}, {}): {}", x, z, e);
                entry.error = Some(e.to_string());
            }
        }
        println!("{}", serde_json::to_string(&entry)?);
    }
    Ok(())
}

/// Generation status, from the modern root or the legacy `Level` compound.
fn status_of(root: &Tag) -> Option<&str> {
    root.get_path("Status")
        .or_else(|| root.get_path("Level.Status"))
        .and_then(Tag::as_str)
}

fn print_json(value: &serde_json::Value, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}
