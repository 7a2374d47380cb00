//! NBT decoder.
//!
//! Wire format (big-endian throughout):
//! - Named tag: `[kind: u8][name_len: u16][name: UTF-8][payload]`
//! - Compound payload: named tags until a lone `End` kind byte
//! - List payload: `[element kind: u8][count: i32]` then `count` bare payloads
//! - Arrays: `[count: i32]` then `count` elements; strings: `[len: u16][UTF-8]`
//!
//! Open compounds and lists are kept on a heap-allocated frame stack instead
//! of the call stack, so nesting never grows native stack usage. Nesting is
//! still bounded by [`ParserConfig::max_depth`].

use std::collections::HashSet;

use super::tag::{Compound, List, Tag, TagKind};
use crate::error::{CorruptNbtError, NbtErrorKind};

type Result<T> = std::result::Result<T, CorruptNbtError>;

/// Default nesting limit (compounds and lists combined).
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Hard upper bound for any configured nesting limit.
pub const MAX_DEPTH_CEILING: usize = 1024;

/// Environment variable read by [`ParserConfig::from_env`].
pub const MAX_DEPTH_ENV: &str = "MCA_NBT_MAX_DEPTH";

/// Compounds smaller than this are checked for duplicate names by scanning.
const LINEAR_SCAN_LIMIT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Nesting limit, clamped to `1..=MAX_DEPTH_CEILING`.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.clamp(1, MAX_DEPTH_CEILING),
        }
    }

    /// Reads `MCA_NBT_MAX_DEPTH`, falling back to the default.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MAX_DEPTH_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse().ok())
            .map(Self::with_max_depth)
            .unwrap_or_default()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Decode an uncompressed NBT buffer and return its root compound.
pub fn parse(bytes: &[u8]) -> Result<Tag> {
    parse_with(bytes, ParserConfig::default())
}

pub fn parse_with(bytes: &[u8], config: ParserConfig) -> Result<Tag> {
    parse_named_with(bytes, config).map(|(_, root)| root)
}

/// Like [`parse`], but also returns the root tag's name.
pub fn parse_named(bytes: &[u8]) -> Result<(String, Tag)> {
    parse_named_with(bytes, ParserConfig::default())
}

pub fn parse_named_with(bytes: &[u8], config: ParserConfig) -> Result<(String, Tag)> {
    Parser::new(bytes, config).read_root()
}

/// A container whose children are still being decoded.
enum Frame {
    Compound {
        compound: Compound,
        seen: Option<HashSet<String>>,
        /// Name of the child currently being decoded.
        key: String,
    },
    List {
        list: List,
        remaining: usize,
    },
}

impl Frame {
    fn compound() -> Self {
        Frame::Compound {
            compound: Compound::new(),
            seen: None,
            key: String::new(),
        }
    }

    fn attach(&mut self, value: Tag) {
        match self {
            Frame::Compound { compound, key, .. } => {
                compound.push_unchecked(std::mem::take(key), value)
            }
            Frame::List { list, .. } => list.push_unchecked(value),
        }
    }

    fn into_tag(self) -> Tag {
        match self {
            Frame::Compound { compound, .. } => Tag::Compound(compound),
            Frame::List { list, .. } => Tag::List(list),
        }
    }
}

/// Result of decoding one child of the current frame.
enum Step {
    /// A complete value.
    Value(Tag),
    /// A non-empty container that has to be filled before it is attached.
    Open(Frame),
    /// The current frame has no children left.
    Close,
}

/// Cursor over one NBT buffer.
pub struct Parser<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8], config: ParserConfig) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
            max_depth: config.max_depth(),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read the root named compound. Trailing bytes are left unread.
    pub fn read_root(&mut self) -> Result<(String, Tag)> {
        let kind = self.read_kind()?;
        if kind != TagKind::Compound {
            return Err(CorruptNbtError::new(0, NbtErrorKind::RootNotCompound(kind)));
        }
        let name = self.read_string()?;
        self.enter()?;

        let mut current = Frame::compound();
        let mut parents: Vec<Frame> = Vec::new();
        loop {
            match self.next_child(&mut current)? {
                Step::Value(tag) => current.attach(tag),
                Step::Open(frame) => parents.push(std::mem::replace(&mut current, frame)),
                Step::Close => {
                    self.leave();
                    let done = current.into_tag();
                    match parents.pop() {
                        Some(parent) => {
                            current = parent;
                            current.attach(done);
                        }
                        None => return Ok((name, done)),
                    }
                }
            }
        }
    }

    fn error_at(&self, offset: usize, kind: NbtErrorKind) -> CorruptNbtError {
        CorruptNbtError::new(offset, kind)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.error_at(
                self.pos,
                NbtErrorKind::UnexpectedEof {
                    needed: n,
                    remaining: self.remaining(),
                },
            ));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_i16(&mut self) -> Result<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    fn read_kind(&mut self) -> Result<TagKind> {
        let at = self.pos;
        let byte = self.read_u8()?;
        TagKind::try_from(byte)
            .map_err(|_| self.error_at(at, NbtErrorKind::InvalidTagKind(byte)))
    }

    /// Strict UTF-8, see [`NbtErrorKind::InvalidUtf8`].
    fn read_string(&mut self) -> Result<String> {
        let len = u16::from_be_bytes(self.read_array()?) as usize;
        let at = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| self.error_at(at, NbtErrorKind::InvalidUtf8))
    }

    /// Read an `i32` element count and make sure the buffer can hold
    /// `count * min_size` more bytes before anything is allocated.
    fn read_count(&mut self, min_size: usize) -> Result<usize> {
        let at = self.pos;
        let count = self.read_i32()?;
        if count < 0 {
            return Err(self.error_at(at, NbtErrorKind::NegativeLength(count)));
        }
        let count = count as usize;
        self.ensure(count.saturating_mul(min_size))?;
        Ok(count)
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(self.error_at(
                self.pos,
                NbtErrorKind::UnexpectedEof {
                    needed,
                    remaining: self.remaining(),
                },
            ));
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(self.error_at(
                self.pos,
                NbtErrorKind::DepthExceeded {
                    limit: self.max_depth,
                },
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Decode the next child of `frame`: its name if it is a compound, then
    /// the value itself.
    fn next_child(&mut self, frame: &mut Frame) -> Result<Step> {
        match frame {
            Frame::Compound {
                compound,
                seen,
                key,
            } => {
                let kind = self.read_kind()?;
                if kind == TagKind::End {
                    return Ok(Step::Close);
                }
                let name_at = self.pos;
                let name = self.read_string()?;
                if !is_unique(compound, seen, &name) {
                    return Err(self.error_at(name_at, NbtErrorKind::DuplicateName(name)));
                }
                *key = name;
                self.read_value(kind)
            }
            Frame::List { list, remaining } => {
                if *remaining == 0 {
                    return Ok(Step::Close);
                }
                *remaining -= 1;
                self.read_value(list.element_kind())
            }
        }
    }

    fn read_value(&mut self, kind: TagKind) -> Result<Step> {
        let tag = match kind {
            // Never stored: compounds consume their End, lists of End are empty.
            TagKind::End => Tag::End,
            TagKind::Byte => Tag::Byte(self.read_u8()? as i8),
            TagKind::Short => Tag::Short(self.read_i16()?),
            TagKind::Int => Tag::Int(self.read_i32()?),
            TagKind::Long => Tag::Long(self.read_i64()?),
            TagKind::Float => Tag::Float(f32::from_be_bytes(self.read_array()?)),
            TagKind::Double => Tag::Double(f64::from_be_bytes(self.read_array()?)),
            TagKind::ByteArray => {
                let len = self.read_count(1)?;
                Tag::ByteArray(self.take(len)?.iter().map(|b| *b as i8).collect())
            }
            TagKind::String => Tag::String(self.read_string()?),
            TagKind::List => return self.open_list(),
            TagKind::Compound => {
                self.enter()?;
                return Ok(Step::Open(Frame::compound()));
            }
            TagKind::IntArray => {
                let len = self.read_count(4)?;
                Tag::IntArray(
                    self.take(len * 4)?
                        .chunks_exact(4)
                        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                )
            }
            TagKind::LongArray => {
                let len = self.read_count(8)?;
                let mut longs = Vec::with_capacity(len);
                for _ in 0..len {
                    longs.push(self.read_i64()?);
                }
                Tag::LongArray(longs)
            }
        };
        Ok(Step::Value(tag))
    }

    fn open_list(&mut self) -> Result<Step> {
        self.enter()?;
        let kind_at = self.pos;
        let kind_byte = self.read_u8()?;
        let kind = TagKind::try_from(kind_byte)
            .map_err(|_| self.error_at(kind_at, NbtErrorKind::InvalidListKind(kind_byte)))?;
        let count_at = self.pos;
        let count = self.read_i32()?;

        // Negative counts have always meant "empty" in the wild.
        if count <= 0 {
            self.leave();
            return Ok(Step::Value(Tag::List(List::new(kind))));
        }
        if kind == TagKind::End {
            return Err(self.error_at(
                count_at,
                NbtErrorKind::NonEmptyEndList { len: count },
            ));
        }

        let count = count as usize;
        self.ensure(count.saturating_mul(min_payload_size(kind)))?;
        Ok(Step::Open(Frame::List {
            list: List::with_capacity(kind, count),
            remaining: count,
        }))
    }
}

/// Smallest encoded size of one bare payload of `kind`.
fn min_payload_size(kind: TagKind) -> usize {
    match kind {
        TagKind::End => 0,
        TagKind::Byte => 1,
        TagKind::Short => 2,
        TagKind::Int | TagKind::Float => 4,
        TagKind::Long | TagKind::Double => 8,
        TagKind::ByteArray | TagKind::IntArray | TagKind::LongArray => 4,
        TagKind::String => 2,
        TagKind::List => 5,
        TagKind::Compound => 1,
    }
}

fn is_unique(compound: &Compound, seen: &mut Option<HashSet<String>>, name: &str) -> bool {
    if seen.is_none() && compound.len() < LINEAR_SCAN_LIMIT {
        return !compound.contains_key(name);
    }
    let names = seen.get_or_insert_with(|| key_set(compound));
    names.insert(name.to_owned())
}

fn key_set(compound: &Compound) -> HashSet<String> {
    compound.keys().map(str::to_owned).collect()
}
