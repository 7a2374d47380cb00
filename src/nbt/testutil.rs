//! Test-only NBT encoder, used to build fixtures for the decoder.

use super::{Compound, Tag};

/// Encode `root` as a named root compound.
pub fn write_root(name: &str, root: &Compound) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(10);
    write_str(&mut out, name);
    write_compound(&mut out, root);
    out
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn write_compound(out: &mut Vec<u8>, compound: &Compound) {
    for (name, tag) in compound.iter() {
        out.push(tag.kind() as u8);
        write_str(out, name);
        write_payload(out, tag);
    }
    out.push(0);
}

fn write_payload(out: &mut Vec<u8>, tag: &Tag) {
    match tag {
        Tag::End => {}
        Tag::Byte(v) => out.push(*v as u8),
        Tag::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::ByteArray(v) => {
            out.extend_from_slice(&(v.len() as i32).to_be_bytes());
            out.extend(v.iter().map(|b| *b as u8));
        }
        Tag::String(s) => write_str(out, s),
        Tag::List(list) => {
            out.push(list.element_kind() as u8);
            out.extend_from_slice(&(list.len() as i32).to_be_bytes());
            for item in list {
                write_payload(out, item);
            }
        }
        Tag::Compound(c) => write_compound(out, c),
        Tag::IntArray(v) => {
            out.extend_from_slice(&(v.len() as i32).to_be_bytes());
            for i in v {
                out.extend_from_slice(&i.to_be_bytes());
            }
        }
        Tag::LongArray(v) => {
            out.extend_from_slice(&(v.len() as i32).to_be_bytes());
            for l in v {
                out.extend_from_slice(&l.to_be_bytes());
            }
        }
    }
}

/// Byte-level builder for deliberately malformed input.
#[derive(Default)]
pub struct RawNbt(Vec<u8>);

impl RawNbt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte(mut self, b: u8) -> Self {
        self.0.push(b);
        self
    }

    pub fn short(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn int(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn name(mut self, s: &str) -> Self {
        write_str(&mut self.0, s);
        self
    }

    pub fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }

    /// Root compound header with an empty name.
    pub fn root(self) -> Self {
        self.byte(10).name("")
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}
