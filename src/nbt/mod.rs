//! NBT (Named Binary Tag) decoding.
//!
//! [`parse`] turns an uncompressed buffer into an owned [`Tag`] tree. The
//! root is always a compound; its name is available through [`parse_named`].

mod parser;
mod tag;

#[cfg(test)]
pub(crate) mod testutil;

pub use parser::{
    parse, parse_named, parse_named_with, parse_with, Parser, ParserConfig, DEFAULT_MAX_DEPTH,
    MAX_DEPTH_CEILING, MAX_DEPTH_ENV,
};
pub use tag::{Compound, KindMismatch, List, Tag, TagKind};
