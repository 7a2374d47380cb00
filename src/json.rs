//! NBT to JSON conversion for dumping trees.
//!
//! Scalars map to JSON numbers and strings. The three array kinds would be
//! indistinguishable from lists, so they are wrapped in a single-key object:
//! `{"__byte_array": [...]}`, `{"__int_array": [...]}`, `{"__long_array": [...]}`.

use serde_json::{Map, Number, Value as JsonValue};

use crate::nbt::Tag;

pub const BYTE_ARRAY_KEY: &str = "__byte_array";
pub const INT_ARRAY_KEY: &str = "__int_array";
pub const LONG_ARRAY_KEY: &str = "__long_array";

pub fn tag_to_json(tag: &Tag) -> JsonValue {
    match tag {
        Tag::End => JsonValue::Null,
        Tag::Compound(c) => {
            let mut map = Map::new();
            for (k, v) in c.iter() {
                map.insert(k.to_owned(), tag_to_json(v));
            }
            JsonValue::Object(map)
        }
        Tag::List(l) => JsonValue::Array(l.iter().map(tag_to_json).collect()),
        Tag::String(s) => JsonValue::String(s.clone()),
        Tag::Byte(b) => JsonValue::Number((*b).into()),
        Tag::Short(s) => JsonValue::Number((*s).into()),
        Tag::Int(i) => JsonValue::Number((*i).into()),
        Tag::Long(l) => JsonValue::Number((*l).into()),
        Tag::Float(f) => finite(*f as f64),
        Tag::Double(d) => finite(*d),
        Tag::ByteArray(ba) => tagged(BYTE_ARRAY_KEY, ba.iter().map(|&b| JsonValue::from(b))),
        Tag::IntArray(ia) => tagged(INT_ARRAY_KEY, ia.iter().map(|&i| JsonValue::from(i))),
        Tag::LongArray(la) => tagged(LONG_ARRAY_KEY, la.iter().map(|&l| JsonValue::from(l))),
    }
}

/// NaN and infinities have no JSON form.
fn finite(value: f64) -> JsonValue {
    match Number::from_f64(value) {
        Some(n) => JsonValue::Number(n),
        None => JsonValue::Null,
    }
}

fn tagged(key: &str, values: impl Iterator<Item = JsonValue>) -> JsonValue {
    let mut map = Map::new();
    map.insert(key.to_string(), JsonValue::Array(values.collect()));
    JsonValue::Object(map)
}
