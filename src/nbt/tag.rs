//! In-memory NBT tree.
//!
//! A [`Tag`] tree is produced in one pass by the parser and owned outright by
//! the caller: compounds and lists own their children, nothing is shared.

use num_enum::TryFromPrimitive;
use thiserror::Error;

/// The NBT tag kind byte. This does not carry the value or the name.
#[derive(Debug, TryFromPrimitive, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

/// One NBT value. Names live in the parent [`Compound`].
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::End => TagKind::End,
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Tag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            Tag::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Tag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Tag::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Tag::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integral tag widened to `i64`.
    ///
    /// Chunk coordinates and versions have been stored with different widths
    /// over the years, so readers usually want this rather than `as_int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Byte(v) => Some(*v as i64),
            Tag::Short(v) => Some(*v as i64),
            Tag::Int(v) => Some(*v as i64),
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            Tag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            Tag::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    /// Walk nested compounds by a dotted path, e.g. `"Level.xPos"`.
    pub fn get_path(&self, path: &str) -> Option<&Tag> {
        path.split('.')
            .try_fold(self, |tag, name| tag.as_compound()?.get(name))
    }
}

/// Attempted to put a tag of the wrong kind into a [`List`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot put a {found:?} tag into a list of {expected:?}")]
pub struct KindMismatch {
    pub expected: TagKind,
    pub found: TagKind,
}

/// Homogeneous, ordered sequence of unnamed tags.
///
/// The element kind is fixed when the list is created. A list of kind
/// [`TagKind::End`] is always empty.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    kind: TagKind,
    items: Vec<Tag>,
}

impl List {
    pub fn new(kind: TagKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    pub fn with_capacity(kind: TagKind, capacity: usize) -> Self {
        Self {
            kind,
            items: Vec::with_capacity(capacity),
        }
    }

    /// Build a list from `items`, all of which must be of `kind`.
    pub fn from_tags(kind: TagKind, items: Vec<Tag>) -> Result<Self, KindMismatch> {
        let mut list = Self::with_capacity(kind, items.len());
        for item in items {
            list.push(item)?;
        }
        Ok(list)
    }

    pub fn push(&mut self, tag: Tag) -> Result<(), KindMismatch> {
        let found = tag.kind();
        if found != self.kind || found == TagKind::End {
            return Err(KindMismatch {
                expected: self.kind,
                found,
            });
        }
        self.items.push(tag);
        Ok(())
    }

    /// Append a tag the decoder produced for this list's own kind.
    pub(crate) fn push_unchecked(&mut self, tag: Tag) {
        debug_assert_eq!(tag.kind(), self.kind);
        self.items.push(tag);
    }

    pub fn element_kind(&self) -> TagKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Tag> {
        self.items
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for List {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Ordered mapping of unique names to tags. Iteration follows insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tag` under `name`. An existing entry keeps its position and
    /// its old value is returned.
    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) -> Option<Tag> {
        debug_assert!(
            tag.kind() != TagKind::End,
            "End is a terminator, not a value"
        );
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, tag)),
            None => {
                self.entries.push((name, tag));
                None
            }
        }
    }

    /// Append without the uniqueness scan. The caller has already checked.
    pub(crate) fn push_unchecked(&mut self, name: String, tag: Tag) {
        self.entries.push((name, tag));
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tag)| tag)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn get_byte(&self, name: &str) -> Option<i8> {
        self.get(name)?.as_byte()
    }

    pub fn get_short(&self, name: &str) -> Option<i16> {
        self.get(name)?.as_short()
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name)?.as_int()
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_long()
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.get(name)?.as_float()
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_double()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn get_list(&self, name: &str) -> Option<&List> {
        self.get(name)?.as_list()
    }

    pub fn get_compound(&self, name: &str) -> Option<&Compound> {
        self.get(name)?.as_compound()
    }

    pub fn get_byte_array(&self, name: &str) -> Option<&[i8]> {
        self.get(name)?.as_byte_array()
    }

    pub fn get_int_array(&self, name: &str) -> Option<&[i32]> {
        self.get(name)?.as_int_array()
    }

    pub fn get_long_array(&self, name: &str) -> Option<&[i64]> {
        self.get(name)?.as_long_array()
    }
}

impl IntoIterator for Compound {
    type Item = (String, Tag);
    type IntoIter = std::vec::IntoIter<(String, Tag)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
