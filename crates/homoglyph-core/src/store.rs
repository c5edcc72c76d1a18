use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::fmt;

/// Raw attributes of one assigned code point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodepointRecord {
    pub codepoint: u32,
    pub description: String,
    pub category: String,
    pub bidi_class: String,
    pub combining_class: u8,
    pub is_upper: bool,
    pub is_lower: bool,
    pub is_emoji: bool,
    pub is_whitespace: bool,
    pub is_printable: bool,
    pub is_zero_width: bool,
    /// Space-delimited hex code points, without the formatting tag.
    pub decomposition: Option<String>,
    /// `<compat>`, `<font>`, ... when the decomposition is not canonical.
    pub decomposition_tag: Option<String>,
    pub uppercase: Option<String>,
    pub lowercase: Option<String>,
    pub ascii_equivalent: Option<String>,
}

impl CodepointRecord {
    pub fn new(codepoint: u32) -> Self {
        Self {
            codepoint,
            ..Self::default()
        }
    }

    /// The character this record describes, if the code point is a scalar value.
    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.codepoint)
    }

    /// Parse the decomposition field into code points. Tokens that are not hex are skipped.
    pub fn decomposition_codepoints(&self) -> Option<Vec<u32>> {
        self.decomposition
            .as_deref()
            .map(parse_codepoint_sequence)
    }
}

/// Parse a space-delimited sequence of hex code points (`"0041 0301"`).
pub fn parse_codepoint_sequence(s: &str) -> Vec<u32> {
    s.split_whitespace()
        .filter(|t| !t.starts_with('<'))
        .filter_map(|t| u32::from_str_radix(t, 16).ok())
        .collect()
}

/// An inclusive range of code points that intentionally has no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRange {
    pub first: u32,
    pub last: u32,
    pub description: String,
}

impl SpecialRange {
    pub fn new(first: u32, last: u32, description: impl Into<String>) -> Self {
        Self {
            first,
            last,
            description: description.into(),
        }
    }

    /// Number of code points covered; zero for an inverted range.
    pub fn count(&self) -> u32 {
        if self.first > self.last {
            0
        } else {
            self.last - self.first + 1
        }
    }
}

impl fmt::Display for SpecialRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "U+{:04X} - U+{:04X} {}",
            self.first, self.last, self.description
        )
    }
}

/// Keyed access to code point records.
///
/// `set_ascii` never overwrites: it writes only when the current value is null
/// and reports whether a write happened.
pub trait CodepointStore {
    fn get(&self, codepoint: u32) -> Option<&CodepointRecord>;

    fn set_ascii(&mut self, codepoint: u32, value: &str) -> bool;
}

/// Ordered in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<u32, CodepointRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: CodepointRecord) {
        self.records.insert(record.codepoint, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending code point order.
    pub fn records(&self) -> impl Iterator<Item = &CodepointRecord> {
        self.records.values()
    }

    /// Mutable records whose code points fall in `first..=last`; none when
    /// the bounds are inverted.
    pub fn range_mut(
        &mut self,
        first: u32,
        last: u32,
    ) -> impl Iterator<Item = &mut CodepointRecord> {
        let upper = if first <= last {
            Bound::Included(last)
        } else {
            Bound::Excluded(first)
        };
        self.records
            .range_mut((Bound::Included(first), upper))
            .map(|(_, r)| r)
    }

    /// Assigned code points, ascending.
    pub fn codepoints(&self) -> Vec<u32> {
        self.records.keys().copied().collect()
    }
}

impl FromIterator<CodepointRecord> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = CodepointRecord>>(iter: I) -> Self {
        let mut store = MemoryStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl CodepointStore for MemoryStore {
    fn get(&self, codepoint: u32) -> Option<&CodepointRecord> {
        self.records.get(&codepoint)
    }

    fn set_ascii(&mut self, codepoint: u32, value: &str) -> bool {
        match self.records.get_mut(&codepoint) {
            Some(record) if record.ascii_equivalent.is_none() => {
                record.ascii_equivalent = Some(value.to_string());
                true
            }
            _ => false,
        }
    }
}
