//! Pattern synthesis for homoglyph variant sets.
//!
//! All byte sequences that stand for one ASCII target are inserted into a
//! prefix trie, which is then serialized bottom-up into a regular expression:
//! siblings become alternations, sibling leaves collapse into a character class
//! with consecutive runs written as ranges.
//!
//! The output is byte-oriented. Non-printable bytes (every byte of a multi-byte
//! UTF-8 sequence) are written as `\xHH`, so consumers must match bytes, not
//! code points. See [`compile`].

use std::collections::BTreeMap;

use regex::bytes::{Regex, RegexBuilder};

use crate::error::Result;

/// Shared-prefix trie over raw bytes. Children are kept in ascending byte order.
#[derive(Debug, Default)]
struct TrieNode {
    /// A variant ends here.
    terminal: bool,
    children: BTreeMap<u8, TrieNode>,
}

impl TrieNode {
    fn insert(&mut self, bytes: &[u8]) {
        let mut node = self;
        for &b in bytes {
            node = node.children.entry(b).or_default();
        }
        node.terminal = true;
    }
}

/// Serialized sub-pattern with the number of raw bytes it spans.
struct Fragment {
    text: String,
    bytes: usize,
}

/// Write one byte as pattern text.
fn escape_byte(b: u8) -> String {
    if (0x20..=0x7E).contains(&b) {
        regex::escape(&char::from(b).to_string())
    } else {
        format!("\\x{b:02X}")
    }
}

/// Collapse ascending single bytes into a class: runs of three or more become
/// `lo-hi`, shorter runs are written out literally.
fn char_class(bytes: &[u8]) -> String {
    let mut out = String::from("[");
    let mut i = 0;
    while i < bytes.len() {
        let mut j = i;
        while j + 1 < bytes.len() && bytes[j] < u8::MAX && bytes[j + 1] == bytes[j] + 1 {
            j += 1;
        }
        match j - i {
            0 => out.push_str(&escape_byte(bytes[i])),
            1 => {
                out.push_str(&escape_byte(bytes[i]));
                out.push_str(&escape_byte(bytes[j]));
            }
            _ => {
                out.push_str(&escape_byte(bytes[i]));
                out.push('-');
                out.push_str(&escape_byte(bytes[j]));
            }
        }
        i = j + 1;
    }
    out.push(']');
    out
}

/// Serialize the children of `node`. `None` for a leaf.
fn parse_tree(node: &TrieNode) -> Option<Fragment> {
    if node.children.is_empty() {
        return None;
    }

    let mut patterns: Vec<Fragment> = Vec::with_capacity(node.children.len());
    for (&b, child) in &node.children {
        let mut text = escape_byte(b);
        let mut bytes = 1;
        if let Some(sub) = parse_tree(child) {
            // A variant that is a prefix of another one makes the rest optional.
            if child.terminal {
                if sub.text.starts_with('(') || sub.text.starts_with('[') || sub.bytes == 1 {
                    text.push_str(&sub.text);
                } else {
                    text.push_str(&format!("(?:{})", sub.text));
                }
                text.push('?');
            } else {
                text.push_str(&sub.text);
            }
            bytes += sub.bytes;
        }
        patterns.push(Fragment { text, bytes });
    }

    if patterns.len() == 1 {
        return patterns.pop();
    }

    if patterns.iter().all(|p| p.bytes == 1) {
        let singles: Vec<u8> = node.children.keys().copied().collect();
        return Some(Fragment {
            text: char_class(&singles),
            bytes: 1,
        });
    }

    let alternatives: Vec<String> = patterns.into_iter().map(|p| p.text).collect();
    Some(Fragment {
        text: format!("(?:{})", alternatives.join("|")),
        bytes: 2,
    })
}

/// Build a case-sensitive pattern matching any of `variants`.
///
/// Empty variants are ignored; `None` when nothing remains. Output is stable for
/// a given set regardless of input order.
pub fn synthesize<I, T>(variants: I) -> Option<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut root = TrieNode::default();
    for variant in variants {
        let bytes = variant.as_ref();
        if !bytes.is_empty() {
            root.insert(bytes);
        }
    }

    let pattern = parse_tree(&root)?.text;
    let grouped = if pattern.starts_with('(') {
        pattern
    } else {
        format!("(?:{pattern})")
    };
    Some(format!("(?-i:{grouped})"))
}

/// Compile a synthesized pattern for byte matching.
pub fn compile(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).unicode(false).build()?)
}
