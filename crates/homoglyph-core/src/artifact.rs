//! Generated artifacts: the code point → ASCII map and the per-letter rule file.

use std::collections::BTreeSet;
use std::io::Write;

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pattern;
use crate::store::MemoryStore;

/// One line of the generated map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapEntry {
    pub codepoint: u32,
    pub ascii: String,
}

/// One line of the rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub letter: char,
    pub pattern: String,
    pub variants: usize,
}

/// Provenance written at the top of every artifact.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub version: String,
    pub generated_at: String,
    /// (file name, sha256 hex) per input.
    pub sources: Vec<(String, String)>,
}

impl Header {
    pub fn new(sources: &[(&str, &[u8])]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            sources: sources
                .iter()
                .map(|(name, data)| (name.to_string(), sha2_hex(data)))
                .collect(),
        }
    }

    fn write(&self, w: &mut impl Write) -> std::io::Result<()> {
        writeln!(w, "# generated by homoglyph {}", self.version)?;
        writeln!(w, "# generated at {}", self.generated_at)?;
        for (name, hash) in &self.sources {
            writeln!(w, "# source {name} sha256:{hash}")?;
        }
        Ok(())
    }
}

fn sha2_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Map entries in ascending code point order.
///
/// Sentinel values are left out. Non-ASCII whitespace without a value maps to a
/// single space; ASCII code points are never listed without a value.
pub fn map_entries(store: &MemoryStore, sentinel: &str) -> Vec<MapEntry> {
    store
        .records()
        .filter_map(|record| {
            let ascii = match record.ascii_equivalent.as_deref() {
                Some(value) if value == sentinel => return None,
                Some(value) => value.to_string(),
                None if record.is_whitespace && record.codepoint > 0x7F => " ".to_string(),
                None => return None,
            };
            Some(MapEntry {
                codepoint: record.codepoint,
                ascii,
            })
        })
        .collect()
}

/// Encode an ASCII value as `+`-joined hex bytes; a lone space stays literal.
pub fn encode_ascii(ascii: &str) -> String {
    if ascii == " " {
        return " ".to_string();
    }
    ascii
        .bytes()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join("+")
}

fn decode_ascii(field: &str, line: usize) -> Result<String> {
    if field == " " {
        return Ok(" ".to_string());
    }
    let mut out = String::with_capacity(field.len() / 2);
    for part in field.split('+') {
        let byte = u8::from_str_radix(part, 16)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::MapLine {
                line,
                reason: format!("bad ASCII byte {part:?}"),
            })?;
        out.push(char::from(byte));
    }
    Ok(out)
}

pub fn write_map(entries: &[MapEntry], header: &Header, mut w: impl Write) -> std::io::Result<()> {
    header.write(&mut w)?;
    for entry in entries {
        writeln!(w, "{:04X} {}", entry.codepoint, encode_ascii(&entry.ascii))?;
    }
    Ok(())
}

/// Parse a generated map. `#` lines and empty lines are skipped.
pub fn read_map(text: &str) -> Result<Vec<MapEntry>> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let (cp, ascii) = raw.split_once(' ').ok_or_else(|| Error::MapLine {
            line,
            reason: "missing separator".to_string(),
        })?;
        let codepoint = u32::from_str_radix(cp, 16).map_err(|e| Error::MapLine {
            line,
            reason: format!("bad code point {cp:?}: {e}"),
        })?;
        entries.push(MapEntry {
            codepoint,
            ascii: decode_ascii(ascii, line)?,
        });
    }
    Ok(entries)
}

/// Every byte sequence standing for `letter`: both ASCII cases, each record
/// whose single-character value matches the letter in either case, and the
/// configured fallback literals.
pub fn letter_variants(store: &MemoryStore, letter: char, fallbacks: &[String]) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();
    variants.insert(letter.to_ascii_uppercase().to_string());
    variants.insert(letter.to_ascii_lowercase().to_string());

    for record in store.records() {
        let Some(value) = record.ascii_equivalent.as_deref() else {
            continue;
        };
        let mut chars = value.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.eq_ignore_ascii_case(&letter) {
                if let Some(ch) = record.as_char() {
                    variants.insert(ch.to_string());
                }
            }
        }
    }

    variants.extend(fallbacks.iter().filter(|f| !f.is_empty()).cloned());
    variants
}

/// One rule per letter `A`..=`Z`.
pub fn build_rules(store: &MemoryStore, config: &Config) -> Vec<Rule> {
    ('A'..='Z')
        .filter_map(|letter| {
            let variants = letter_variants(store, letter, config.fallbacks_for(letter));
            let pattern = pattern::synthesize(&variants)?;
            Some(Rule {
                letter,
                pattern,
                variants: variants.len(),
            })
        })
        .collect()
}

/// Write rules as `<LETTER> <pattern>` lines. Each pattern is compiled first so
/// a broken rule never reaches the file.
pub fn write_rules(rules: &[Rule], header: &Header, mut w: impl Write) -> Result<()> {
    for rule in rules {
        pattern::compile(&rule.pattern)?;
    }
    header.write(&mut w)?;
    for rule in rules {
        writeln!(w, "{} {}", rule.letter, rule.pattern)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CodepointRecord, CodepointStore};

    fn store() -> MemoryStore {
        let mut s: MemoryStore = [0x20, 0x41, 0x61, 0x0410, 0x0430, 0x039F, 0x3000, 0xFB03]
            .into_iter()
            .map(CodepointRecord::new)
            .collect();
        let mut ideographic_space = CodepointRecord::new(0x3000);
        ideographic_space.is_whitespace = true;
        s.insert(ideographic_space);
        s.set_ascii(0x0410, "A");
        s.set_ascii(0x0430, "a");
        s.set_ascii(0x039F, "_?_");
        s.set_ascii(0xFB03, "ffi");
        s
    }

    #[test]
    fn test_map_entries() {
        let entries = map_entries(&store(), "_?_");
        let cps: Vec<u32> = entries.iter().map(|e| e.codepoint).collect();
        assert_eq!(cps, vec![0x0410, 0x0430, 0x3000, 0xFB03]);
        assert_eq!(entries[2].ascii, " ");
    }

    #[test]
    fn test_map_entries_skips_ascii_whitespace() {
        let mut s = MemoryStore::new();
        for cp in [0x09, 0x0A, 0x20, 0x3000] {
            let mut record = CodepointRecord::new(cp);
            record.is_whitespace = true;
            s.insert(record);
        }
        let entries = map_entries(&s, "_?_");
        assert_eq!(
            entries,
            vec![MapEntry {
                codepoint: 0x3000,
                ascii: " ".to_string(),
            }]
        );
    }

    #[test]
    fn test_encode_ascii() {
        assert_eq!(encode_ascii("ffi"), "66+66+69");
        assert_eq!(encode_ascii("a"), "61");
        assert_eq!(encode_ascii(" "), " ");
    }

    #[test]
    fn test_map_round_trip() {
        let entries = map_entries(&store(), "_?_");
        let header = Header::new(&[("UnicodeData.txt", "data".as_bytes())]);
        let mut buf = Vec::new();
        write_map(&entries, &header, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\n3000  \n"));
        assert!(text.contains("\nFB03 66+66+69\n"));
        assert_eq!(read_map(&text).unwrap(), entries);
    }

    #[test]
    fn test_read_map_rejects_non_ascii() {
        let err = read_map("00E0 E0\n").unwrap_err();
        assert!(matches!(err, Error::MapLine { line: 1, .. }));
        assert!(read_map("00E0\n").is_err());
    }

    #[test]
    fn test_header_hashes_sources() {
        let header = Header::new(&[("empty", "".as_bytes())]);
        assert_eq!(
            header.sources[0].1,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_letter_variants() {
        let fallbacks = vec!["@".to_string(), "4".to_string()];
        let variants = letter_variants(&store(), 'A', &fallbacks);
        let expected: BTreeSet<String> = ["A", "a", "\u{0410}", "\u{0430}", "@", "4"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(variants, expected);
    }

    #[test]
    fn test_build_and_write_rules() {
        let rules = build_rules(&store(), &Config::default());
        assert_eq!(rules.len(), 26);
        let a = &rules[0];
        assert_eq!(a.letter, 'A');
        assert_eq!(a.pattern, r"(?-i:(?:4|@|A|a|\xD0[\x90\xB0]))");

        let mut buf = Vec::new();
        write_rules(&rules, &Header::new(&[]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\nA (?-i:(?:4|@|A|a|\\xD0[\\x90\\xB0]))\n"));
        assert!(text.contains("\nB (?-i:(?:[Bb]))\n"));
    }
}
