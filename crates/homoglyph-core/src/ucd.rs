//! Loader for local `UnicodeData.txt` files.
//!
//! Produces one record per listed code point. `<..., First>` / `<..., Last>`
//! pairs are not expanded; they become special ranges named after the entry.

use std::fs;
use std::path::Path;

use log::debug;

use crate::coverage::MAX_CODEPOINT;
use crate::error::{Error, Result};
use crate::store::{CodepointRecord, MemoryStore, SpecialRange};

/// Parsed contents of a UnicodeData file.
#[derive(Debug, Default)]
pub struct UcdData {
    pub store: MemoryStore,
    /// Ranges declared with First/Last pairs, ascending.
    pub ranges: Vec<SpecialRange>,
}

fn parse_hex(field: &str, line: usize) -> Result<u32> {
    u32::from_str_radix(field.trim(), 16).map_err(|e| Error::UcdLine {
        line,
        reason: format!("bad code point {field:?}: {e}"),
    })
}

fn non_empty(field: &str) -> Option<String> {
    let field = field.trim();
    (!field.is_empty()).then(|| field.to_string())
}

/// Split a decomposition field into its tag and its code point list.
fn split_decomposition(field: &str) -> (Option<String>, Option<String>) {
    let field = field.trim();
    if field.is_empty() {
        return (None, None);
    }
    match field.strip_prefix('<').and_then(|rest| rest.split_once('>')) {
        Some((tag, codes)) => (Some(tag.to_string()), non_empty(codes)),
        None => (None, Some(field.to_string())),
    }
}

fn is_whitespace(codepoint: u32, category: &str) -> bool {
    matches!(category, "Zs" | "Zl" | "Zp") || matches!(codepoint, 0x09..=0x0D | 0x85)
}

fn is_zero_width(codepoint: u32, category: &str) -> bool {
    matches!(category, "Mn" | "Me" | "Cf") || codepoint == 0x200B
}

fn is_printable(category: &str) -> bool {
    !(category.starts_with('C') || matches!(category, "Zl" | "Zp"))
}

/// Parse UnicodeData text.
pub fn parse(text: &str) -> Result<UcdData> {
    let mut data = UcdData::default();
    let mut open_range: Option<(u32, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = raw.split(';').collect();
        if fields.len() < 14 {
            return Err(Error::UcdLine {
                line,
                reason: format!("expected 15 fields, found {}", fields.len()),
            });
        }

        let codepoint = parse_hex(fields[0], line)?;
        let name = fields[1].trim();

        if let Some(label) = name.strip_prefix('<').and_then(|n| n.strip_suffix(", First>")) {
            open_range = Some((codepoint, label.to_string()));
            continue;
        }
        if let Some(label) = name.strip_prefix('<').and_then(|n| n.strip_suffix(", Last>")) {
            match open_range.take() {
                Some((first, open_label)) if open_label == label && first <= codepoint => {
                    data.ranges.push(SpecialRange::new(first, codepoint, label));
                }
                _ => {
                    return Err(Error::UcdLine {
                        line,
                        reason: format!("range end {label:?} without matching start"),
                    })
                }
            }
            continue;
        }

        let category = fields[2].trim();
        let combining_class = fields[3].trim().parse::<u8>().map_err(|e| Error::UcdLine {
            line,
            reason: format!("bad combining class {:?}: {e}", fields[3]),
        })?;
        let (decomposition_tag, decomposition) = split_decomposition(fields[5]);

        // Names like "<control>" carry no description; field 10 has the old name.
        let description = if name.starts_with('<') {
            non_empty(fields[10]).unwrap_or_else(|| name.to_string())
        } else {
            name.to_string()
        };

        data.store.insert(CodepointRecord {
            codepoint,
            description,
            category: category.to_string(),
            bidi_class: fields[4].trim().to_string(),
            combining_class,
            is_upper: category == "Lu",
            is_lower: category == "Ll",
            is_emoji: false,
            is_whitespace: is_whitespace(codepoint, category),
            is_printable: is_printable(category),
            is_zero_width: is_zero_width(codepoint, category),
            decomposition,
            decomposition_tag,
            uppercase: non_empty(fields[12]),
            lowercase: non_empty(fields[13]),
            ascii_equivalent: None,
        });
    }

    if let Some((first, label)) = open_range {
        return Err(Error::UcdLine {
            line: 0,
            reason: format!("range {label:?} starting at U+{first:04X} is never closed"),
        });
    }

    data.ranges.sort_by_key(|r| r.first);
    debug!(
        "parsed {} records and {} ranges covering {} code points",
        data.store.len(),
        data.ranges.len(),
        data.ranges.iter().map(|r| r.count() as u64).sum::<u64>()
    );
    Ok(data)
}

/// Read and parse a UnicodeData file.
pub fn load(path: &Path) -> Result<UcdData> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

/// Flag code points listed with the `Emoji` property in `emoji-data.txt` text.
/// Returns how many records were flagged.
///
/// Ranges are clamped to U+10FFFF and only visit records that exist.
pub fn apply_emoji_data(store: &mut MemoryStore, text: &str) -> usize {
    let mut count = 0;
    for line in text.lines() {
        let content = line.split('#').next().unwrap_or("").trim();
        let Some((cps, property)) = content.split_once(';') else {
            continue;
        };
        if property.trim() != "Emoji" {
            continue;
        }
        let (lo, hi) = match cps.trim().split_once("..") {
            Some((lo, hi)) => (lo, hi),
            None => (cps.trim(), cps.trim()),
        };
        let (Ok(lo), Ok(hi)) = (u32::from_str_radix(lo, 16), u32::from_str_radix(hi, 16)) else {
            continue;
        };
        let hi = hi.min(MAX_CODEPOINT);
        if lo > hi {
            continue;
        }
        for record in store.range_mut(lo, hi) {
            if !record.is_emoji {
                record.is_emoji = true;
                count += 1;
            }
        }
    }
    count
}

/// Non-characters: U+FDD0..U+FDEF and the last two code points of every plane.
pub fn noncharacter_ranges() -> Vec<SpecialRange> {
    let mut ranges = vec![SpecialRange::new(0xFDD0, 0xFDEF, "Non-Character")];
    for plane in 0..=0x10u32 {
        let base = plane << 16;
        ranges.push(SpecialRange::new(base | 0xFFFE, base | 0xFFFF, "Non-Character"));
    }
    ranges.sort_by_key(|r| r.first);
    ranges
}
