use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::{CodepointStore, MemoryStore};

/// Default bound on nested decomposition expansion.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// A resolution that reduces to this is treated as empty.
const EMPTY_PLACEHOLDER: &str = "()";

/// Options for the decomposition pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Counts from one `resolve_all` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveSummary {
    pub resolved: usize,
    pub unresolved: usize,
    pub cycles: usize,
}

/// Resolve the ASCII equivalent of `codepoint` from its decomposition.
///
/// Returns the existing value untouched when one is already set, `None` when the
/// record is unknown, has no decomposition, or reduces to nothing usable.
pub fn resolve<S: CodepointStore>(
    store: &mut S,
    codepoint: u32,
    options: &ResolveOptions,
) -> Result<Option<String>> {
    let parts = match store.get(codepoint) {
        None => return Ok(None),
        Some(record) => {
            if let Some(existing) = &record.ascii_equivalent {
                return Ok(Some(existing.clone()));
            }
            match record.decomposition_codepoints() {
                Some(parts) => parts,
                None => return Ok(None),
            }
        }
    };

    let expanded = expand(&*store, codepoint, &parts, options.max_depth)?;
    let filtered: String = expanded
        .chars()
        .filter(char::is_ascii)
        .collect();

    if filtered.is_empty() || filtered == EMPTY_PLACEHOLDER {
        debug!("U+{codepoint:04X}: decomposition has no ASCII content");
        return Ok(None);
    }

    store.set_ascii(codepoint, &filtered);
    Ok(Some(filtered))
}

/// Expand a decomposition sequence depth-first with an explicit work stack.
fn expand<S: CodepointStore>(
    store: &S,
    root: u32,
    parts: &[u32],
    max_depth: usize,
) -> Result<String> {
    let mut out = String::new();
    let mut stack: Vec<(u32, usize)> = parts.iter().rev().map(|&cp| (cp, 1)).collect();

    while let Some((cp, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(Error::DecompositionCycle {
                codepoint: root,
                depth,
            });
        }

        let record = store.get(cp);
        if let Some(nested) = record.and_then(|r| r.decomposition_codepoints()) {
            stack.extend(nested.into_iter().rev().map(|n| (n, depth + 1)));
            continue;
        }

        match record.and_then(|r| r.ascii_equivalent.as_deref()) {
            Some(ascii) => out.push_str(ascii),
            None => {
                if let Some(c) = char::from_u32(cp) {
                    out.push(c);
                }
            }
        }
    }

    Ok(out)
}

/// Resolve every record that has a decomposition and no ASCII value yet.
pub fn resolve_all(store: &mut MemoryStore, options: &ResolveOptions) -> ResolveSummary {
    let pending: Vec<u32> = store
        .records()
        .filter(|r| r.decomposition.is_some() && r.ascii_equivalent.is_none())
        .map(|r| r.codepoint)
        .collect();

    let mut summary = ResolveSummary::default();
    for codepoint in pending {
        match resolve(store, codepoint, options) {
            Ok(Some(_)) => summary.resolved += 1,
            Ok(None) => summary.unresolved += 1,
            Err(e) => {
                warn!("{e}; leaving unresolved");
                summary.cycles += 1;
            }
        }
    }

    info!(
        "decomposition pass: {} resolved, {} unresolved, {} cycles",
        summary.resolved, summary.unresolved, summary.cycles
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CodepointRecord;

    fn record(cp: u32, decomposition: Option<&str>, ascii: Option<&str>) -> CodepointRecord {
        let mut r = CodepointRecord::new(cp);
        r.decomposition = decomposition.map(String::from);
        r.ascii_equivalent = ascii.map(String::from);
        r
    }

    fn sample_store() -> MemoryStore {
        [
            record(0x41, None, None),
            record(0x61, None, None),
            record(0x0301, None, None),
            record(0x030A, None, None),
            // Á
            record(0x00C1, Some("0041 0301"), None),
            // Ǻ -> Å + acute -> A + ring + acute
            record(0x01FA, Some("00C5 0301"), None),
            record(0x00C5, Some("0041 030A"), None),
            // ﬃ
            record(0xFB03, Some("0066 0066 0069"), None),
            // combining-only decomposition
            record(0x0344, Some("0308 0301"), None),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_resolve_simple() {
        let mut store = sample_store();
        let got = resolve(&mut store, 0x00C1, &ResolveOptions::default()).unwrap();
        assert_eq!(got.as_deref(), Some("A"));
        assert_eq!(
            store.get(0x00C1).unwrap().ascii_equivalent.as_deref(),
            Some("A")
        );
    }

    #[test]
    fn test_resolve_nested() {
        let mut store = sample_store();
        let got = resolve(&mut store, 0x01FA, &ResolveOptions::default()).unwrap();
        assert_eq!(got.as_deref(), Some("A"));
    }

    #[test]
    fn test_resolve_multi_char() {
        let mut store = sample_store();
        let got = resolve(&mut store, 0xFB03, &ResolveOptions::default()).unwrap();
        assert_eq!(got.as_deref(), Some("ffi"));
    }

    #[test]
    fn test_resolve_uses_existing_constituent_value() {
        let mut store = sample_store();
        store.insert(record(0x0430, None, Some("a")));
        store.insert(record(0x04D1, Some("0430 0306"), None));
        let got = resolve(&mut store, 0x04D1, &ResolveOptions::default()).unwrap();
        assert_eq!(got.as_deref(), Some("a"));
    }

    #[test]
    fn test_resolve_empty_stays_null() {
        let mut store = sample_store();
        let got = resolve(&mut store, 0x0344, &ResolveOptions::default()).unwrap();
        assert_eq!(got, None);
        assert_eq!(store.get(0x0344).unwrap().ascii_equivalent, None);
    }

    #[test]
    fn test_resolve_placeholder_rejected() {
        let mut store = sample_store();
        store.insert(record(0x28, None, None));
        store.insert(record(0x29, None, None));
        store.insert(record(0x1F12F, Some("0028 0029"), None));
        let got = resolve(&mut store, 0x1F12F, &ResolveOptions::default()).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn test_resolve_keeps_ascii_controls() {
        let mut store = sample_store();
        store.insert(record(0x09, None, None));
        store.insert(record(0xE000, Some("0041 0301 0009"), None));
        let got = resolve(&mut store, 0xE000, &ResolveOptions::default()).unwrap();
        assert_eq!(got.as_deref(), Some("A\t"));
    }

    #[test]
    fn test_resolve_idempotent() {
        let mut store = sample_store();
        let opts = ResolveOptions::default();
        let first = resolve(&mut store, 0x00C1, &opts).unwrap();
        let snapshot = store.get(0x00C1).cloned();
        let second = resolve(&mut store, 0x00C1, &opts).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get(0x00C1).cloned(), snapshot);
    }

    #[test]
    fn test_resolve_never_overwrites() {
        let mut store = sample_store();
        store.insert(record(0x00C1, Some("0041 0301"), Some("_?_")));
        let got = resolve(&mut store, 0x00C1, &ResolveOptions::default()).unwrap();
        assert_eq!(got.as_deref(), Some("_?_"));
    }

    #[test]
    fn test_resolve_cycle_is_bounded() {
        let mut store: MemoryStore = [
            record(0xE000, Some("E001"), None),
            record(0xE001, Some("E000"), None),
        ]
        .into_iter()
        .collect();
        let err = resolve(&mut store, 0xE000, &ResolveOptions { max_depth: 8 }).unwrap_err();
        assert!(matches!(
            err,
            Error::DecompositionCycle {
                codepoint: 0xE000,
                ..
            }
        ));
        assert_eq!(store.get(0xE000).unwrap().ascii_equivalent, None);
    }

    #[test]
    fn test_resolve_all_continues_after_cycle() {
        let mut store = sample_store();
        store.insert(record(0xE000, Some("E001"), None));
        store.insert(record(0xE001, Some("E000"), None));
        let summary = resolve_all(&mut store, &ResolveOptions { max_depth: 4 });
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.resolved, 4);
        assert_eq!(summary.unresolved, 1);
    }
}
