//! End-to-end build: UCD records, confusable merge, decomposition resolve,
//! then map and rule generation.

use std::time::Instant;

use log::info;
use serde::Serialize;

use crate::artifact::{self, MapEntry, Rule};
use crate::config::Config;
use crate::confusables::{self, MergeSummary};
use crate::coverage::{self, CoverageIssue, MAX_CODEPOINT};
use crate::decompose::{self, ResolveSummary};
use crate::error::Result;
use crate::store::{MemoryStore, SpecialRange};
use crate::ucd;

/// Raw input texts for one build.
#[derive(Debug, Clone, Copy)]
pub struct BuildInputs<'a> {
    pub ucd: &'a str,
    pub confusables: &'a str,
    pub emoji: Option<&'a str>,
}

/// A code point whose value is the ambiguity sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub codepoint: u32,
    pub description: String,
}

/// Per-pass wall-clock timings in milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timings {
    pub load_ms: f64,
    pub merge_ms: f64,
    pub resolve_ms: f64,
    pub artifacts_ms: f64,
    pub total_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub records: usize,
    pub special_ranges: usize,
    pub emoji_flagged: usize,
    pub merge: MergeSummary,
    pub resolve: ResolveSummary,
    pub map_entries: usize,
    pub rules: usize,
    pub review: Vec<ReviewItem>,
    pub config_path_used: Option<String>,
    pub timings_ms: Timings,
}

/// Everything a build produces.
#[derive(Debug)]
pub struct BuildOutput {
    pub store: MemoryStore,
    pub ranges: Vec<SpecialRange>,
    pub map: Vec<MapEntry>,
    pub rules: Vec<Rule>,
    pub summary: BuildSummary,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Run the full pipeline over in-memory inputs.
///
/// The confusable merge runs before decomposition resolution, so confusable
/// targets take precedence over decomposition-derived ones.
pub fn build(inputs: BuildInputs<'_>, config: &Config) -> Result<BuildOutput> {
    let total = Instant::now();
    let mut timings = Timings::default();

    let start = Instant::now();
    let ucd::UcdData { mut store, ranges } = ucd::parse(inputs.ucd)?;
    let emoji_flagged = inputs
        .emoji
        .map(|text| ucd::apply_emoji_data(&mut store, text))
        .unwrap_or(0);
    timings.load_ms = elapsed_ms(start);

    let start = Instant::now();
    let rows = confusables::parse_summary(inputs.confusables);
    let merge = confusables::merge_rows(&mut store, rows, &config.merge_options());
    timings.merge_ms = elapsed_ms(start);

    let start = Instant::now();
    let resolve = decompose::resolve_all(&mut store, &config.resolve_options());
    timings.resolve_ms = elapsed_ms(start);

    let start = Instant::now();
    let map = artifact::map_entries(&store, &config.sentinel);
    let rules = artifact::build_rules(&store, config);
    let review = review_items(&store, &config.sentinel);
    timings.artifacts_ms = elapsed_ms(start);
    timings.total_ms = elapsed_ms(total);

    info!(
        "build: {} records, {} map entries, {} rules, {} for review",
        store.len(),
        map.len(),
        rules.len(),
        review.len()
    );

    let summary = BuildSummary {
        records: store.len(),
        special_ranges: ranges.len(),
        emoji_flagged,
        merge,
        resolve,
        map_entries: map.len(),
        rules: rules.len(),
        review,
        config_path_used: config.path.clone(),
        timings_ms: timings,
    };

    Ok(BuildOutput {
        store,
        ranges,
        map,
        rules,
        summary,
    })
}

fn review_items(store: &MemoryStore, sentinel: &str) -> Vec<ReviewItem> {
    store
        .records()
        .filter(|r| r.ascii_equivalent.as_deref() == Some(sentinel))
        .map(|r| ReviewItem {
            codepoint: r.codepoint,
            description: r.description.clone(),
        })
        .collect()
}

/// UCD ranges, built-in non-characters, and configured reserved ranges, sorted
/// by first code point.
pub fn special_ranges(ucd_ranges: &[SpecialRange], config: &Config) -> Vec<SpecialRange> {
    let mut ranges: Vec<SpecialRange> = ucd_ranges
        .iter()
        .cloned()
        .chain(ucd::noncharacter_ranges())
        .chain(config.reserved_ranges.iter().cloned())
        .collect();
    ranges.sort_by_key(|r| (r.first, r.last));
    ranges
}

/// Scan the whole code space for gaps and overlaps.
pub fn coverage_report(
    store: &MemoryStore,
    ucd_ranges: &[SpecialRange],
    config: &Config,
) -> Result<Vec<CoverageIssue>> {
    let ranges = special_ranges(ucd_ranges, config);
    coverage::scan_through(&store.codepoints(), &ranges, MAX_CODEPOINT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::IssueKind;
    use crate::store::CodepointStore;

    const UCD: &str = "\
0030;DIGIT ZERO;Nd;0;EN;;0;0;0;N;;;;;
0041;LATIN CAPITAL LETTER A;Lu;0;L;;;;;N;;;;0061;
004F;LATIN CAPITAL LETTER O;Lu;0;L;;;;;N;;;;006F;
0061;LATIN SMALL LETTER A;Ll;0;L;;;;;N;;;0041;;0041
00E1;LATIN SMALL LETTER A WITH ACUTE;Ll;0;L;0061 0301;;;;N;LATIN SMALL LETTER A ACUTE;;00C1;;00C1
0301;COMBINING ACUTE ACCENT;Mn;230;NSM;;;;;N;NON-SPACING ACUTE;;;;
039F;GREEK CAPITAL LETTER OMICRON;Lu;0;L;;;;;N;;;;03BF;
0430;CYRILLIC SMALL LETTER A;Ll;0;L;;;;;N;;;0410;;0410
3000;IDEOGRAPHIC SPACE;Zs;0;WS;<wide> 0020;;;;N;;;;;
";

    const CONFUSABLES: &str = "\
# sample
0061
0430

0030
004F # LATIN CAPITAL LETTER O
039F
";

    fn run() -> BuildOutput {
        let inputs = BuildInputs {
            ucd: UCD,
            confusables: CONFUSABLES,
            emoji: None,
        };
        build(inputs, &Config::default()).unwrap()
    }

    #[test]
    fn test_build_assigns_values() {
        let out = run();
        let ascii = |cp| {
            out.store
                .get(cp)
                .and_then(|r| r.ascii_equivalent.clone())
        };
        assert_eq!(ascii(0x0430).as_deref(), Some("a"));
        assert_eq!(ascii(0x00E1).as_deref(), Some("a"));
        assert_eq!(ascii(0x039F).as_deref(), Some("_?_"));
        assert_eq!(ascii(0x0061), None);
        assert_eq!(out.summary.merge.ambiguous.len(), 1);
    }

    #[test]
    fn test_build_review_and_map() {
        let out = run();
        assert_eq!(
            out.summary.review,
            vec![ReviewItem {
                codepoint: 0x039F,
                description: "GREEK CAPITAL LETTER OMICRON".to_string(),
            }]
        );
        assert!(out.map.iter().all(|e| e.codepoint != 0x039F));
        let space = out.map.iter().find(|e| e.codepoint == 0x3000).unwrap();
        assert_eq!(space.ascii, " ");
        assert_eq!(out.summary.rules, 26);
    }

    #[test]
    fn test_special_ranges_sorted() {
        let mut config = Config::default();
        config.reserved_ranges = vec![SpecialRange::new(0x0378, 0x0379, "Reserved")];
        let ucd_ranges = [SpecialRange::new(0x3400, 0x4DBF, "CJK Ideograph Extension A")];
        let ranges = special_ranges(&ucd_ranges, &config);
        assert_eq!(ranges.len(), 20);
        assert!(ranges.windows(2).all(|w| w[0].first <= w[1].first));
        assert_eq!(ranges[0].first, 0x0378);
    }

    #[test]
    fn test_coverage_report_reports_gaps() {
        let out = run();
        let issues = coverage_report(&out.store, &out.ranges, &Config::default()).unwrap();
        assert_eq!(issues[0].kind, IssueKind::Gap);
        assert_eq!((issues[0].from, issues[0].to), (0, 0x2F));
        assert!(issues.iter().all(|i| i.kind == IssueKind::Gap));
        assert_eq!(issues.last().unwrap().to, MAX_CODEPOINT - 2);
    }
}
