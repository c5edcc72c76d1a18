use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use homoglyph_core::confusables::{self, MergeOptions};
use homoglyph_core::pattern;
use homoglyph_core::store::{CodepointRecord, CodepointStore, MemoryStore};
use regex::bytes::RegexBuilder;

#[derive(Debug, Deserialize)]
struct FixtureFile<T> {
    fixture: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PatternFixture {
    name: String,
    variants: Vec<String>,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    matches: Vec<String>,
    #[serde(default)]
    rejects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterFixture {
    name: String,
    rows: Vec<String>,
    store: Vec<String>,
    expected: Vec<(String, String)>,
    #[serde(default)]
    unwritten: Vec<String>,
    ambiguous: usize,
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
}

fn load_fixtures<T: serde::de::DeserializeOwned>(filename: &str) -> Vec<T> {
    let path = fixtures_dir().join(filename);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    let file: FixtureFile<T> = toml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));
    file.fixture
}

fn hex(cp: &str) -> u32 {
    u32::from_str_radix(cp, 16).unwrap_or_else(|e| panic!("bad hex {cp:?}: {e}"))
}

fn run_pattern_fixture(fixture: &PatternFixture) {
    let synthesized = pattern::synthesize(&fixture.variants)
        .unwrap_or_else(|| panic!("Fixture '{}': no pattern", fixture.name));

    if let Some(expected) = &fixture.expected {
        assert_eq!(
            &synthesized, expected,
            "Fixture '{}': pattern text differs",
            fixture.name
        );
    }

    // Anchored, and with case folding switched on outside the pattern.
    let re = RegexBuilder::new(&format!("^{synthesized}$"))
        .unicode(false)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("Fixture '{}': {e}", fixture.name));

    for s in &fixture.matches {
        assert!(
            re.is_match(s.as_bytes()),
            "Fixture '{}': {s:?} should match {synthesized}",
            fixture.name
        );
    }
    for s in &fixture.rejects {
        assert!(
            !re.is_match(s.as_bytes()),
            "Fixture '{}': {s:?} should not match {synthesized}",
            fixture.name
        );
    }
}

fn run_cluster_fixture(fixture: &ClusterFixture) {
    let mut store: MemoryStore = fixture
        .store
        .iter()
        .map(|cp| CodepointRecord::new(hex(cp)))
        .collect();

    let text = fixture.rows.join("\n");
    let rows = confusables::parse_summary(&text);
    let summary = confusables::merge_rows(&mut store, rows, &MergeOptions::default());

    assert_eq!(
        summary.ambiguous.len(),
        fixture.ambiguous,
        "Fixture '{}': ambiguous cluster count",
        fixture.name
    );
    for (cp, value) in &fixture.expected {
        let actual = store
            .get(hex(cp))
            .and_then(|r| r.ascii_equivalent.as_deref());
        assert_eq!(
            actual,
            Some(value.as_str()),
            "Fixture '{}': value of U+{cp}",
            fixture.name
        );
    }
    for cp in &fixture.unwritten {
        let actual = store
            .get(hex(cp))
            .and_then(|r| r.ascii_equivalent.as_deref());
        assert_eq!(
            actual, None,
            "Fixture '{}': U+{cp} should stay unset",
            fixture.name
        );
    }
}

#[test]
fn test_pattern_fixtures() {
    let fixtures: Vec<PatternFixture> = load_fixtures("patterns.toml");
    let count = fixtures.len();
    for fixture in &fixtures {
        run_pattern_fixture(fixture);
    }
    eprintln!("Passed {count} pattern fixtures");
}

#[test]
fn test_cluster_fixtures() {
    let fixtures: Vec<ClusterFixture> = load_fixtures("clusters.toml");
    let count = fixtures.len();
    for fixture in &fixtures {
        run_cluster_fixture(fixture);
    }
    eprintln!("Passed {count} cluster fixtures");
}

#[test]
fn test_fixture_names_unique() {
    let mut names: Vec<String> = load_fixtures::<PatternFixture>("patterns.toml")
        .into_iter()
        .map(|f| f.name)
        .chain(
            load_fixtures::<ClusterFixture>("clusters.toml")
                .into_iter()
                .map(|f| f.name),
        )
        .collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total, "duplicate fixture names");
}
