//! Confusable cluster merging.
//!
//! Clusters arrive as rows separated by blank markers, the way the Unicode
//! `confusablesSummary.txt` groups them. Each cluster contributes at most one
//! ASCII target, written to the non-ASCII members that have no value yet.

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::store::{parse_codepoint_sequence, CodepointStore};

/// Written instead of a target when a cluster has several ASCII candidates.
pub const DEFAULT_SENTINEL: &str = "_?_";

/// Member line of the summary file: `←\t(‎ a ‎)\t0061\t LATIN SMALL LETTER A`.
static SUMMARY_MEMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^←\t[^\t]*\t([0-9A-Fa-f]{4,6}(?: [0-9A-Fa-f]{4,6})*)\t").unwrap());

/// Bare member line: hex code points, optionally followed by a comment.
static BARE_MEMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Fa-f]{4,6}(?: [0-9A-Fa-f]{4,6})*)\s*(?:#.*)?$").unwrap());

/// One row of cluster-delimited input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfusableRow {
    Boundary,
    Member(String),
}

/// A group of strings considered visually confusable with each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusableCluster {
    pub members: Vec<String>,
}

impl ConfusableCluster {
    pub fn new<I, T>(members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Distinct single-character printable ASCII members, in cluster order.
    pub fn ascii_candidates(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for member in &self.members {
            if is_ascii_target(member) && !out.contains(&member.as_str()) {
                out.push(member);
            }
        }
        out
    }
}

/// What non-ASCII members of an ambiguous cluster receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Write the sentinel so the cluster shows up for manual review.
    #[default]
    Sentinel,
    /// Write the first ASCII candidate, same as an unambiguous cluster.
    FirstCandidate,
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub sentinel: String,
    pub policy: AmbiguityPolicy,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            policy: AmbiguityPolicy::Sentinel,
        }
    }
}

/// A cluster with more than one ASCII candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousCluster {
    pub canonical: String,
    pub candidates: Vec<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
    pub clusters: usize,
    pub written: usize,
    pub ambiguous: Vec<AmbiguousCluster>,
}

fn is_ascii_target(member: &str) -> bool {
    let mut chars = member.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if (' '..='~').contains(&c))
}

fn single_char(member: &str) -> Option<char> {
    let mut chars = member.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Parse confusable summary text into rows.
///
/// Blank lines are boundaries, `#` lines are skipped, member lines are decoded
/// from their hex code point field. Anything else is ignored.
pub fn parse_summary(text: &str) -> Vec<ConfusableRow> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            rows.push(ConfusableRow::Boundary);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let hex = SUMMARY_MEMBER_RE
            .captures(line)
            .or_else(|| BARE_MEMBER_RE.captures(line.trim()))
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str());

        let Some(hex) = hex else {
            debug!("skipping unrecognized confusables line: {line:?}");
            continue;
        };

        let member: String = parse_codepoint_sequence(hex)
            .into_iter()
            .filter_map(char::from_u32)
            .collect();
        if !member.is_empty() {
            rows.push(ConfusableRow::Member(member));
        }
    }
    rows
}

/// Group rows into clusters: members accumulate until a boundary, and a trailing
/// open cluster is flushed at the end. Empty clusters are dropped.
pub fn clusters_from_rows<I>(rows: I) -> Vec<ConfusableCluster>
where
    I: IntoIterator<Item = ConfusableRow>,
{
    let mut clusters = Vec::new();
    let mut open = ConfusableCluster::default();

    for row in rows {
        match row {
            ConfusableRow::Member(member) => open.members.push(member),
            ConfusableRow::Boundary => {
                if !open.members.is_empty() {
                    clusters.push(std::mem::take(&mut open));
                }
            }
        }
    }
    if !open.members.is_empty() {
        clusters.push(open);
    }
    clusters
}

/// Assign one ASCII target per cluster and write it to the non-ASCII members.
pub fn merge<S: CodepointStore>(
    store: &mut S,
    clusters: &[ConfusableCluster],
    options: &MergeOptions,
) -> MergeSummary {
    let mut summary = MergeSummary {
        clusters: clusters.len(),
        ..MergeSummary::default()
    };

    for cluster in clusters {
        let candidates = cluster.ascii_candidates();
        let target = match candidates.as_slice() {
            [] => continue,
            [only] => only.to_string(),
            [first, ..] => {
                warn!(
                    "ambiguous confusable cluster: candidates {:?}, members {:?}",
                    candidates, cluster.members
                );
                summary.ambiguous.push(AmbiguousCluster {
                    canonical: first.to_string(),
                    candidates: candidates.iter().map(|c| c.to_string()).collect(),
                    members: cluster.members.clone(),
                });
                match options.policy {
                    AmbiguityPolicy::Sentinel => options.sentinel.clone(),
                    AmbiguityPolicy::FirstCandidate => first.to_string(),
                }
            }
        };

        for member in &cluster.members {
            let Some(c) = single_char(member) else {
                continue;
            };
            if c.is_ascii() {
                continue;
            }
            if store.set_ascii(c as u32, &target) {
                summary.written += 1;
            }
        }
    }

    info!(
        "confusables pass: {} clusters, {} writes, {} ambiguous",
        summary.clusters,
        summary.written,
        summary.ambiguous.len()
    );
    summary
}

/// Group `rows` into clusters and merge them.
pub fn merge_rows<S, I>(store: &mut S, rows: I, options: &MergeOptions) -> MergeSummary
where
    S: CodepointStore,
    I: IntoIterator<Item = ConfusableRow>,
{
    let clusters = clusters_from_rows(rows);
    merge(store, &clusters, options)
}
