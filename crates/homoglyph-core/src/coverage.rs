use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};
use crate::store::SpecialRange;

/// Highest Unicode code point.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Gap,
    Overlap,
}

/// A stretch of code points that is either uncovered or covered twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageIssue {
    pub kind: IssueKind,
    pub from: u32,
    pub to: u32,
    pub count: u32,
}

impl fmt::Display for CoverageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            IssueKind::Gap => "Missing",
            IssueKind::Overlap => "Overlap",
        };
        write!(
            f,
            "{label}: U+{:04X} - U+{:04X} ({})",
            self.from, self.to, self.count
        )
    }
}

fn validate(assigned: &[u32], ranges: &[SpecialRange]) -> Result<()> {
    if let Some(w) = assigned.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::MalformedRangeInput {
            reason: format!(
                "assigned code points not strictly ascending at U+{:04X}, U+{:04X}",
                w[0], w[1]
            ),
        });
    }
    if let Some(&cp) = assigned.last().filter(|&&cp| cp > MAX_CODEPOINT) {
        return Err(Error::MalformedRangeInput {
            reason: format!("assigned code point {cp:#X} is beyond U+10FFFF"),
        });
    }
    for range in ranges {
        if range.first > range.last || range.last > MAX_CODEPOINT {
            return Err(Error::MalformedRangeInput {
                reason: format!("invalid range {range}"),
            });
        }
    }
    if let Some(w) = ranges.windows(2).find(|w| w[0].first > w[1].first) {
        return Err(Error::MalformedRangeInput {
            reason: format!("ranges not ascending: {} before {}", w[0], w[1]),
        });
    }
    Ok(())
}

/// Merge assigned code points with special ranges and report gaps and overlaps.
///
/// Both inputs must be sorted; `assigned` strictly ascending, `ranges` ascending
/// by first code point. Ties between an assigned code point and a range start are
/// taken assigned first.
pub fn scan(assigned: &[u32], ranges: &[SpecialRange]) -> Result<Vec<CoverageIssue>> {
    validate(assigned, ranges)?;

    let mut issues = Vec::new();
    let mut last: i64 = -1;
    let (mut i, mut j) = (0, 0);

    while i < assigned.len() || j < ranges.len() {
        let take_assigned = match (assigned.get(i), ranges.get(j)) {
            (Some(&cp), Some(range)) => cp <= range.first,
            (Some(_), None) => true,
            _ => false,
        };

        let (d, next_last) = if take_assigned {
            let cp = assigned[i];
            i += 1;
            (cp as i64, cp as i64)
        } else {
            let range = &ranges[j];
            j += 1;
            (range.first as i64, range.last as i64)
        };

        if d > last + 1 {
            issues.push(CoverageIssue {
                kind: IssueKind::Gap,
                from: (last + 1) as u32,
                to: (d - 1) as u32,
                count: (d - last - 1) as u32,
            });
        } else if d < last + 1 {
            issues.push(CoverageIssue {
                kind: IssueKind::Overlap,
                from: d as u32,
                to: last as u32,
                count: (last - d + 1) as u32,
            });
        }
        last = next_last;
    }

    Ok(issues)
}

/// Like [`scan`], plus a trailing gap when coverage stops short of `end`.
pub fn scan_through(
    assigned: &[u32],
    ranges: &[SpecialRange],
    end: u32,
) -> Result<Vec<CoverageIssue>> {
    let mut issues = scan(assigned, ranges)?;

    let covered_to = assigned
        .last()
        .copied()
        .into_iter()
        .chain(ranges.iter().map(|r| r.last))
        .max()
        .map(|cp| cp as i64)
        .unwrap_or(-1);

    if (end as i64) > covered_to {
        let from = (covered_to + 1) as u32;
        issues.push(CoverageIssue {
            kind: IssueKind::Gap,
            from,
            to: end,
            count: end - from + 1,
        });
    }
    Ok(issues)
}
