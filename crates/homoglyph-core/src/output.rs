use std::io::Write;

use crate::coverage::{CoverageIssue, IssueKind};
use crate::pipeline::BuildSummary;

const SCHEMA_VERSION: u32 = 1;

/// JSON coverage report with schema version.
#[derive(serde::Serialize)]
pub struct CoverageJson<'a> {
    pub schema_version: u32,
    pub gaps: usize,
    pub overlaps: usize,
    pub issues: &'a [CoverageIssue],
}

/// JSON build summary with schema version.
#[derive(serde::Serialize)]
pub struct BuildJson<'a> {
    pub schema_version: u32,
    #[serde(flatten)]
    pub summary: &'a BuildSummary,
}

fn count(issues: &[CoverageIssue], kind: IssueKind) -> usize {
    issues.iter().filter(|i| i.kind == kind).count()
}

/// Write coverage issues as JSON to the given writer.
pub fn write_coverage_json(issues: &[CoverageIssue], mut w: impl Write) -> std::io::Result<()> {
    let output = CoverageJson {
        schema_version: SCHEMA_VERSION,
        gaps: count(issues, IssueKind::Gap),
        overlaps: count(issues, IssueKind::Overlap),
        issues,
    };
    serde_json::to_writer(&mut w, &output)?;
    writeln!(w)?;
    Ok(())
}

/// Write a build summary as JSON to the given writer.
pub fn write_build_json(summary: &BuildSummary, mut w: impl Write) -> std::io::Result<()> {
    let output = BuildJson {
        schema_version: SCHEMA_VERSION,
        summary,
    };
    serde_json::to_writer(&mut w, &output)?;
    writeln!(w)?;
    Ok(())
}

/// Write human-readable coverage issues, one `Missing:`/`Overlap:` line each.
pub fn write_coverage_human(
    issues: &[CoverageIssue],
    mut w: impl Write,
    color: bool,
) -> std::io::Result<()> {
    for issue in issues {
        if color {
            let c = match issue.kind {
                IssueKind::Gap => "\x1b[33m",     // yellow
                IssueKind::Overlap => "\x1b[31m", // red
            };
            writeln!(w, "{c}{issue}\x1b[0m")?;
        } else {
            writeln!(w, "{issue}")?;
        }
    }
    writeln!(
        w,
        "homoglyph: {} gaps, {} overlaps",
        count(issues, IssueKind::Gap),
        count(issues, IssueKind::Overlap)
    )?;
    Ok(())
}

/// Write a human-readable build summary.
pub fn write_build_human(
    summary: &BuildSummary,
    mut w: impl Write,
    color: bool,
) -> std::io::Result<()> {
    let (bold, yellow, reset) = if color {
        ("\x1b[1m", "\x1b[33m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    writeln!(w, "{bold}homoglyph: build complete{reset}")?;
    writeln!(
        w,
        "  records: {} ({} special ranges, {} emoji)",
        summary.records, summary.special_ranges, summary.emoji_flagged
    )?;
    writeln!(
        w,
        "  confusables: {} clusters, {} written, {} ambiguous",
        summary.merge.clusters,
        summary.merge.written,
        summary.merge.ambiguous.len()
    )?;
    writeln!(
        w,
        "  decompositions: {} resolved, {} unresolved, {} cycles",
        summary.resolve.resolved, summary.resolve.unresolved, summary.resolve.cycles
    )?;
    writeln!(
        w,
        "  artifacts: {} map entries, {} rules",
        summary.map_entries, summary.rules
    )?;
    if let Some(path) = &summary.config_path_used {
        writeln!(w, "  config: {path}")?;
    }

    if !summary.review.is_empty() {
        writeln!(
            w,
            "{yellow}  needs review ({}):{reset}",
            summary.review.len()
        )?;
        for item in &summary.review {
            writeln!(w, "    U+{:04X} {}", item.codepoint, item.description)?;
        }
    }
    Ok(())
}

/// True when stderr is a terminal and colors may be used.
pub fn stderr_is_tty() -> bool {
    let stderr = std::io::stderr();
    is_terminal::is_terminal(&stderr)
}

/// Write coverage issues to stderr, with colors only on a TTY.
pub fn write_coverage_auto(issues: &[CoverageIssue]) -> std::io::Result<()> {
    write_coverage_human(issues, std::io::stderr().lock(), stderr_is_tty())
}

/// Write a build summary to stderr, with colors only on a TTY.
pub fn write_build_auto(summary: &BuildSummary) -> std::io::Result<()> {
    write_build_human(summary, std::io::stderr().lock(), stderr_is_tty())
}
