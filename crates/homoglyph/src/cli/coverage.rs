use std::path::Path;

use homoglyph_core::{output, pipeline, ucd};

/// Exit 2 when any gap or overlap is found.
pub fn run(ucd_path: &Path, config_path: Option<&Path>, json: bool) -> i32 {
    let Some(config) = super::load_config(config_path) else {
        return 1;
    };
    let Some(text) = super::read_input(ucd_path) else {
        return 1;
    };

    let data = match ucd::parse(&text) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("homoglyph: {}: {e}", ucd_path.display());
            return 1;
        }
    };

    let issues = match pipeline::coverage_report(&data.store, &data.ranges, &config) {
        Ok(issues) => issues,
        Err(e) => {
            eprintln!("homoglyph: coverage scan failed: {e}");
            return 1;
        }
    };

    let printed = if json {
        output::write_coverage_json(&issues, std::io::stdout().lock())
    } else {
        output::write_coverage_auto(&issues)
    };
    if let Err(e) = printed {
        eprintln!("homoglyph: output failed: {e}");
        return 1;
    }

    if issues.is_empty() {
        0
    } else {
        2
    }
}
