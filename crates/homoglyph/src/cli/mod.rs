pub mod build;
pub mod coverage;
pub mod pattern;

use std::path::Path;

use homoglyph_core::config::Config;

/// An explicit `--config` wins over discovery; a broken explicit file is an error.
fn load_config(path: Option<&Path>) -> Option<Config> {
    match path {
        Some(path) => match Config::load(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("homoglyph: failed to load config {}: {e}", path.display());
                None
            }
        },
        None => {
            let config = Config::discover(None);
            log::debug!("config: {}", config.path.as_deref().unwrap_or("defaults"));
            Some(config)
        }
    }
}

fn read_input(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            eprintln!("homoglyph: cannot read {}: {e}", path.display());
            None
        }
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
