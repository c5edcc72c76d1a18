use etcetera::BaseStrategy;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::confusables::{AmbiguityPolicy, MergeOptions, DEFAULT_SENTINEL};
use crate::decompose::{ResolveOptions, DEFAULT_MAX_DEPTH};
use crate::error::Result;
use crate::store::SpecialRange;

/// Environment variable naming a root directory that holds `.homoglyph/`.
pub const CONFIG_ROOT_ENV: &str = "HOMOGLYPH_CONFIG_ROOT";

/// Try both `.yaml` and `.yml` extensions in a directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    let yaml = dir.join("config.yaml");
    if yaml.exists() {
        return Some(yaml);
    }
    let yml = dir.join("config.yml");
    if yml.exists() {
        return Some(yml);
    }
    None
}

/// Pipeline configuration loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path this config was loaded from.
    #[serde(skip)]
    pub path: Option<String>,

    /// Bound on nested decomposition expansion.
    pub max_decomposition_depth: usize,

    /// Value written for members of ambiguous confusable clusters.
    pub sentinel: String,

    /// What ambiguous clusters write: "sentinel" (default) or "first_candidate".
    pub ambiguity_policy: AmbiguityPolicy,

    /// Extra literals matched for each letter, keyed by uppercase letter.
    pub fallback_literals: BTreeMap<String, Vec<String>>,

    /// Ranges known to be unassigned, excluded from gap reports.
    pub reserved_ranges: Vec<SpecialRange>,
}

fn default_fallback_literals() -> BTreeMap<String, Vec<String>> {
    [
        ("A", &["@", "4"][..]),
        ("E", &["3"][..]),
        ("I", &["1", "|", "!"][..]),
        ("L", &["1", "|"][..]),
        ("O", &["0"][..]),
        ("S", &["$", "5"][..]),
        ("T", &["7"][..]),
    ]
    .into_iter()
    .map(|(letter, literals)| {
        (
            letter.to_string(),
            literals.iter().map(|l| l.to_string()).collect(),
        )
    })
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            max_decomposition_depth: DEFAULT_MAX_DEPTH,
            sentinel: DEFAULT_SENTINEL.to_string(),
            ambiguity_policy: AmbiguityPolicy::Sentinel,
            fallback_literals: default_fallback_literals(),
            reserved_ranges: Vec::new(),
        }
    }
}

impl Config {
    /// Discover and load config: env override, then walk up from `cwd` to the
    /// repository root, then the user config directory.
    pub fn discover(cwd: Option<&str>) -> Self {
        if let Ok(root) = std::env::var(CONFIG_ROOT_ENV) {
            if let Some(path) = find_config_in_dir(&PathBuf::from(&root).join(".homoglyph")) {
                return Self::load_or_default(&path);
            }
        }

        match discover_config_path(cwd) {
            Some(path) => Self::load_or_default(&path),
            None => match user_config_path() {
                Some(user_path) => Self::load_or_default(&user_path),
                None => Config::default(),
            },
        }
    }

    /// Load an explicitly named config file. Errors are returned, not defaulted.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.path = Some(path.display().to_string());
        Ok(config)
    }

    fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to load config at {}: {e}", path.display());
                Config::default()
            }
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.max_decomposition_depth,
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            sentinel: self.sentinel.clone(),
            policy: self.ambiguity_policy,
        }
    }

    /// Fallback literals for `letter`, case-insensitive.
    pub fn fallbacks_for(&self, letter: char) -> &[String] {
        self.fallback_literals
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&letter.to_string()))
            .map(|(_, literals)| literals.as_slice())
            .unwrap_or(&[])
    }
}

/// Discover config path by walking up from cwd to .git boundary.
fn discover_config_path(cwd: Option<&str>) -> Option<PathBuf> {
    let start = cwd
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())?;

    let mut current = start.as_path();
    loop {
        if let Some(candidate) = find_config_in_dir(&current.join(".homoglyph")) {
            return Some(candidate);
        }

        if current.join(".git").exists() {
            return None;
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }

    None
}

fn user_config_path() -> Option<PathBuf> {
    find_config_in_dir(&config_dir()?)
}

/// Get homoglyph config directory.
pub fn config_dir() -> Option<PathBuf> {
    let base = etcetera::choose_base_strategy().ok()?;
    Some(base.config_dir().join("homoglyph"))
}
