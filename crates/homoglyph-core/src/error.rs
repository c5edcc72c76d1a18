use thiserror::Error;

/// Errors produced by the derivation pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Decomposition expansion went deeper than the configured bound.
    #[error("decomposition of U+{codepoint:04X} exceeds depth {depth}")]
    DecompositionCycle { codepoint: u32, depth: usize },

    /// Coverage scanner inputs are not ascending or not well-formed.
    #[error("malformed range input: {reason}")]
    MalformedRangeInput { reason: String },

    #[error("UnicodeData line {line}: {reason}")]
    UcdLine { line: usize, reason: String },

    #[error("map line {line}: {reason}")]
    MapLine { line: usize, reason: String },

    #[error("config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
