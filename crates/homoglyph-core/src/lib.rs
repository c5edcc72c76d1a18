pub mod artifact;
pub mod config;
pub mod confusables;
pub mod coverage;
pub mod decompose;
pub mod error;
pub mod output;
pub mod pattern;
pub mod pipeline;
pub mod store;
pub mod ucd;

pub use error::{Error, Result};
