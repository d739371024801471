pub mod types;

pub use types::Config;

use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Reads a TOML config file; missing sections and fields fall back to defaults.
pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config = parse(&content)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn parse(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}
