use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load application settings from a file into any `Deserialize` structure.
/// The format is chosen by file extension: `.toml` or `.json`.
pub fn load_settings<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings file {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("parsing {} as toml", path.display())),
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("parsing {} as json", path.display())),
        Some(ext) => anyhow::bail!("unsupported settings format: .{ext}, use .toml or .json"),
        None => anyhow::bail!("settings file has no extension, use .toml or .json"),
    }
}
