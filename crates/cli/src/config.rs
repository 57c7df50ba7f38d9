//! Optional `aidl.toml` configuration for `aidl --config`.
//!
//! # Example
//!
//! ```toml
//! [options]
//! import_paths = ["frameworks/base/core/java", "system/libhidl"]
//! preprocessed_files = ["out/framework.aidl"]
//! structured = true
//! ```
//!
//! Command line values are appended after the file's.

use std::path::Path;

use aidl_core::Options;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    options: Options,
}

/// Parse a config file body.
pub fn parse_config(content: &str) -> Result<Options, String> {
    let file: ConfigFile = toml::from_str(content).map_err(|e| e.to_string())?;
    Ok(file.options)
}

/// Read and parse the config file at `path`.
pub fn read_config(path: &Path) -> Result<Options, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    parse_config(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}
