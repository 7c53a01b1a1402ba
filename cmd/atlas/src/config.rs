//! Configuration file handling.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use atlas_grouping::GroupingConfig;
use atlas_layout::LayoutConfig;
use serde::{Deserialize, Serialize};

/// Default base directory under the user's home.
pub const DEFAULT_BASE_DIR: &str = ".atlas";
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub layout: LayoutConfig,
    pub grouping: GroupingConfig,

    /// Store file used when --store is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,
}

/// Gets the default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
}

/// Loads the configuration.
///
/// An explicit path must exist. Without one, the default path is used if
/// present and built-in defaults otherwise.
pub fn load_config(path: Option<&str>) -> anyhow::Result<AtlasConfig> {
    let path = match path {
        Some(p) => PathBuf::from(p),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(p) => p,
            None => return Ok(AtlasConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg = parse_config(&content, &path)
        .with_context(|| format!("parse config {}", path.display()))?;
    cfg.layout.validate()?;
    Ok(cfg)
}

/// Parses YAML or JSON by file extension; anything but `.json` is YAML.
pub fn parse_config(content: &str, path: &Path) -> anyhow::Result<AtlasConfig> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml")
        .to_lowercase();
    let cfg = match ext.as_str() {
        "json" => serde_json::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(cfg)
}
