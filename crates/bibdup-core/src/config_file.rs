use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::DedupError;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub matching: Option<MatchingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingSection {
    pub recover_entries: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingSection {
    /// Rule names: `"doi"`, `"title_year"`.
    pub disabled_rules: Option<Vec<String>>,
    pub strip_doi_url: Option<bool>,
}

/// Platform config directory path: `<config_dir>/bibdup/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bibdup").join("config.toml"))
}

/// Load config by cascading CWD `.bibdup.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".bibdup.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    if !path.exists() {
        return None;
    }
    match try_load_from_path(path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

/// Load a config from a specific path, reporting read and parse failures.
pub fn try_load_from_path(path: &Path) -> Result<ConfigFile, DedupError> {
    let config_error = |message: String| DedupError::Config {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    toml::from_str(&content).map_err(|e| config_error(e.to_string()))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        parsing: Some(ParsingSection {
            recover_entries: overlay
                .parsing
                .as_ref()
                .and_then(|p| p.recover_entries)
                .or_else(|| base.parsing.as_ref().and_then(|p| p.recover_entries)),
        }),
        matching: Some(MatchingSection {
            disabled_rules: overlay
                .matching
                .as_ref()
                .and_then(|m| m.disabled_rules.clone())
                .or_else(|| base.matching.as_ref().and_then(|m| m.disabled_rules.clone())),
            strip_doi_url: overlay
                .matching
                .as_ref()
                .and_then(|m| m.strip_doi_url)
                .or_else(|| base.matching.as_ref().and_then(|m| m.strip_doi_url)),
        }),
    }
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, DedupError> {
    let path = config_path().ok_or_else(|| DedupError::Config {
        path: PathBuf::from("bibdup/config.toml"),
        message: "could not determine config directory".to_string(),
    })?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Write the config as pretty TOML, creating parent directories.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), DedupError> {
    let config_error = |message: String| DedupError::Config {
        path: path.to_path_buf(),
        message,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| config_error(e.to_string()))?;
    }
    let content = toml::to_string_pretty(config).map_err(|e| config_error(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| config_error(e.to_string()))
}
