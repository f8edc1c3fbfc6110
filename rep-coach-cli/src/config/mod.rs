use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use rep_coach::CoachConfig;

/// Environment variable that points at a config file
pub const CONFIG_ENV: &str = "REP_COACH_CONFIG";

/// Get config directory path (~/.rep-coach/)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".rep-coach"))
}

/// Get default config file path (~/.rep-coach/config.toml)
pub fn default_config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Pick the config file: explicit path (flag or env), else the default location
pub fn resolve_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_file(),
    }
}

/// Load configuration, falling back to defaults when the file is absent
pub fn load(explicit: Option<&Path>) -> Result<CoachConfig> {
    let path = resolve_config_file(explicit)?;
    CoachConfig::load(&path)
        .with_context(|| format!("Failed to load config file {}", path.display()))
}
