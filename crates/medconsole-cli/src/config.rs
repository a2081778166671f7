use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use medconsole_client::{DEFAULT_BASE_URL, FileStorage, KeyValueStorage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::OutputFormat;

/// Durable session key holding the server the session belongs to.
pub const SERVER_KEY: &str = "server";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".medconsole");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

fn load_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn save_to(path: &Path, all: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_from(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let path = config_path()?;
    let mut all = load_from(&path)?;
    all.insert(profile.to_string(), config.clone());
    save_to(&path, &all)
}

/// Applies `key = value` to a profile.
pub fn set_key(config: &mut ProfileConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "server" => config.server = Some(value.trim_end_matches('/').to_string()),
        "format" => {
            value
                .parse::<OutputFormat>()
                .map_err(|e| anyhow::anyhow!("Invalid format '{value}': {e}"))?;
            config.format = Some(value.to_ascii_lowercase());
        }
        other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, format"),
    }
    Ok(())
}

pub fn resolve_format(cli_format: Option<OutputFormat>, profile: &ProfileConfig) -> OutputFormat {
    cli_format
        .or_else(|| profile.format.as_deref().and_then(|f| f.parse().ok()))
        .unwrap_or_default()
}

pub fn resolve_server(cli_server: &Option<String>, profile: &str) -> Result<String> {
    // 1. --server flag / MEDCONSOLE_URL env
    if let Some(s) = cli_server {
        return Ok(s.clone());
    }
    // 2. config.toml profile
    let cfg = load_profile(profile)?;
    if let Some(s) = cfg.server {
        return Ok(s);
    }
    // 3. Server of the stored session
    if let Ok(storage) = FileStorage::durable(profile)
        && let Ok(Some(server)) = storage.get(SERVER_KEY)
    {
        return Ok(server);
    }
    debug!(server = DEFAULT_BASE_URL, "No server configured; using default");
    Ok(DEFAULT_BASE_URL.to_string())
}
