use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "burstpit.json";

/// Settings that may appear at the top level or inside a profile.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RunSettings {
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub env: Option<String>,
    pub log_dir: Option<String>,
    pub variables: HashMap<String, String>,
    pub default_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct BurstpitConfig {
    #[serde(flatten)]
    pub settings: RunSettings,
    pub profiles: HashMap<String, RunSettings>,
    pub default_profile: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: BurstpitConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

/// Loads `burstpit.json` from a directory, or the given file. Absent config is not an error.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved, dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;
    let config: BurstpitConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;

    Ok(Some(LoadedConfig {
        config,
        path: file_path,
        dir,
    }))
}
