use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::env::EnvMap;

/// Merges a dotenv file into `env`, later keys replacing earlier ones.
pub fn load_env_file(path: &Path, env: &mut EnvMap) -> Result<PathBuf> {
    let entries =
        dotenvy::from_path_iter(path).with_context(|| format!("opening env file {}", path.display()))?;

    let mut loaded = 0usize;
    for item in entries {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
        loaded += 1;
    }
    tracing::debug!(path = %path.display(), loaded, "loaded env file");

    Ok(path.to_path_buf())
}
