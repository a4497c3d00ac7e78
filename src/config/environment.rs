use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Result};

use crate::engine::DEFAULT_CONCURRENCY;
use crate::env::{load_env_file, EnvMap};

use super::loader::{BurstpitConfig, LoadedConfig, RunSettings};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs from configuration, after profile and env-file resolution.
#[derive(Debug, Clone)]
pub struct EnvironmentContext {
    pub variables: EnvMap,
    pub env_files: Vec<PathBuf>,
    pub profile_name: Option<String>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub log_dir: Option<PathBuf>,
    pub default_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    config_dir: PathBuf,
    config: Option<LoadedConfig>,
    requested_profile: Option<String>,
    explicit_env: Option<PathBuf>,
}

impl EnvironmentBuilder {
    pub fn new(
        config_dir: PathBuf,
        config: Option<LoadedConfig>,
        requested_profile: Option<String>,
        explicit_env: Option<PathBuf>,
    ) -> Self {
        Self {
            config_dir,
            config,
            requested_profile,
            explicit_env,
        }
    }

    pub fn build(&self) -> Result<EnvironmentContext> {
        let mut context = EnvironmentContext {
            variables: EnvMap::new(),
            env_files: Vec::new(),
            profile_name: None,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_dir: None,
            default_headers: BTreeMap::new(),
        };

        let mut env_path = None;
        if let Some(cfg) = &self.config {
            let top = &cfg.config.settings;
            apply_settings(&mut context, top, &self.config_dir, &mut env_path);

            if let Some((name, profile)) =
                resolve_profile(&cfg.config, self.requested_profile.as_deref())?
            {
                context.profile_name = Some(name.to_string());
                apply_settings(&mut context, profile, &self.config_dir, &mut env_path);
            }
        } else if let Some(name) = &self.requested_profile {
            bail!("Unknown profile: {name} (no configuration found)");
        }

        if let Some(explicit) = &self.explicit_env {
            env_path = Some(explicit.clone());
        }
        if let Some(path) = env_path {
            let loaded = load_env_file(&path, &mut context.variables)?;
            context.env_files.push(loaded);
        }

        Ok(context)
    }
}

fn apply_settings(
    context: &mut EnvironmentContext,
    settings: &RunSettings,
    config_dir: &Path,
    env_path: &mut Option<PathBuf>,
) {
    if let Some(concurrency) = settings.concurrency {
        context.concurrency = concurrency;
    }
    if let Some(secs) = settings.timeout_secs {
        context.timeout = Duration::from_secs(secs);
    }
    if let Some(env) = &settings.env {
        *env_path = Some(resolve_relative(config_dir, env));
    }
    if let Some(dir) = &settings.log_dir {
        context.log_dir = Some(resolve_relative(config_dir, dir));
    }
    context.variables.extend(settings.variables.clone());
    context
        .default_headers
        .extend(settings.default_headers.clone());
}

fn resolve_profile<'a>(
    config: &'a BurstpitConfig,
    requested: Option<&'a str>,
) -> Result<Option<(&'a str, &'a RunSettings)>> {
    if let Some(name) = requested {
        return match config.profiles.get(name) {
            Some(profile) => Ok(Some((name, profile))),
            None => bail!("Unknown profile: {name}"),
        };
    }

    Ok(config
        .default_profile
        .as_deref()
        .and_then(|name| config.profiles.get(name).map(|profile| (name, profile))))
}

fn resolve_relative(base: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use anyhow::Result;
    use tempfile::tempdir;

    fn write_file(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_apply_without_config() -> Result<()> {
        let temp = tempdir()?;
        let context = EnvironmentBuilder::new(temp.path().to_path_buf(), None, None, None).build()?;

        assert_eq!(context.concurrency, 200);
        assert_eq!(context.timeout, Duration::from_secs(30));
        assert!(context.variables.is_empty());
        assert!(context.log_dir.is_none());
        Ok(())
    }

    #[test]
    fn profile_overrides_top_level_and_loads_env() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        write_file(
            &dir.join("burstpit.json"),
            r#"{
  "concurrency": 100,
  "timeoutSecs": 12,
  "logDir": "logs",
  "variables": {"HOST": "localhost", "MODE": "top"},
  "defaultHeaders": {"accept": "*/*"},
  "profiles": {
    "load": {
      "concurrency": 8,
      "env": "env/load.env",
      "variables": {"MODE": "load"},
      "defaultHeaders": {"x-profile": "load"}
    }
  }
}"#,
        );
        write_file(&dir.join("env/load.env"), "TOKEN=secret\nHOST=load.local\n");

        let loaded = load_config(dir)?;
        let context = EnvironmentBuilder::new(
            dir.to_path_buf(),
            loaded,
            Some("load".to_string()),
            None,
        )
        .build()?;

        assert_eq!(context.profile_name.as_deref(), Some("load"));
        assert_eq!(context.concurrency, 8);
        assert_eq!(context.timeout, Duration::from_secs(12));
        assert_eq!(context.log_dir, Some(dir.join("logs")));
        assert_eq!(context.variables["MODE"], "load");
        assert_eq!(context.variables["HOST"], "load.local");
        assert_eq!(context.variables["TOKEN"], "secret");
        assert_eq!(context.default_headers.len(), 2);
        assert_eq!(context.env_files, vec![dir.join("env/load.env")]);
        Ok(())
    }

    #[test]
    fn explicit_env_wins_and_default_profile_is_used() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        write_file(
            &dir.join("burstpit.json"),
            r#"{"defaultProfile": "dev", "profiles": {"dev": {"env": "dev.env", "timeoutSecs": 3}}}"#,
        );
        write_file(&dir.join("dev.env"), "WHICH=dev\n");
        write_file(&dir.join("other.env"), "WHICH=other\n");

        let context = EnvironmentBuilder::new(
            dir.to_path_buf(),
            load_config(dir)?,
            None,
            Some(dir.join("other.env")),
        )
        .build()?;

        assert_eq!(context.profile_name.as_deref(), Some("dev"));
        assert_eq!(context.timeout, Duration::from_secs(3));
        assert_eq!(context.variables["WHICH"], "other");
        Ok(())
    }

    #[test]
    fn unknown_profile_is_an_error() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        write_file(&dir.join("burstpit.json"), r#"{"profiles": {}}"#);

        let err = EnvironmentBuilder::new(
            dir.to_path_buf(),
            load_config(dir)?,
            Some("missing".to_string()),
            None,
        )
        .build()
        .unwrap_err();
        assert!(err.to_string().contains("Unknown profile: missing"));

        let err = EnvironmentBuilder::new(dir.to_path_buf(), None, Some("x".to_string()), None)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Unknown profile: x"));
        Ok(())
    }
}
