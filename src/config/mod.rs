mod environment;
mod loader;

pub use environment::{EnvironmentBuilder, EnvironmentContext, DEFAULT_TIMEOUT_SECS};
pub use loader::{load_config, BurstpitConfig, LoadedConfig, RunSettings, CONFIG_FILE};
