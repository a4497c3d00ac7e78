use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter, Targets},
    fmt,
    prelude::*,
    EnvFilter,
};

use crate::report::AUDIT_TARGET;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// 0 keeps stderr at warn with the audit target off and writes info to `system.log`;
    /// 1 raises both to debug, 2+ to trace. `RUST_LOG` overrides the stderr filter.
    pub verbosity: u8,
    /// When set, `system.log` and `request.log` are appended to in this directory.
    pub log_dir: Option<PathBuf>,
}

/// Keeps the background file writers alive; drop it last.
#[must_use]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

pub fn init_logging(options: &LogOptions) -> Result<LogGuards> {
    let level = match options.verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if options.verbosity == 0 {
            EnvFilter::new(format!("warn,{AUDIT_TARGET}=off"))
        } else {
            EnvFilter::new(level.as_str().to_ascii_lowercase())
        }
    });
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let mut guards = Vec::new();
    let (system_layer, request_layer) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;

            let (system_writer, system_guard) = file_writer(dir, "system.log");
            let (request_writer, request_guard) = file_writer(dir, "request.log");
            guards.push(system_guard);
            guards.push(request_guard);

            let system = fmt::layer()
                .with_ansi(false)
                .with_writer(system_writer)
                .with_filter(LevelFilter::from_level(level))
                .with_filter(filter_fn(|meta| meta.target() != AUDIT_TARGET));
            let request = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(request_writer)
                .with_filter(Targets::new().with_target(AUDIT_TARGET, Level::INFO));
            (Some(system), Some(request))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(system_layer)
        .with(request_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(LogGuards { _guards: guards })
}

fn file_writer(
    dir: &Path,
    name: &str,
) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::never(dir, name);
    tracing_appender::non_blocking(appender)
}
