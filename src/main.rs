use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use burstpit::config::{load_config, EnvironmentBuilder};
use burstpit::engine::{Engine, RunPlan};
use burstpit::logging::{init_logging, LogOptions};
use burstpit::report::{log_summary, print_report, ProgressObserver};
use burstpit::request::{build_template, load_request_data, BuildContext, RequestData};
use clap::{ArgAction, Parser};
use reqwest::Client;

#[derive(Parser, Debug)]
#[command(
    name = "burstpit",
    version,
    about = "Fire one HTTP request many times and summarize the outcomes",
    disable_help_subcommand = true
)]
struct Cli {
    /// Request description to replay (.json)
    #[arg(value_name = "REQUEST")]
    request: PathBuf,

    /// Number of executions, overrides the description's frequency
    #[arg(short = 'n', long)]
    frequency: Option<usize>,

    /// Per-execution timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Maximum executions in flight
    #[arg(short = 'C', long)]
    concurrency: Option<usize>,

    /// Select a profile from burstpit.json
    #[arg(short = 'P', long)]
    profile: Option<String>,

    /// Directory or file containing burstpit.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override env file relative to config directory
    #[arg(short, long)]
    env: Option<PathBuf>,

    /// Override base directory used for resolving paths
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Append system.log and request.log to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_dir = cli
        .cwd
        .as_ref()
        .map(|p| resolve_path(Path::new(p)))
        .transpose()?
        .unwrap_or(std::env::current_dir()?);

    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());

    let cfg = load_config(&config_target).context("loading configuration")?;
    let config_dir = cfg.as_ref().map(|c| c.dir.clone()).unwrap_or_else(|| {
        if config_target.is_dir() {
            config_target.clone()
        } else {
            config_target
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| config_target.clone())
        }
    });

    let environment = EnvironmentBuilder::new(
        config_dir.clone(),
        cfg,
        cli.profile.clone(),
        cli.env.as_ref().map(|p| resolve_relative(&config_dir, p)),
    )
    .build()?;

    let _log_guards = init_logging(&LogOptions {
        verbosity: cli.verbose,
        log_dir: cli
            .log_dir
            .as_ref()
            .map(|p| resolve_relative(&base_dir, p))
            .or_else(|| environment.log_dir.clone()),
    })?;

    tracing::debug!(
        profile = ?environment.profile_name,
        env_files = ?environment.env_files,
        concurrency = environment.concurrency,
        "environment resolved"
    );

    let request_path = resolve_relative(&base_dir, &cli.request);
    let data = load_request_data(&request_path)
        .await?
        .expand(&environment.variables)
        .with_context(|| format!("expanding placeholders in {}", request_path.display()))?;

    let request_dir = request_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| base_dir.clone());
    let template = build_template(
        &data,
        &BuildContext {
            base_dir: &request_dir,
            default_headers: &environment.default_headers,
        },
    )
    .await
    .with_context(|| format!("building request from {}", request_path.display()))?;
    let template = Arc::new(template);

    let plan = RunPlan {
        repetitions: cli.frequency.unwrap_or(data.frequency),
        timeout: resolve_timeout(cli.timeout, &data, environment.timeout),
    };
    let engine = Engine::new(
        Client::new(),
        cli.concurrency.unwrap_or(environment.concurrency),
    )?;

    let observer = Arc::new(if cli.quiet || cli.json {
        ProgressObserver::hidden()
    } else {
        ProgressObserver::new(plan.repetitions)
    });

    let started = Instant::now();
    let report = engine
        .run_observed(Arc::clone(&template), plan, observer.clone())
        .await?;
    let elapsed = started.elapsed();
    observer.finish();

    log_summary(&template, &report);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing report")?
        );
    } else {
        print_report(&template, &report, elapsed);
    }

    Ok(())
}

/// Flag, then description, then configuration. Zero counts as unset.
fn resolve_timeout(flag: Option<u64>, data: &RequestData, fallback: Duration) -> Duration {
    flag.or(data.timeout)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
