//! fmdrive - runs an fm binary over a job script.
//!
//! Each script line names sources (or the `gms`/`tests` aliases) and
//! `name=value` flags. Sources are spread over one batch per worker; a
//! failing batch is split and re-run until each failure is pinned to a
//! single source.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use fmdrive_core::{
    DispatchReport, Dispatcher, DriverConfig, ProcessRunner, SplitStrategy, StepReporter,
    TracingReporter,
};

#[derive(Parser)]
#[command(name = "fmdrive")]
#[command(about = "Batched, self-splitting test dispatcher for fm", version)]
struct Cli {
    /// Path to the fm binary
    binary: Option<PathBuf>,

    /// Config file (defaults to .fmdrive/config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resources directory, passed to fm -i
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Job script file, or - for stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// How failed batches are split: singletons or bisect
    #[arg(long, value_parser = parse_split)]
    split: Option<SplitStrategy>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_split(name: &str) -> Result<SplitStrategy, String> {
    SplitStrategy::from_name(name)
        .ok_or_else(|| format!("unknown split strategy '{}' (expected singletons or bisect)", name))
}

impl Cli {
    /// Config file values, overridden by anything given on the command line.
    fn driver_config(&self) -> Result<DriverConfig> {
        let mut config = match &self.config {
            Some(path) => DriverConfig::load(path)?,
            None => DriverConfig::load_from_project(&std::env::current_dir()?)?,
        };

        if let Some(resources) = &self.resources {
            config.resources = resources.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(script) = &self.script {
            config.script_path = Some(script.clone());
        }
        if let Some(split) = self.split {
            config.split = split;
        }
        Ok(config)
    }

    /// The binary is checked before the script is read, so a missing
    /// binary is reported even when the script would block on stdin.
    async fn run(&self) -> Result<DispatchReport> {
        let config = self.driver_config()?;
        let reporter: Arc<dyn StepReporter> = Arc::new(TracingReporter);

        let binary = self.binary.as_ref().map(|p| p.display().to_string());
        let dispatcher = Dispatcher::new(config.clone(), binary, ProcessRunner::new(), reporter)?;
        let script = config.resolve_script()?;

        tracing::info!(
            binary = %dispatcher.binary(),
            workers = config.worker_count(),
            split = config.split.name(),
            "Starting dispatch"
        );

        Ok(dispatcher.run(&script).await?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let report = cli.run().await?;
    tracing::info!(summary = %report.summary(), "All sources passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use fmdrive_core::DriverError;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "fmdrive",
            "--workers",
            "3",
            "--resources",
            "/skia/resources",
            "--split",
            "bisect",
            "out/fm",
        ]);
        assert_eq!(cli.binary, Some(PathBuf::from("out/fm")));

        let config = cli.driver_config().unwrap();
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.resources, PathBuf::from("/skia/resources"));
        assert_eq!(config.split, SplitStrategy::Bisect);
    }

    #[test]
    fn unknown_split_is_rejected() {
        assert!(Cli::try_parse_from(["fmdrive", "--split", "binary", "fm"]).is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_reported_before_reading_the_script() {
        let cli = Cli::parse_from(["fmdrive", "--script", "/nonexistent/fmdrive/script.txt"]);

        let err = cli.run().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DriverError>(),
            Some(DriverError::MissingBinary)
        ));
    }
}
