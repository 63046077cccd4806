//! Driver configuration loading and management.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::script::DEFAULT_SCRIPT;
use crate::work::SplitStrategy;

/// Driver configuration, loaded from .fmdrive/config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Resources directory passed to the binary
    #[serde(default = "default_resources")]
    pub resources: PathBuf,

    /// Working directory for every invocation
    #[serde(default = "default_cwd")]
    pub cwd: PathBuf,

    /// Number of concurrent workers (defaults to available parallelism)
    pub workers: Option<usize>,

    /// Inline job script
    pub script: Option<String>,

    /// Job script file ("-" reads stdin)
    pub script_path: Option<PathBuf>,

    /// How failed batches are broken up
    pub split: SplitStrategy,

    /// Flag spellings understood by the binary
    pub flags: BinaryFlags,
}

/// Flags the binary uses for listing, resources and the source list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryFlags {
    pub list_gms: String,
    pub list_tests: String,
    pub resources: String,
    pub sources: String,
}

impl Default for BinaryFlags {
    fn default() -> Self {
        Self {
            list_gms: "--listGMs".to_string(),
            list_tests: "--listTests".to_string(),
            resources: "-i".to_string(),
            sources: "-s".to_string(),
        }
    }
}

fn default_resources() -> PathBuf {
    PathBuf::from("resources")
}
fn default_cwd() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            resources: default_resources(),
            cwd: default_cwd(),
            workers: None,
            script: None,
            script_path: None,
            split: SplitStrategy::default(),
            flags: BinaryFlags::default(),
        }
    }
}

impl DriverConfig {
    /// Load configuration from a YAML (or `.json`) file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        };
        Ok(config)
    }

    /// Load from project root (looks for .fmdrive/config.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".fmdrive/config.yaml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Worker count, never less than one
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// The job script text: file, then inline, then the built-in default
    pub fn resolve_script(&self) -> Result<String> {
        match &self.script_path {
            Some(path) if path.as_os_str() == "-" => {
                let mut script = String::new();
                std::io::stdin()
                    .read_to_string(&mut script)
                    .context("Failed to read script from stdin")?;
                Ok(script)
            }
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read script from {}", path.display())),
            None => Ok(self
                .script
                .clone()
                .unwrap_or_else(|| DEFAULT_SCRIPT.to_string())),
        }
    }
}
