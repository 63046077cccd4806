//! Process runner - spawns real child processes.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Invocation, Runner};
use crate::error::RunError;

/// Runs invocations as child processes, capturing their output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<String, RunError> {
        tracing::debug!(
            cwd = %invocation.cwd.display(),
            command = %invocation.command_line(),
            "Spawning process"
        );

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RunError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::Exit {
                program: invocation.program.clone(),
                code: output.status.code(),
                stderr: stderr.trim_end().to_string(),
            });
        }

        Ok(stdout.into_owned())
    }
}
