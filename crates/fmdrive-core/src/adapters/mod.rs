//! Adapters - the external programs the dispatcher drives.

mod fm;
mod process;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RunError;

pub use fm::{BinaryEnumerator, FmCommand};
pub use process::ProcessRunner;

/// A single external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub cwd: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(cwd: impl Into<PathBuf>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            cwd: cwd.into(),
            program: program.into(),
            args,
        }
    }

    /// The command line as it would be typed in a shell (unquoted).
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Kinds of runnable units the binary can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Gms,
    Tests,
}

impl UnitKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gms => "gms",
            Self::Tests => "tests",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs external programs.
///
/// `Ok` carries captured stdout; a non-zero exit is an error.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<String, RunError>;
}

/// Lists the runnable units linked into the binary.
#[async_trait]
pub trait Enumerator: Send + Sync {
    async fn enumerate(&self, kind: UnitKind) -> Result<Vec<String>, RunError>;

    /// Step name reported while listing `kind`.
    fn step_name(&self, kind: UnitKind) -> String {
        format!("list {}", kind)
    }
}

#[async_trait]
impl<R: Runner + ?Sized> Runner for std::sync::Arc<R> {
    async fn run(&self, invocation: &Invocation) -> Result<String, RunError> {
        (**self).run(invocation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_args() {
        let inv = Invocation::new(".", "out/fm", vec!["-i".into(), "resources".into()]);
        assert_eq!(inv.command_line(), "out/fm -i resources");
        assert_eq!(Invocation::new(".", "fm", vec![]).command_line(), "fm");
    }
}
