//! fm adapter - builds fm command lines and lists its linked units.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{Enumerator, Invocation, Runner, UnitKind};
use crate::config::{BinaryFlags, DriverConfig};
use crate::error::RunError;
use crate::work::Work;

/// Everything needed to build an fm command line.
#[derive(Debug, Clone)]
pub struct FmCommand {
    binary: String,
    cwd: PathBuf,
    resources: String,
    flags: BinaryFlags,
}

impl FmCommand {
    pub fn new(binary: impl Into<String>, config: &DriverConfig) -> Self {
        Self {
            binary: binary.into(),
            cwd: config.cwd.clone(),
            resources: config.resources.display().to_string(),
            flags: config.flags.clone(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// `fm --listGMs -i <resources>` (or `--listTests`).
    pub fn list(&self, kind: UnitKind) -> Invocation {
        let list_flag = match kind {
            UnitKind::Gms => &self.flags.list_gms,
            UnitKind::Tests => &self.flags.list_tests,
        };
        let args = vec![
            list_flag.clone(),
            self.flags.resources.clone(),
            self.resources.clone(),
        ];
        Invocation::new(self.cwd.clone(), self.binary.clone(), args)
    }

    /// `fm -i <resources> <flags...> -s <sources...>`.
    pub fn batch(&self, work: &Work) -> Invocation {
        let mut args = Vec::with_capacity(work.flags.len() + work.sources.len() + 3);
        args.push(self.flags.resources.clone());
        args.push(self.resources.clone());
        args.extend(work.flags.iter().cloned());
        args.push(self.flags.sources.clone());
        args.extend(work.sources.iter().cloned());
        Invocation::new(self.cwd.clone(), self.binary.clone(), args)
    }
}

/// Lists GMs and tests by running the binary with its list flags.
pub struct BinaryEnumerator<R> {
    runner: R,
    command: FmCommand,
}

impl<R: Runner> BinaryEnumerator<R> {
    pub fn new(runner: R, command: FmCommand) -> Self {
        Self { runner, command }
    }
}

#[async_trait]
impl<R: Runner> Enumerator for BinaryEnumerator<R> {
    async fn enumerate(&self, kind: UnitKind) -> Result<Vec<String>, RunError> {
        let stdout = self.runner.run(&self.command.list(kind)).await?;
        Ok(stdout.lines().map(str::to_owned).collect())
    }

    fn step_name(&self, kind: UnitKind) -> String {
        self.command.list(kind).command_line()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Canned {
        stdout: String,
        seen: Mutex<Vec<Invocation>>,
    }

    #[async_trait]
    impl Runner for Canned {
        async fn run(&self, invocation: &Invocation) -> Result<String, RunError> {
            self.seen.lock().unwrap().push(invocation.clone());
            Ok(self.stdout.clone())
        }
    }

    fn command() -> FmCommand {
        FmCommand::new("out/fm", &DriverConfig::default())
    }

    #[test]
    fn batch_places_flags_before_separator() {
        let work = Work::new(
            vec!["gm1".into(), "gm2".into()],
            vec!["-b".into(), "cpu".into()],
        );
        let inv = command().batch(&work);

        assert_eq!(inv.program, "out/fm");
        assert_eq!(
            inv.args,
            vec!["-i", "resources", "-b", "cpu", "-s", "gm1", "gm2"]
        );
    }

    #[test]
    fn list_uses_kind_specific_flag() {
        let cmd = command();
        assert_eq!(cmd.list(UnitKind::Gms).args, vec!["--listGMs", "-i", "resources"]);
        assert_eq!(cmd.list(UnitKind::Tests).args, vec!["--listTests", "-i", "resources"]);
    }

    #[tokio::test]
    async fn enumerate_keeps_lines_in_order_with_duplicates() {
        let runner = Canned {
            stdout: "b\r\na\n\nb\n".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let enumerator = BinaryEnumerator::new(runner, command());

        let names = enumerator.enumerate(UnitKind::Tests).await.unwrap();
        assert_eq!(names, vec!["b", "a", "", "b"]);

        let seen = enumerator.runner.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].args[0], "--listTests");
    }

    #[test]
    fn listing_steps_are_named_by_command_line() {
        let enumerator = BinaryEnumerator::new(
            Canned {
                stdout: String::new(),
                seen: Mutex::new(Vec::new()),
            },
            command(),
        );
        assert_eq!(
            enumerator.step_name(UnitKind::Gms),
            "out/fm --listGMs -i resources"
        );
    }
}
