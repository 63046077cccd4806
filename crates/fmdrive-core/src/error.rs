//! Error types shared across the dispatcher.

use thiserror::Error;

use crate::adapters::UnitKind;

/// A failed invocation of an external program.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Errors that end a dispatch run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Please pass an fm binary.")]
    MissingBinary,

    #[error("enumerating {kind} failed: {source}")]
    Enumeration {
        kind: UnitKind,
        #[source]
        source: RunError,
    },

    #[error("{count} runs of {binary} failed after retries.")]
    Failures { count: usize, binary: String },

    #[error("worker stopped unexpectedly: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_message_names_count_and_binary() {
        let err = DriverError::Failures {
            count: 3,
            binary: "out/fm".to_string(),
        };
        assert_eq!(err.to_string(), "3 runs of out/fm failed after retries.");
    }

    #[test]
    fn exit_error_distinguishes_signals() {
        let err = RunError::Exit {
            program: "fm".to_string(),
            code: None,
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "fm exited with a signal: boom");

        let err = RunError::Exit {
            program: "fm".to_string(),
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "fm exited with status 2: ");
    }
}
