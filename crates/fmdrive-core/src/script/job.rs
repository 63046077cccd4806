//! Job parsing.
//!
//! Each script line is split on whitespace and read token by token:
//!
//! - `#...` ends the line; it and every later token are dropped
//! - `gm`/`gms` and `test`/`tests` expand to the enumerated units
//! - `name=value` becomes `-name value` (one-letter name) or `--name value`
//! - anything else is a source name

use super::alias::AliasTable;

/// One parsed script line, aliases already expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Job {
    pub sources: Vec<String>,
    pub flags: Vec<String>,
}

impl Job {
    /// Jobs without sources plan no work.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Parse the tokens of a single job line.
pub fn parse_job<'a, I>(tokens: I, aliases: &AliasTable) -> Job
where
    I: IntoIterator<Item = &'a str>,
{
    let mut job = Job::default();

    for token in tokens {
        if token.starts_with('#') {
            break;
        }

        if let Some(expansion) = aliases.expand(token) {
            job.sources.extend_from_slice(expansion);
            continue;
        }

        if let Some((name, value)) = flag_assignment(token) {
            let dashes = if name.len() > 1 { "--" } else { "-" };
            job.flags.push(format!("{}{}", dashes, name));
            job.flags.push(value.to_string());
            continue;
        }

        job.sources.push(token.to_string());
    }

    job
}

/// Parse a whole script, one job per line, in line order.
///
/// Blank and comment-only lines still produce (empty) jobs; the planner
/// skips them.
pub fn parse_script(script: &str, aliases: &AliasTable) -> Vec<Job> {
    script
        .lines()
        .map(|line| parse_job(line.split_whitespace(), aliases))
        .collect()
}

/// `name=value` with exactly one `=`.
fn flag_assignment(token: &str) -> Option<(&str, &str)> {
    let (name, value) = token.split_once('=')?;
    if value.contains('=') {
        return None;
    }
    Some((name, value))
}
