//! Script parsing - turns job lines into sources and flags.

mod alias;
mod job;

pub use alias::AliasTable;
pub use job::{parse_job, parse_script, Job};

/// Script run when no other script is configured.
pub const DEFAULT_SCRIPT: &str = "
b=cpu tests
b=cpu gms
b=cpu gms skvm=true

#b=cpu gms skvm=true gamut=p3
#b=cpu gms skvm=true ct=565
";
