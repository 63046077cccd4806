//! Work model - the unit of execution handed to workers.

use serde::{Deserialize, Serialize};

/// One batch: a set of sources run by a single invocation with shared flags.
///
/// A batch with more than one source is splittable; a singleton batch is
/// terminal and its failure is final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    /// Source names (tests or GMs) passed after the source separator.
    pub sources: Vec<String>,
    /// Flags passed verbatim before the source separator.
    pub flags: Vec<String>,
}

impl Work {
    pub fn new(sources: Vec<String>, flags: Vec<String>) -> Self {
        Self { sources, flags }
    }

    /// Whether a failure of this batch can be narrowed down further.
    pub fn is_splittable(&self) -> bool {
        self.sources.len() > 1
    }

    /// Derive the retry batches for a failed batch.
    ///
    /// Returns nothing for a terminal batch. The parent is left untouched;
    /// every derived batch carries a copy of the parent's flags.
    pub fn split(&self, strategy: SplitStrategy) -> Vec<Work> {
        if !self.is_splittable() {
            return Vec::new();
        }

        match strategy {
            SplitStrategy::Singletons => self
                .sources
                .iter()
                .map(|source| Work::new(vec![source.clone()], self.flags.clone()))
                .collect(),
            SplitStrategy::Bisect => {
                let (left, right) = self.sources.split_at(self.sources.len() / 2);
                vec![
                    Work::new(left.to_vec(), self.flags.clone()),
                    Work::new(right.to_vec(), self.flags.clone()),
                ]
            }
        }
    }
}

/// How a failed multi-source batch is broken up for retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Re-run every source on its own.
    #[default]
    Singletons,
    /// Re-run each half, splitting again on failure.
    Bisect,
}

impl SplitStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "singletons" | "singleton" => Some(Self::Singletons),
            "bisect" => Some(Self::Bisect),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Singletons => "singletons",
            Self::Bisect => "bisect",
        }
    }
}
