//! Planner - shuffles a job's sources and packs them into batches.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::script::Job;
use crate::work::Work;

/// Sources per batch so `workers` batches cover `sources`, at least one.
pub fn batch_size(sources: usize, workers: usize) -> usize {
    sources.div_ceil(workers.max(1)).max(1)
}

/// Split a job into batches for `workers` concurrent workers.
///
/// Sources are shuffled first: cost per source is unknown and often
/// clustered by name, so a random order spreads expensive sources across
/// batches. An empty job plans nothing.
pub fn plan_batches<R>(job: Job, workers: usize, rng: &mut R) -> Vec<Work>
where
    R: Rng + ?Sized,
{
    let Job { mut sources, flags } = job;
    if sources.is_empty() {
        return Vec::new();
    }

    sources.shuffle(rng);

    let size = batch_size(sources.len(), workers);
    sources
        .chunks(size)
        .map(|chunk| Work::new(chunk.to_vec(), flags.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn job(sources: &[&str], flags: &[&str]) -> Job {
        Job {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            flags: flags.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn counts<'a>(names: impl IntoIterator<Item = &'a String>) -> HashMap<&'a str, usize> {
        let mut map = HashMap::new();
        for name in names {
            *map.entry(name.as_str()).or_insert(0) += 1;
        }
        map
    }

    #[test]
    fn test_batch_size_rounds_up_with_floor_of_one() {
        assert_eq!(batch_size(3, 2), 2);
        assert_eq!(batch_size(4, 2), 2);
        assert_eq!(batch_size(1, 8), 1);
        assert_eq!(batch_size(10, 3), 4);
        assert_eq!(batch_size(0, 4), 1);
        assert_eq!(batch_size(5, 0), 5);
    }

    #[test]
    fn test_empty_job_plans_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(plan_batches(job(&[], &["-b", "cpu"]), 4, &mut rng).is_empty());
    }

    #[test]
    fn test_three_sources_two_workers() {
        let mut rng = StdRng::seed_from_u64(1);
        let batches = plan_batches(job(&["gm1", "gm2", "gm3"], &["-b", "cpu"]), 2, &mut rng);

        let sizes: Vec<usize> = batches.iter().map(|b| b.sources.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert!(batches.iter().all(|b| b.flags == vec!["-b", "cpu"]));
    }

    #[test]
    fn test_fewer_sources_than_workers() {
        let mut rng = StdRng::seed_from_u64(3);
        let batches = plan_batches(job(&["a", "b"], &[]), 16, &mut rng);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.sources.len() == 1));
    }

    #[test]
    fn test_batches_cover_every_source_exactly() {
        let names: Vec<String> = (0..97).map(|i| format!("src{}", i % 90)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let batches = plan_batches(job(&refs, &["--skvm", "true"]), 6, &mut rng);

            assert!(batches.len() <= 6);
            let planned = counts(batches.iter().flat_map(|b| &b.sources));
            assert_eq!(planned, counts(&names));
        }
    }
}
