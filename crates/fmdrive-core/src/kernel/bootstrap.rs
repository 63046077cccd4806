//! Bootstrap - resolves script aliases by asking the binary what it links.

use crate::adapters::{Enumerator, UnitKind};
use crate::error::DriverError;
use crate::observability::{StepOutcome, StepReporter};
use crate::script::AliasTable;

/// List GMs, then tests. Either failure aborts the run.
pub async fn resolve_aliases<E>(
    enumerator: &E,
    reporter: &dyn StepReporter,
) -> Result<AliasTable, DriverError>
where
    E: Enumerator + ?Sized,
{
    let gms = enumerate(enumerator, reporter, UnitKind::Gms).await?;
    let tests = enumerate(enumerator, reporter, UnitKind::Tests).await?;

    let aliases = AliasTable::new(gms, tests);
    tracing::info!(
        gms = aliases.gms().len(),
        tests = aliases.tests().len(),
        "Resolved aliases"
    );
    Ok(aliases)
}

async fn enumerate<E>(
    enumerator: &E,
    reporter: &dyn StepReporter,
    kind: UnitKind,
) -> Result<Vec<String>, DriverError>
where
    E: Enumerator + ?Sized,
{
    let step = reporter.start(&enumerator.step_name(kind));

    match enumerator.enumerate(kind).await {
        Ok(names) => {
            reporter.finish(step, &StepOutcome::Success);
            Ok(names)
        }
        Err(source) => {
            reporter.finish(step, &StepOutcome::Failure(source.to_string()));
            Err(DriverError::Enumeration { kind, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::RunError;
    use crate::observability::RecordingReporter;

    struct Listing {
        gms: Result<Vec<String>, ()>,
        tests: Result<Vec<String>, ()>,
    }

    #[async_trait]
    impl Enumerator for Listing {
        async fn enumerate(&self, kind: UnitKind) -> Result<Vec<String>, RunError> {
            let result = match kind {
                UnitKind::Gms => &self.gms,
                UnitKind::Tests => &self.tests,
            };
            result.clone().map_err(|_| RunError::Exit {
                program: "fm".into(),
                code: Some(1),
                stderr: "no resources".into(),
            })
        }
    }

    #[tokio::test]
    async fn builds_table_from_both_listings() {
        let listing = Listing {
            gms: Ok(vec!["gm1".into(), "gm2".into()]),
            tests: Ok(vec!["t1".into()]),
        };
        let reporter = RecordingReporter::new();

        let table = resolve_aliases(&listing, &reporter).await.unwrap();
        assert_eq!(table.gms(), ["gm1", "gm2"]);
        assert_eq!(table.tests(), ["t1"]);

        let steps = reporter.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].name, "list gms");
        assert_eq!(steps[1].name, "list tests");
        assert!(steps.iter().all(|s| s.outcome == Some(StepOutcome::Success)));
    }

    #[tokio::test]
    async fn failed_listing_is_fatal() {
        let listing = Listing {
            gms: Ok(vec!["gm1".into()]),
            tests: Err(()),
        };
        let reporter = RecordingReporter::new();

        let err = resolve_aliases(&listing, &reporter).await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Enumeration {
                kind: UnitKind::Tests,
                ..
            }
        ));
    }
}
