use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::domain::{BatchSummary, Prospect, ProspectRow};
use super::evaluation::QualificationEvaluator;
use super::regions::RegionIndex;
use super::repository::{ProspectRepository, RepositoryError, UpsertReport};
use super::rules::UserRules;

/// Evaluated batch, before or after persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub prospects: Vec<Prospect>,
    pub summary: BatchSummary,
}

/// Result of a persisted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub prospects: Vec<Prospect>,
    pub summary: BatchSummary,
    pub persisted: UpsertReport,
}

/// Drives ingested rows through the evaluator and hands the whole batch to the repository.
pub struct BatchQualifier<R> {
    evaluator: QualificationEvaluator,
    repository: Arc<R>,
}

impl<R> BatchQualifier<R>
where
    R: ProspectRepository + 'static,
{
    pub fn new(index: Arc<RegionIndex>, repository: Arc<R>) -> Self {
        Self {
            evaluator: QualificationEvaluator::new(index),
            repository,
        }
    }

    pub fn evaluator(&self) -> &QualificationEvaluator {
        &self.evaluator
    }

    /// Evaluates every row without touching the repository.
    ///
    /// Users missing from `rules` are evaluated against the empty rule, so their prospects
    /// come back unqualified but are still part of the batch.
    pub fn evaluate_rows(&self, rows: Vec<ProspectRow>, rules: &UserRules) -> BatchOutcome {
        let mut summary = BatchSummary::default();
        let prospects = rows
            .into_iter()
            .map(|row| {
                let mut prospect = Prospect::from_row(row);
                let lookup = rules.lookup(prospect.user_id.as_ref());
                let decision = self.evaluator.evaluate(&prospect.location, lookup.rule());

                debug!(
                    user_id = ?prospect.user_id,
                    prospect_id = ?prospect.prospect_id,
                    rule_found = lookup.is_found(),
                    verdict = %decision.summary(),
                    "prospect evaluated"
                );

                prospect.qualified = decision.is_qualified();
                summary.record(prospect.qualified);
                prospect
            })
            .collect();

        BatchOutcome { prospects, summary }
    }

    /// Evaluates `rows` and persists the full batch with exactly one repository call, even
    /// when the batch is empty.
    pub fn qualify(
        &self,
        rows: Vec<ProspectRow>,
        rules: &UserRules,
    ) -> Result<BatchReport, RepositoryError> {
        let BatchOutcome { prospects, summary } = self.evaluate_rows(rows, rules);
        let persisted = self.repository.upsert_batch(&prospects)?;

        info!(
            total = summary.total,
            qualified = summary.qualified,
            unqualified = summary.unqualified,
            inserted = persisted.inserted,
            updated = persisted.updated,
            skipped = persisted.skipped,
            "prospect batch qualified"
        );

        Ok(BatchReport {
            prospects,
            summary,
            persisted,
        })
    }
}
