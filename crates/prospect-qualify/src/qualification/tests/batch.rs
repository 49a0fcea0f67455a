use super::common::*;
use std::sync::Arc;

use crate::qualification::batch::BatchQualifier;
use crate::qualification::domain::{BatchSummary, ProspectRow};
use crate::qualification::repository::{ProspectRepository, RepositoryError};
use crate::qualification::rules::UserRules;

fn qualifier() -> (BatchQualifier<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    (
        BatchQualifier::new(region_index(), repository.clone()),
        repository,
    )
}

fn sample_rows() -> Vec<ProspectRow> {
    vec![
        csv_row("us_california_with_ny_exclusion", "prospect1", "US", "CA"),
        csv_row("us_california_with_ny_exclusion", "prospect2", "US", "NY"),
        csv_row("us_california_with_ny_exclusion", "prospect3", "CA", ""),
        csv_row("europe_only_with_africa_exclusion", "prospect4", "UK", ""),
        csv_row("europe_only_with_africa_exclusion", "prospect5", "NG", ""),
        csv_row("empty_preferences", "prospect6", "US", "TX"),
        csv_row("unknown_user", "prospect7", "US", "CA"),
    ]
}

#[test]
fn qualify_evaluates_rows_and_persists_once() {
    let (qualifier, repository) = qualifier();

    let report = qualifier
        .qualify(sample_rows(), &user_rules())
        .expect("batch runs");

    assert_eq!(
        report.summary,
        BatchSummary {
            total: 7,
            qualified: 3,
            unqualified: 4,
        }
    );
    assert_eq!(repository.calls(), vec![7]);
    assert_eq!(report.persisted.inserted, 7);

    let outcomes: Vec<(&str, bool)> = report
        .prospects
        .iter()
        .map(|prospect| {
            (
                prospect
                    .prospect_id
                    .as_ref()
                    .map(|id| id.0.as_str())
                    .unwrap_or_default(),
                prospect.qualified,
            )
        })
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("prospect1", true),
            ("prospect2", false),
            ("prospect3", true),
            ("prospect4", true),
            ("prospect5", false),
            ("prospect6", false),
            ("prospect7", false),
        ]
    );
}

#[test]
fn unknown_user_is_unqualified_but_still_persisted() {
    let (qualifier, repository) = qualifier();

    let report = qualifier
        .qualify(
            vec![csv_row("unknown_user", "prospect1", "US", "CA")],
            &user_rules(),
        )
        .expect("batch runs");

    assert_eq!(report.summary.unqualified, 1);
    let stored = repository
        .stored("unknown_user", "prospect1")
        .expect("record stored");
    assert!(!stored.qualified);
}

#[test]
fn empty_batch_still_calls_repository() {
    let (qualifier, repository) = qualifier();

    let report = qualifier
        .qualify(Vec::new(), &user_rules())
        .expect("batch runs");

    assert_eq!(report.summary, BatchSummary::default());
    assert!(report.prospects.is_empty());
    assert_eq!(repository.calls(), vec![0]);
}

#[test]
fn rows_with_missing_fields_do_not_abort_the_batch() {
    let (qualifier, repository) = qualifier();
    let rows = vec![
        csv_row("us_california_with_ny_exclusion", "prospect1", "", "CA"),
        csv_row("us_california_with_ny_exclusion", "", "US", ""),
        csv_row("", "prospect3", "CA", ""),
        ProspectRow::default(),
        csv_row("europe_only_with_africa_exclusion", "prospect4", "UK", ""),
    ];

    let report = qualifier.qualify(rows, &user_rules()).expect("batch runs");

    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.qualified, 2);
    assert_eq!(report.prospects.len(), 5);
    assert!(!report.prospects[0].qualified);
    assert!(report.prospects[1].qualified);
    assert!(!report.prospects[2].qualified);
    assert!(!report.prospects[3].qualified);
    assert!(report.prospects[4].qualified);
    assert_eq!(repository.calls(), vec![5]);
    assert_eq!(report.persisted.skipped, 3);
    assert_eq!(report.persisted.inserted, 2);
}

#[test]
fn rerunning_a_batch_updates_instead_of_duplicating() {
    let (qualifier, repository) = qualifier();

    let first = qualifier
        .qualify(sample_rows(), &user_rules())
        .expect("first run");
    let second = qualifier
        .qualify(sample_rows(), &user_rules())
        .expect("second run");

    assert_eq!(first.summary, second.summary);
    assert_eq!(second.persisted.inserted, 0);
    assert_eq!(second.persisted.updated, 7);
    assert_eq!(repository.calls(), vec![7, 7]);
    let stored = repository
        .stored("us_california_with_ny_exclusion", "prospect1")
        .expect("record stored");
    assert!(stored.qualified);
    assert_eq!(repository.count().expect("count"), 7);
}

#[test]
fn rerun_with_new_rules_overwrites_outcome() {
    let (qualifier, repository) = qualifier();
    let rows = vec![csv_row("analyst", "lead-1", "JP", "")];

    qualifier
        .qualify(rows.clone(), &UserRules::new().with_rule("analyst", rule(&["Asia"], &[])))
        .expect("first run");
    assert!(repository.stored("analyst", "lead-1").expect("stored").qualified);

    qualifier
        .qualify(
            rows,
            &UserRules::new().with_rule("analyst", rule(&["Asia"], &["Japan"])),
        )
        .expect("second run");
    let stored = repository.stored("analyst", "lead-1").expect("stored");
    assert!(!stored.qualified);
    assert!(stored.last_updated >= stored.created_at);
}

#[test]
fn evaluate_rows_leaves_repository_untouched() {
    let (qualifier, repository) = qualifier();

    let outcome = qualifier.evaluate_rows(sample_rows(), &user_rules());

    assert_eq!(outcome.summary.total, 7);
    assert!(repository.calls().is_empty());
}

#[test]
fn repository_failure_surfaces_to_caller() {
    let qualifier = BatchQualifier::new(region_index(), Arc::new(UnavailableRepository));

    match qualifier.qualify(sample_rows(), &user_rules()) {
        Err(RepositoryError::Unavailable(message)) => assert!(message.contains("offline")),
        other => panic!("expected unavailable repository, got {other:?}"),
    }
}
