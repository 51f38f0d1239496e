mod common;

use std::collections::{HashMap, HashSet};

use common::{distinct_objects_file, mock_session, record, same_object_file, MockRecord, MockSource};
use tng_dataset::{
    identity::ObjectIdentity,
    params::{BuildParams, EvictionPolicy},
    session::SplitOutcome,
    split::Split,
};

fn params(train: f64, validation: f64, test: f64) -> BuildParams {
    BuildParams::builder()
        .proportions(train, validation, test)
        .seed(42)
        .build()
        .unwrap()
}

#[test]
fn single_object_file_goes_entirely_to_train() {
    let source = MockSource::new().with_file("/tng/a.fits", same_object_file(11, &["v0", "v1", "v2"]));
    let mut session = mock_session(source, params(1.0, 0.0, 0.0));

    let mut train = session.generate(Split::Train);
    let examples: Vec<_> = train.by_ref().map(Result::unwrap).collect();
    let report = train.into_report();

    assert_eq!(examples.len(), 7);
    assert_eq!(report.accepted, 7);
    assert_eq!(report.duplicates, 4);
    assert_eq!(report.outcome, Some(SplitOutcome::QuotaMet));
    assert!(session.pool().is_empty());

    for split in [Split::Validation, Split::Test] {
        let mut generator = session.generate(split);
        assert!(generator.next().is_none());
        assert_eq!(generator.report().accepted, 0);
    }

    let identity = examples[0].record.identity();
    assert_eq!(session.ledger().owner_of(&identity), Some(Split::Train));
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(session.quota(Split::Train).count(), 7);
}

#[test]
fn object_claimed_by_train_is_rejected_by_validation() {
    let source = MockSource::new()
        .with_file("/tng/a.fits", same_object_file(5, &["v0", "v1", "v2"]))
        .with_file("/tng/b.fits", same_object_file(5, &["v3", "v4", "v5"]));
    let mut session = mock_session(source, params(0.5, 0.5, 0.0));

    let train: Vec<_> = session.generate(Split::Train).map(Result::unwrap).collect();
    assert_eq!(train.len(), 7);

    let mut validation = session.generate(Split::Validation);
    assert!(validation.next().is_none());
    let report = validation.into_report();

    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected, 7);
    assert_eq!(report.outcome, Some(SplitOutcome::PoolExhausted));
    assert_eq!(session.quota(Split::Validation).shortfall(), 7);
    assert_eq!(session.ledger().member_count(Split::Validation), 0);
}

#[test]
fn no_object_leaks_across_splits() {
    let mut source = MockSource::new();
    for i in 0..10 {
        let records = (0..7)
            .map(|k| MockRecord::Good(record((i * 3 + k) % 12, ["v0", "v1", "v2"][k as usize % 3])))
            .collect();
        source = source.with_file(&format!("/tng/{i:02}.fits"), records);
    }
    let mut session = mock_session(source, params(0.8, 0.1, 0.1));

    let mut seen: HashMap<ObjectIdentity, Split> = HashMap::new();
    for split in Split::ALL {
        for example in session.generate(split) {
            let identity = example.unwrap().record.identity();
            let owner = *seen.entry(identity).or_insert(split);
            assert_eq!(owner, split, "object emitted into two splits");
        }
    }

    for (identity, split) in &seen {
        assert_eq!(session.ledger().owner_of(identity), Some(*split));
    }

    let members: Vec<HashSet<_>> = Split::ALL
        .iter()
        .map(|&s| session.ledger().members(s).cloned().collect())
        .collect();
    assert!(members[0].is_disjoint(&members[1]));
    assert!(members[0].is_disjoint(&members[2]));
    assert!(members[1].is_disjoint(&members[2]));
}

#[test]
fn rejected_only_file_ends_on_visit_budget_when_counting_accepted() {
    let source = MockSource::new()
        .with_file("/tng/a.fits", same_object_file(5, &["v0"]))
        .with_file("/tng/b.fits", same_object_file(5, &["v1"]));
    let params = BuildParams::builder()
        .proportions(0.5, 0.5, 0.0)
        .eviction_policy(EvictionPolicy::OnAccepted)
        .seed(3)
        .build()
        .unwrap();
    let mut session = mock_session(source, params);

    assert_eq!(session.generate(Split::Train).count(), 7);

    let mut validation = session.generate(Split::Validation);
    assert!(validation.next().is_none());
    assert_eq!(validation.visit_budget(), 14);
    let report = validation.into_report();

    assert_eq!(report.outcome, Some(SplitOutcome::VisitBudgetExhausted));
    assert_eq!(report.files_visited, 14);
    assert_eq!(report.rejected, 98);
    assert_eq!(session.pool().len(), 1);
    assert_eq!(session.source().total_reads(), 15);
}

#[test]
fn distinct_objects_fill_every_split() {
    let mut source = MockSource::new();
    for i in 0..10 {
        source = source.with_file(&format!("/tng/{i:02}.fits"), distinct_objects_file(i * 7));
    }
    let mut session = mock_session(source, params(0.8, 0.1, 0.1));

    let counts: Vec<usize> = Split::ALL
        .iter()
        .map(|&split| session.generate(split).count())
        .collect();

    assert_eq!(counts, vec![56, 7, 7]);
    assert_eq!(session.ledger().len(), 70);
    assert!(session.pool().is_empty());
}
