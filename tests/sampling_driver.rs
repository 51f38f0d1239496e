mod common;

use common::{
    distinct_objects_file, mock_session, record, utf8_tempdir, MockRecord, MockSource,
};
use tng_dataset::{
    builder::TngDatasetBuilder,
    file_pool::FilePool,
    params::{BuildParams, EvictionPolicy, MalformedPolicy},
    session::SplitOutcome,
    split::Split,
    tng_errors::TngError,
};

fn pool_of(files: i32) -> MockSource {
    (0..files).fold(MockSource::new(), |source, i| {
        source.with_file(&format!("/tng/{i:03}.fits"), distinct_objects_file(i * 7))
    })
}

#[test]
fn quota_is_checked_only_between_files() {
    let params = BuildParams::builder()
        .proportions(0.5, 0.5, 0.0)
        .seed(1)
        .build()
        .unwrap();
    let mut session = mock_session(pool_of(3), params);

    // target 10.5: the second file is drained completely
    let mut train = session.generate(Split::Train);
    assert_eq!(train.by_ref().count(), 14);
    assert_eq!(train.report().outcome, Some(SplitOutcome::QuotaMet));

    let mut validation = session.generate(Split::Validation);
    assert_eq!(validation.by_ref().count(), 7);
    let report = validation.into_report();
    assert_eq!(report.outcome, Some(SplitOutcome::PoolExhausted));
    assert!(report.is_short());
    assert_eq!(session.quota(Split::Validation).shortfall(), 4);
}

#[test]
fn running_count_is_monotonic_and_keys_are_sequential() {
    let params = BuildParams::builder().seed(9).build().unwrap();
    let mut session = mock_session(pool_of(20), params);

    let mut train = session.generate(Split::Train);
    let mut last = 0;
    let mut index = 0;
    while let Some(example) = train.next() {
        let example = example.unwrap();
        index += 1;
        assert_eq!(example.key, format!("train-{index:06}"));

        let accepted = train.report().accepted;
        assert_eq!(accepted, last + 1);
        last = accepted;
    }
    drop(train);

    assert_eq!(session.quota(Split::Train).count(), last);
    assert!(session.quota(Split::Train).is_met());
}

#[test]
fn restarted_generator_continues_the_key_sequence() {
    let params = BuildParams::builder()
        .proportions(0.5, 0.5, 0.0)
        .seed(4)
        .build()
        .unwrap();
    let mut session = mock_session(pool_of(3), params);

    let first: Vec<_> = session
        .generate(Split::Train)
        .take(3)
        .map(|e| e.unwrap().key)
        .collect();
    assert_eq!(first, ["train-000001", "train-000002", "train-000003"]);
    assert_eq!(session.quota(Split::Train).count(), 3);

    let second: Vec<_> = session
        .generate(Split::Train)
        .map(|e| e.unwrap().key)
        .collect();
    let count = session.quota(Split::Train).count();
    assert_eq!(second.len() as u64, count - 3);

    let expected: Vec<_> = (4..=count).map(|i| format!("train-{i:06}")).collect();
    assert_eq!(second, expected);
}

#[test]
fn every_generator_terminates_within_its_visit_budget() {
    for seed in 0..20 {
        let params = BuildParams::builder()
            .proportions(0.6, 0.2, 0.2)
            .eviction_policy(EvictionPolicy::OnAccepted)
            .seed(seed)
            .build()
            .unwrap();

        // the same objects appear in several files, so rejects are frequent
        let source = (0..6).fold(MockSource::new(), |source, i| {
            let records = (0..7)
                .map(|k| MockRecord::Good(record((i + k) % 9, "v0")))
                .collect();
            source.with_file(&format!("/tng/{i}.fits"), records)
        });
        let mut session = mock_session(source, params);

        for split in Split::ALL {
            let mut generator = session.generate(split);
            generator.by_ref().for_each(|e| {
                e.unwrap();
            });
            let report = generator.into_report();
            assert!(report.files_visited <= 6 * 7, "seed {seed}: {report}");
            assert!(report.outcome.is_some());
        }
    }
}

#[test]
fn exhausted_files_are_never_read_again() {
    let params = BuildParams::builder().seed(4).build().unwrap();
    let mut session = mock_session(pool_of(12), params);

    for split in Split::ALL {
        session.generate(split).for_each(|e| {
            e.unwrap();
        });
    }

    for i in 0..12 {
        assert!(session.source().reads(&format!("/tng/{i:03}.fits")) <= 1);
    }
    assert!(session.pool().is_empty());
}

#[test]
fn malformed_records_are_skipped_by_default() {
    let mut records = distinct_objects_file(0);
    records[3] = MockRecord::Malformed("REDSHIFT");
    let source = MockSource::new().with_file("/tng/a.fits", records);
    let params = BuildParams::builder()
        .proportions(1.0, 0.0, 0.0)
        .seed(0)
        .build()
        .unwrap();
    let mut session = mock_session(source, params);

    let mut train = session.generate(Split::Train);
    assert_eq!(train.by_ref().filter(|e| e.is_ok()).count(), 6);
    let report = train.into_report();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.files_evicted, 1);
    assert_eq!(report.outcome, Some(SplitOutcome::PoolExhausted));
}

#[test]
fn malformed_record_ends_generator_under_fail_policy() {
    let mut records = distinct_objects_file(0);
    records[2] = MockRecord::Malformed("CAMERA");
    let source = MockSource::new().with_file("/tng/a.fits", records);
    let params = BuildParams::builder()
        .malformed_policy(MalformedPolicy::Fail)
        .seed(0)
        .build()
        .unwrap();
    let mut session = mock_session(source, params);

    let mut train = session.generate(Split::Train);
    assert!(train.next().unwrap().is_ok());
    assert!(train.next().unwrap().is_ok());
    assert_eq!(
        train.next(),
        Some(Err(TngError::MissingKeyword("CAMERA".into())))
    );
    assert_eq!(train.next(), None);
    assert_eq!(train.next(), None);
    assert_eq!(train.report().outcome, Some(SplitOutcome::Failed));
}

#[test]
fn unreadable_file_is_propagated_once() {
    let source = MockSource::new().with_unreadable("/tng/broken.fits");
    let params = BuildParams::builder().seed(0).build().unwrap();
    let mut session = mock_session(source, params);

    let mut train = session.generate(Split::Train);
    assert!(matches!(train.next(), Some(Err(TngError::IoError(_)))));
    assert!(train.next().is_none());
}

#[test]
fn same_seed_replays_the_same_examples() {
    let run = |seed| {
        let params = BuildParams::builder().seed(seed).build().unwrap();
        let mut session = mock_session(pool_of(15), params);
        session
            .generate(Split::Train)
            .map(|e| e.unwrap().record.subhalo)
            .collect::<Vec<_>>()
    };

    assert_eq!(run(17), run(17));
}

#[test]
fn empty_pool_is_fatal() {
    assert_eq!(
        FilePool::from_paths(vec![], 7).unwrap_err(),
        TngError::EmptyFilePool("<explicit path list>".into())
    );

    let (_guard, root) = utf8_tempdir();
    std::fs::create_dir_all(root.join("nested/empty")).unwrap();

    assert_eq!(
        FilePool::discover(&root, 7).unwrap_err(),
        TngError::EmptyFilePool(root.to_string())
    );

    let mut builder = TngDatasetBuilder::new(root.clone(), BuildParams::default()).unwrap();
    assert!(matches!(
        builder.generate(Split::Train),
        Err(TngError::EmptyFilePool(_))
    ));
}

#[test]
fn invalid_proportions_are_fatal_at_construction() {
    let params = BuildParams {
        train: 0.7,
        validation: 0.2,
        test: 0.1,
        ..BuildParams::default()
    };
    assert!(matches!(
        TngDatasetBuilder::new("/tng", params),
        Err(TngError::InvalidProportions { .. })
    ));
}
