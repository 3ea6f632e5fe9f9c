mod common;

use std::sync::Mutex;

use common::{call, cohort_store, family_store, snv, trio_spec, DAD, KID, MUM};
use trio_index::orchestrator::{
    resolve_trios, BatchExecutor, BatchJob, BatchOutcome, Cohort, ExecutorError, IndexStatus,
    MetadataStore, SourceError, TrioBatch, TEMP_COHORT_PREFIX,
};
use trio_index::{
    BatchOrchestrator, ConfigError, FamilyIndexParams, IndexConfig, InMemoryIndexSink,
    InMemoryMetadataStore, InMemoryVariantSource, JobError, LocalExecutor, SampleId, Trio,
};

fn family_calls() -> InMemoryVariantSource {
    InMemoryVariantSource::new([
        call(snv("1", 100, "T"), 1, &[(DAD, "0/0"), (MUM, "0/0"), (KID, "0/1")]),
        call(snv("1", 200, "G"), 1, &[(DAD, "0/1"), (MUM, "0/1"), (KID, "1/1")]),
        call(snv("2", 50, "C"), 1, &[(DAD, "1/1"), (MUM, "0/0"), (KID, "0/1")]),
    ])
}

fn local_orchestrator(
    store: InMemoryMetadataStore,
) -> BatchOrchestrator<InMemoryMetadataStore, LocalExecutor<InMemoryVariantSource, InMemoryIndexSink>>
{
    let config = IndexConfig::default().with_workers(2);
    let executor = LocalExecutor::new(family_calls(), InMemoryIndexSink::new(), config.clone());
    BatchOrchestrator::new(store, executor, config)
}

/// Records every job and optionally fails one batch.
#[derive(Debug, Default)]
struct RecordingExecutor {
    fail_on: Option<usize>,
    jobs: Mutex<Vec<(usize, TrioBatch, Vec<Trio>)>>,
}

impl BatchExecutor for RecordingExecutor {
    fn execute(
        &self,
        job: &BatchJob,
        store: &dyn MetadataStore,
    ) -> Result<BatchOutcome, ExecutorError> {
        let trios = resolve_trios(&job.trios, store)?;
        self.jobs
            .lock()
            .expect("jobs lock")
            .push((job.batch, job.trios.clone(), trios.clone()));
        if self.fail_on == Some(job.batch) {
            return Err(ExecutorError::Source(SourceError::Read {
                region: "1".to_string(),
                reason: "worker lost".to_string(),
            }));
        }
        Ok(BatchOutcome {
            trios: trios.len(),
            entries_written: trios.len(),
            stats: Default::default(),
            conflicts: Default::default(),
            fingerprint: blake3::hash(&(job.batch as u64).to_le_bytes()),
        })
    }
}

#[test]
fn full_run_marks_children_ready() {
    let orchestrator = local_orchestrator(family_store());
    let params = FamilyIndexParams::from_trios("dad,mum,kid").with_output("family");

    let report = orchestrator.run(&params).expect("run succeeds");
    assert_eq!(report.queued, vec![KID]);
    assert_eq!(report.batches, 1);
    assert_eq!(report.entries_written, 2);
    assert_eq!(report.mendelian_errors, 1);
    assert!(report.status_updated);

    let kid = orchestrator.store().sample(KID).expect("kid");
    assert_eq!(kid.family_index_status(1), IndexStatus::Ready);
    assert_eq!(kid.mendelian_error, IndexStatus::Ready);
    assert_eq!((kid.father, kid.mother), (Some(DAD), Some(MUM)));

    let written = orchestrator.executor().sink().entries("family");
    let chromosomes: Vec<&str> = written.iter().map(|e| &*e.key.chromosome).collect();
    assert_eq!(chromosomes, vec!["1", "2"]);
    assert_eq!(written[0].len(), 2);
}

#[test]
fn ready_children_are_skipped_unless_overwriting() {
    let orchestrator = local_orchestrator(family_store());
    let params = FamilyIndexParams::from_trios("dad,mum,kid").with_output("family");
    orchestrator.run(&params).expect("first run");

    let again = orchestrator.run(&params).expect("second run");
    assert_eq!(again.skipped, vec![KID]);
    assert!(again.queued.is_empty());
    assert_eq!(again.batches, 0);
    assert!(!again.status_updated);

    let forced = orchestrator
        .run(&params.clone().with_overwrite(true))
        .expect("overwrite run");
    assert_eq!(forced.queued, vec![KID]);
    assert_eq!(forced.batches, 1);
    assert_eq!(forced.fingerprint.len(), 64);
}

fn link_father(store: &InMemoryMetadataStore, child: SampleId, father: SampleId) {
    store
        .update_sample(child, &mut |sample| sample.father = Some(father))
        .expect("link father");
}

#[test]
fn region_runs_leave_metadata_untouched() {
    let store = family_store();
    link_father(&store, KID, SampleId(9));
    let orchestrator = local_orchestrator(store);
    let params = FamilyIndexParams::from_trios("dad,mum,kid")
        .with_output("family")
        .with_region("1:1-150");

    let report = orchestrator.run(&params).expect("run succeeds");
    assert!(!report.status_updated);
    assert_eq!(report.queued, vec![KID]);
    assert_eq!(report.entries_written, 1);
    let kid = orchestrator.store().sample(KID).expect("kid");
    assert_eq!(kid.family_index_status(1), IndexStatus::None);
    assert_eq!(kid.mendelian_error, IndexStatus::None);
    assert_eq!((kid.father, kid.mother), (Some(SampleId(9)), None));
}

#[test]
fn existing_parent_links_are_kept() {
    let store = family_store();
    link_father(&store, KID, SampleId(9));
    let orchestrator = local_orchestrator(store);
    let params = FamilyIndexParams::from_trios("dad,mum,kid").with_output("family");

    let report = orchestrator.run(&params).expect("run succeeds");
    assert!(report.status_updated);
    let kid = orchestrator.store().sample(KID).expect("kid");
    assert_eq!(kid.family_index_status(1), IndexStatus::Ready);
    assert_eq!((kid.father, kid.mother), (Some(SampleId(9)), Some(MUM)));
}

#[test]
fn failed_overwrite_keeps_ready_status_and_links() {
    let store = family_store();
    store
        .update_sample(KID, &mut |sample| {
            sample.family_index.insert(1, IndexStatus::Ready);
            sample.father = Some(SampleId(9));
        })
        .expect("prepare kid");
    let executor = RecordingExecutor {
        fail_on: Some(1),
        ..Default::default()
    };
    let orchestrator = BatchOrchestrator::new(store, executor, IndexConfig::default());
    let params = FamilyIndexParams::from_trios("dad,mum,kid")
        .with_output("family")
        .with_overwrite(true);

    assert!(matches!(
        orchestrator.run(&params),
        Err(JobError::BatchFailed { batch: 1, .. })
    ));
    let kid = orchestrator.store().sample(KID).expect("kid");
    assert_eq!(kid.family_index_status(1), IndexStatus::Ready);
    assert_eq!((kid.father, kid.mother), (Some(SampleId(9)), None));
}

#[test]
fn configuration_errors_fail_before_processing() {
    let orchestrator = BatchOrchestrator::new(
        family_store(),
        RecordingExecutor::default(),
        IndexConfig::default(),
    );
    let run = |params: FamilyIndexParams| match orchestrator.run(&params) {
        Err(JobError::Config(err)) => err,
        other => panic!("expected a configuration error, got {other:?}"),
    };

    assert_eq!(
        run(FamilyIndexParams::from_trios(" ").with_output("o")),
        ConfigError::EmptyTrioList
    );
    assert!(matches!(
        run(FamilyIndexParams::from_trios("dad,kid").with_output("o")),
        ConfigError::TrioArity { found: 2, .. }
    ));
    assert_eq!(
        run(FamilyIndexParams::from_trios("dad,mum,nobody").with_output("o")),
        ConfigError::UnknownSample {
            name: "nobody".to_string(),
            index: 0
        }
    );
    assert_eq!(
        run(FamilyIndexParams::from_trios("dad,mum,kid;-,-,kid").with_output("o")),
        ConfigError::DuplicateChild {
            name: "kid".to_string()
        }
    );
    assert_eq!(
        run(FamilyIndexParams::from_trios("dad,mum,kid")),
        ConfigError::MissingOutput
    );
    assert_eq!(
        run(FamilyIndexParams::from_cohort("missing").with_output("o")),
        ConfigError::UnknownCohort("missing".to_string())
    );
    assert!(matches!(
        run(FamilyIndexParams::from_trios("dad,mum,kid")
            .with_output("o")
            .with_region("1:200-100")),
        ConfigError::Region(_)
    ));
    assert!(orchestrator.executor().jobs.lock().expect("jobs").is_empty());
}

#[test]
fn large_runs_use_temporary_cohorts() {
    let config = IndexConfig::default().with_max_trios_per_batch(2);
    let orchestrator =
        BatchOrchestrator::new(cohort_store(5), RecordingExecutor::default(), config);
    let params = FamilyIndexParams::from_trios(trio_spec(5)).with_output("o");

    let report = orchestrator.run(&params).expect("run succeeds");
    assert_eq!(report.batches, 3);
    assert_eq!(report.entries_written, 5);

    let jobs = orchestrator.executor().jobs.lock().expect("jobs");
    let sizes: Vec<usize> = jobs.iter().map(|(_, _, trios)| trios.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    // Parents travel with the temporary cohort, not through persisted links.
    assert_eq!(
        jobs[2].2,
        vec![Trio::new(SampleId(13), SampleId(14), SampleId(15))]
    );
    assert!(jobs
        .iter()
        .all(|(_, batch, _)| matches!(batch, TrioBatch::Cohort(name) if name.starts_with(TEMP_COHORT_PREFIX))));
    assert!(orchestrator
        .store()
        .cohort_names()
        .expect("cohorts")
        .is_empty());
}

#[test]
fn small_runs_inline_trios() {
    let orchestrator = BatchOrchestrator::new(
        cohort_store(2),
        RecordingExecutor::default(),
        IndexConfig::default(),
    );
    let params = FamilyIndexParams::from_trios(trio_spec(2)).with_output("o");
    orchestrator.run(&params).expect("run succeeds");

    let jobs = orchestrator.executor().jobs.lock().expect("jobs");
    assert_eq!(jobs.len(), 1);
    assert!(matches!(&jobs[0].1, TrioBatch::Inline(trios) if trios.len() == 2));
}

#[test]
fn failed_batch_fails_the_run_without_status_update() {
    let config = IndexConfig::default().with_max_trios_per_batch(2);
    let executor = RecordingExecutor {
        fail_on: Some(2),
        ..Default::default()
    };
    let orchestrator = BatchOrchestrator::new(cohort_store(5), executor, config);
    let params = FamilyIndexParams::from_trios(trio_spec(5)).with_output("o");

    match orchestrator.run(&params) {
        Err(JobError::BatchFailed { batch, .. }) => assert_eq!(batch, 2),
        other => panic!("expected batch failure, got {other:?}"),
    }
    assert_eq!(orchestrator.executor().jobs.lock().expect("jobs").len(), 2);
    for family in 0..5 {
        let kid = orchestrator
            .store()
            .sample(SampleId(family * 3 + 3))
            .expect("kid");
        assert_eq!(kid.family_index_status(1), IndexStatus::None);
        assert_eq!((kid.father, kid.mother), (None, None));
    }
    assert!(orchestrator
        .store()
        .cohort_names()
        .expect("cohorts")
        .is_empty());
}

#[test]
fn cohort_runs_resolve_parents_from_links() {
    let store = cohort_store(2);
    for family in 0..2 {
        let base = family * 3;
        store
            .update_sample(SampleId(base + 3), &mut |sample| {
                sample.father = Some(SampleId(base + 1));
                sample.mother = Some(SampleId(base + 2));
            })
            .expect("link parents");
    }
    store
        .register_cohort("children", Cohort::Children(vec![SampleId(3), SampleId(6)]))
        .expect("register cohort");

    let orchestrator = BatchOrchestrator::new(store, RecordingExecutor::default(), IndexConfig::default());
    let trios = orchestrator
        .resolve(&trio_index::orchestrator::TrioSelection::Cohort("children".to_string()))
        .expect("resolves");
    assert_eq!(trios[1].father, Some(SampleId(4)));

    let report = orchestrator
        .run(&FamilyIndexParams::from_cohort("children").with_output("o"))
        .expect("run succeeds");
    assert_eq!(report.queued, vec![SampleId(3), SampleId(6)]);
    assert!(report.status_updated);
    assert_eq!(
        orchestrator.store().cohort_names().expect("cohorts"),
        vec!["children".to_string()]
    );
}
