mod common;

use std::collections::HashSet;

use blake3::hash;
use common::{call, cohort_store, snv, trio_spec};
use trio_index::index::render_entries;
use trio_index::{
    BatchOrchestrator, FamilyIndexParams, IndexConfig, InMemoryIndexSink, InMemoryVariantSource,
    SampleId, Variant, VariantCall,
};

const GENOTYPES: [&str; 8] = ["0/0", "0/1", "1/1", "0|1", "1|0", "./.", "./1", "1/2"];

/// Three families over two chromosomes, with a deletion every 25 sites.
fn synthetic_calls() -> Vec<VariantCall> {
    let mut state: u64 = 0x5eed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let mut calls = Vec::new();
    for chromosome in ["1", "X"] {
        for step in 0..400u32 {
            let position = 10 + step * 37;
            let variant = if step % 25 == 0 {
                Variant::new(chromosome, position, "ACGT", "A")
            } else {
                snv(chromosome, position, "T")
            };
            let mut genotypes: Vec<(SampleId, &str)> = Vec::new();
            for sample in 1..=9 {
                if next() % 4 != 0 {
                    genotypes.push((SampleId(sample), GENOTYPES[next() % GENOTYPES.len()]));
                }
            }
            calls.push(call(variant, 1, &genotypes));
        }
    }
    calls
}

fn run_once(workers: usize) -> (String, blake3::Hash) {
    let config = IndexConfig::default()
        .with_batch_size(1_000)
        .with_workers(workers);
    let executor = trio_index::LocalExecutor::new(
        InMemoryVariantSource::new(synthetic_calls()),
        InMemoryIndexSink::new(),
        config.clone(),
    );
    let orchestrator = BatchOrchestrator::new(cohort_store(3), executor, config);
    let report = orchestrator
        .run(&FamilyIndexParams::from_trios(trio_spec(3)).with_output("out"))
        .expect("run succeeds");
    assert!(report.entries_written > 0);

    let entries = orchestrator.executor().sink().entries("out");
    let rendered = render_entries(&entries).expect("rendering succeeds");
    (report.fingerprint, hash(rendered.as_bytes()))
}

#[test]
fn family_index_is_deterministic_across_runs() {
    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        fingerprints.insert(run_once(4));
    }
    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}

#[test]
fn family_index_does_not_depend_on_worker_count() {
    let fingerprints: HashSet<_> = [1, 2, 3, 8].into_iter().map(run_once).collect();
    assert_eq!(fingerprints.len(), 1, "outputs diverged across worker counts");
}
