#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use trio_index::orchestrator::SampleMetadata;
use trio_index::{FileId, InMemoryMetadataStore, SampleId, Variant, VariantCall};

pub const DAD: SampleId = SampleId(1);
pub const MUM: SampleId = SampleId(2);
pub const KID: SampleId = SampleId(3);

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("TRIO_INDEX_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set TRIO_INDEX_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

pub fn snv(chromosome: &str, position: u32, alternate: &str) -> Variant {
    Variant::new(chromosome, position, "A", alternate)
}

/// A call from `file` with one genotype per sample.
pub fn call(variant: Variant, file: u32, genotypes: &[(SampleId, &str)]) -> VariantCall {
    genotypes
        .iter()
        .fold(VariantCall::new(variant, FileId(file)), |call, (sample, gt)| {
            call.with_sample(*sample, *gt)
        })
}

/// Store with one family (`dad`, `mum`, `kid`) loaded from file 1.
pub fn family_store() -> InMemoryMetadataStore {
    let store = InMemoryMetadataStore::new();
    for (id, name) in [(DAD, "dad"), (MUM, "mum"), (KID, "kid")] {
        store
            .insert_sample(SampleMetadata::new(id, name).with_files([FileId(1)]))
            .expect("insert sample");
    }
    store
}

/// Store with `families` trios; family `i` uses ids `3i+1..=3i+3` named
/// `dad{i}`, `mum{i}`, `kid{i}`.
pub fn cohort_store(families: u32) -> InMemoryMetadataStore {
    let store = InMemoryMetadataStore::new();
    for family in 0..families {
        let base = family * 3;
        for (offset, role) in [(1, "dad"), (2, "mum"), (3, "kid")] {
            let sample = SampleMetadata::new(SampleId(base + offset), format!("{role}{family}"))
                .with_files([FileId(1)]);
            store.insert_sample(sample).expect("insert sample");
        }
    }
    store
}

/// `dad{i},mum{i},kid{i};...` for `families` trios.
pub fn trio_spec(families: u32) -> String {
    (0..families)
        .map(|family| format!("dad{family},mum{family},kid{family}"))
        .collect::<Vec<_>>()
        .join(";")
}
