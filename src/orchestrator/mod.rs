//! Run lifecycle: validation, batching, execution and status bookkeeping.
//!
//! A run resolves its trios, skips children whose index is already READY
//! for the requested version, and submits the rest in bounded batches.
//! Large runs pass each batch's trios through a temporary cohort instead
//! of inlining the trio list. Statuses move to READY only after every batch
//! of a full-genome run succeeds; a failed or region-limited run
//! leaves every status and parent link as it was.

mod executor;
mod io;
mod job;
mod metadata;

pub use executor::{
    fingerprint, resolve_trios, trio_contexts, BatchExecutor, BatchJob, BatchOutcome,
    ExecutorError, LocalExecutor, TrioBatch,
};
pub use io::{
    IndexSink, InMemoryIndexSink, InMemoryVariantSource, SinkError, SourceError, VariantSource,
};
pub use job::{
    BatchOrchestrator, FamilyIndexParams, JobError, RunReport, TrioSelection, TEMP_COHORT_PREFIX,
};
pub use metadata::{
    Cohort, IndexStatus, InMemoryMetadataStore, MetadataError, MetadataStore, SampleMetadata,
};
