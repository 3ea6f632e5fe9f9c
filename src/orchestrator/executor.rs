use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{info, instrument, warn};

use super::io::{IndexSink, SinkError, SourceError, VariantSource};
use super::metadata::{MetadataError, MetadataStore};
use crate::config::IndexConfig;
use crate::conflict::{ConflictResolver, ResolutionStats};
use crate::family::{EncoderStats, PositionCalls, Trio, TrioContext, TrioMendelianEncoder};
use crate::framework::{
    BlockContext, BlockProcessor, FrameworkError, ParallelEvaluator, PartitionConfig,
};
use crate::index::SampleIndexEntry;
use crate::variant::{FileId, Region, VariantCall};

/// Trios of one batch, either listed or named through a cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrioBatch {
    /// Trios carried in the job itself.
    Inline(Vec<Trio>),
    /// Registered cohort; bare children take parents from their metadata links.
    Cohort(String),
}

/// One job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    /// Batch number within the run (1-indexed).
    pub batch: usize,
    /// Trios to index.
    pub trios: TrioBatch,
    /// Restrict processing to this region.
    pub region: Option<Region>,
    /// Index version written.
    pub version: u32,
    /// Output location.
    pub output: String,
}

/// What a finished batch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Trios processed.
    pub trios: usize,
    /// Entries handed to the sink.
    pub entries_written: usize,
    /// Encoder counters summed over every block.
    pub stats: EncoderStats,
    /// Conflict resolution counters summed over every block.
    pub conflicts: ResolutionStats,
    /// Digest of the written entries, in key order.
    pub fingerprint: blake3::Hash,
}

/// Errors raised while executing one batch.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Metadata lookup failed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// The batch names a cohort that does not exist.
    #[error("cohort '{0}' not found")]
    UnknownCohort(String),
    /// Reading calls failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Writing entries failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// A worker failed.
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

/// Runs one batch job to completion.
pub trait BatchExecutor: Send + Sync {
    /// Execute `job`, reading trio definitions from `store` when needed.
    fn execute(
        &self,
        job: &BatchJob,
        store: &dyn MetadataStore,
    ) -> Result<BatchOutcome, ExecutorError>;
}

/// Executes batches in-process on a rayon pool.
#[derive(Debug)]
pub struct LocalExecutor<S, W> {
    source: S,
    sink: W,
    config: IndexConfig,
}

impl<S: VariantSource, W: IndexSink> LocalExecutor<S, W> {
    /// Executor reading from `source` and writing to `sink`.
    pub fn new(source: S, sink: W, config: IndexConfig) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// The variant source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The index sink.
    pub fn sink(&self) -> &W {
        &self.sink
    }

    fn regions(&self, job: &BatchJob) -> Result<Vec<Region>, SourceError> {
        if let Some(region) = &job.region {
            return Ok(vec![region.clone()]);
        }
        Ok(self
            .source
            .chromosomes()?
            .into_iter()
            .map(|(chromosome, last)| Region::new(chromosome, 1, last.max(1)))
            .collect())
    }
}

impl<S: VariantSource, W: IndexSink> BatchExecutor for LocalExecutor<S, W> {
    #[instrument(level = "info", skip_all, fields(batch = job.batch, output = %job.output))]
    fn execute(
        &self,
        job: &BatchJob,
        store: &dyn MetadataStore,
    ) -> Result<BatchOutcome, ExecutorError> {
        let trios = resolve_trios(&job.trios, store)?;
        let contexts = trio_contexts(&trios, store)?;

        let mut partition = PartitionConfig::new(self.regions(job)?, self.config.batch_size)?
            .with_verbose(self.config.verbose);
        if let Some(workers) = self.config.workers {
            partition = partition.with_workers(workers);
        }
        let processor = FamilyIndexProcessor {
            source: &self.source,
            trios: &contexts,
            batch_size: self.config.batch_size,
            resolve_conflicts: self.config.resolve_conflicts,
        };
        let result = ParallelEvaluator::new(processor, partition).evaluate(&())?;
        let output = result.output;

        self.sink.write(&job.output, &output.entries)?;
        if output.stats.malformed_genotypes > 0 {
            warn!(
                malformed = output.stats.malformed_genotypes,
                "skipped malformed genotypes"
            );
        }
        info!(
            blocks = result.blocks,
            entries = output.entries.len(),
            mendelian_errors = output.stats.mendelian_errors,
            discrepancies = output.stats.discrepancies,
            "batch finished"
        );
        Ok(BatchOutcome {
            trios: contexts.len(),
            entries_written: output.entries.len(),
            stats: output.stats,
            conflicts: output.conflicts,
            fingerprint: fingerprint(&output.entries),
        })
    }
}

/// Trios of a batch, reading cohort members from `store`.
pub fn resolve_trios(
    batch: &TrioBatch,
    store: &dyn MetadataStore,
) -> Result<Vec<Trio>, ExecutorError> {
    match batch {
        TrioBatch::Inline(trios) => Ok(trios.clone()),
        TrioBatch::Cohort(name) => {
            let cohort = store
                .cohort(name)?
                .ok_or_else(|| ExecutorError::UnknownCohort(name.clone()))?;
            Ok(cohort.into_trios(store)?)
        }
    }
}

/// Attach the "parents loaded from other files" flag: set when a present
/// parent's file set differs from the child's.
pub fn trio_contexts(
    trios: &[Trio],
    store: &dyn MetadataStore,
) -> Result<Vec<TrioContext>, MetadataError> {
    let mut contexts = Vec::with_capacity(trios.len());
    for trio in trios {
        let child_files = store.sample(trio.child)?.files;
        let mut other_files = false;
        for parent in [trio.father, trio.mother].into_iter().flatten() {
            other_files |= store.sample(parent)?.files != child_files;
        }
        contexts.push(TrioContext::new(*trio).with_parents_in_other_files(other_files));
    }
    Ok(contexts)
}

/// Digest of entries, sensitive to order and to every byte stored.
pub fn fingerprint(entries: &[SampleIndexEntry]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for entry in entries {
        hasher.update(&entry.key.sample.0.to_le_bytes());
        hasher.update(entry.key.chromosome.as_bytes());
        hasher.update(&[0]);
        hasher.update(&entry.key.batch_start.to_le_bytes());
        hasher.update(&(entry.mendelian.len() as u64).to_le_bytes());
        hasher.update(&entry.mendelian);
        for (genotype, parents) in &entry.parents {
            hasher.update(genotype.as_bytes());
            hasher.update(&[0]);
            hasher.update(&(parents.len() as u64).to_le_bytes());
            hasher.update(parents);
        }
        hasher.update(&entry.discrepancies.to_le_bytes());
    }
    hasher.finalize()
}

#[derive(Debug, Default)]
struct BlockOutput {
    entries: Vec<SampleIndexEntry>,
    stats: EncoderStats,
    conflicts: ResolutionStats,
}

struct FamilyIndexProcessor<'a, S> {
    source: &'a S,
    trios: &'a [TrioContext],
    batch_size: u32,
    resolve_conflicts: bool,
}

impl<S: VariantSource> FamilyIndexProcessor<'_, S> {
    fn resolve_per_file(
        &self,
        calls: Vec<VariantCall>,
    ) -> Result<(Vec<VariantCall>, ResolutionStats), FrameworkError> {
        let mut by_file: BTreeMap<FileId, Vec<VariantCall>> = BTreeMap::new();
        for call in calls {
            by_file.entry(call.file.file_id).or_default().push(call);
        }
        let resolver = ConflictResolver::new();
        let mut resolved = Vec::new();
        let mut stats = ResolutionStats::default();
        for (_, calls) in by_file {
            let resolution = resolver
                .resolve_with_stats(calls)
                .map_err(|err| FrameworkError::processor_failure(err.to_string()))?;
            stats += resolution.stats;
            resolved.extend(resolution.calls);
        }
        Ok((resolved, stats))
    }
}

impl<S: VariantSource> BlockProcessor for FamilyIndexProcessor<'_, S> {
    type Input = ();
    type BlockSummary = BlockOutput;
    type Output = BlockOutput;

    fn process_block(
        &self,
        _input: &(),
        context: &BlockContext,
    ) -> Result<BlockOutput, FrameworkError> {
        let calls = self.source.calls(&context.region).map_err(|err| {
            FrameworkError::processor_failure(format!("block {}: {err}", context.block_id))
        })?;
        let (calls, conflicts) = if self.resolve_conflicts {
            self.resolve_per_file(calls)?
        } else {
            (calls, ResolutionStats::default())
        };

        let mut encoder = TrioMendelianEncoder::new(self.trios.iter().copied(), self.batch_size);
        for position in PositionCalls::from_calls(&calls) {
            encoder.process(&position);
        }
        let (entries, stats) = encoder.finish();
        Ok(BlockOutput {
            entries,
            stats,
            conflicts,
        })
    }

    fn merge(
        &self,
        mut left: BlockOutput,
        right: BlockOutput,
    ) -> Result<BlockOutput, FrameworkError> {
        left.entries.extend(right.entries);
        left.stats += right.stats;
        left.conflicts += right.conflicts;
        Ok(left)
    }

    fn empty(&self) -> BlockOutput {
        BlockOutput::default()
    }

    fn finalize(&self, mut root: BlockOutput, _input: &()) -> Result<BlockOutput, FrameworkError> {
        root.entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(root)
    }
}
