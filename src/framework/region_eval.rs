use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::batch_start;
use crate::variant::Region;

/// Errors that can occur while partitioning or evaluating regions.
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// Configuration invalid (e.g., zero batch size).
    #[error("invalid evaluator configuration: {0}")]
    InvalidConfiguration(String),

    /// Requested block index is out of range for the configured number of blocks.
    #[error("block id {block_id} out of range (max {max_blocks})")]
    BlockOutOfRange {
        /// Block identifier (1-indexed) that was requested.
        block_id: usize,
        /// Maximum valid block identifier.
        max_blocks: usize,
    },

    /// User-supplied processor reported an error.
    #[error("processor error: {0}")]
    Processor(String),

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl FrameworkError {
    /// Helper for constructing processor-originated errors.
    pub fn processor_failure(msg: impl Into<String>) -> Self {
        FrameworkError::Processor(msg.into())
    }
}

/// Partition of the genome into batch-aligned blocks.
///
/// Every block lies inside one batch (`[k * batch_size, (k + 1) * batch_size)`),
/// so a worker never shares a batch with another worker.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Positions per batch.
    pub batch_size: u32,
    /// Worker threads; `None` uses the global rayon pool.
    pub workers: Option<usize>,
    /// Log every block.
    pub verbose: bool,
    blocks: Vec<Region>,
}

impl PartitionConfig {
    /// Split `regions` at batch boundaries. Regions are kept in the given order.
    pub fn new<I>(regions: I, batch_size: u32) -> Result<Self, FrameworkError>
    where
        I: IntoIterator<Item = Region>,
    {
        if batch_size == 0 {
            return Err(FrameworkError::InvalidConfiguration(
                "batch size must be > 0".to_string(),
            ));
        }
        let mut blocks = Vec::new();
        for region in regions {
            if region.start > region.end {
                return Err(FrameworkError::InvalidConfiguration(format!(
                    "region {region} has start after end"
                )));
            }
            let mut start = region.start;
            loop {
                let batch_end = batch_start(start, batch_size)
                    .saturating_add(batch_size - 1)
                    .min(region.end);
                blocks.push(Region::new(Arc::clone(&region.chromosome), start, batch_end));
                if batch_end >= region.end {
                    break;
                }
                start = batch_end + 1;
            }
        }
        Ok(Self {
            batch_size,
            workers: None,
            verbose: false,
            blocks,
        })
    }

    /// Use a dedicated pool with `workers` threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Enable verbose mode.
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Block context for a given block id (1-indexed).
    pub fn block_context(&self, block_id: usize) -> Result<BlockContext, FrameworkError> {
        if block_id == 0 || block_id > self.blocks.len() {
            return Err(FrameworkError::BlockOutOfRange {
                block_id,
                max_blocks: self.blocks.len(),
            });
        }
        Ok(BlockContext {
            block_id,
            region: self.blocks[block_id - 1].clone(),
        })
    }

    fn contexts(&self) -> Vec<BlockContext> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, region)| BlockContext {
                block_id: index + 1,
                region: region.clone(),
            })
            .collect()
    }
}

/// Per-block metadata supplied to processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    /// 1-indexed block identifier.
    pub block_id: usize,
    /// Genomic span of the block.
    pub region: Region,
}

impl BlockContext {
    /// Number of positions covered by this block.
    pub fn len(&self) -> u64 {
        u64::from(self.region.end) - u64::from(self.region.start) + 1
    }

    /// Always false; blocks cover at least one position.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Trait implemented by domain-specific processors that operate on blocks.
///
/// Blocks are processed concurrently, so processors take `&self`.
pub trait BlockProcessor: Sync {
    /// Type describing the full input workload.
    type Input: Sync;
    /// Summary emitted per block (must be mergeable).
    type BlockSummary: Send;
    /// Final output type produced after evaluation.
    type Output;

    /// Process a single block.
    fn process_block(
        &self,
        input: &Self::Input,
        context: &BlockContext,
    ) -> Result<Self::BlockSummary, FrameworkError>;

    /// Merge summaries from adjacent blocks, left before right (associative).
    fn merge(
        &self,
        left: Self::BlockSummary,
        right: Self::BlockSummary,
    ) -> Result<Self::BlockSummary, FrameworkError>;

    /// Summary of an input with no blocks.
    fn empty(&self) -> Self::BlockSummary;

    /// Finalize result at the root.
    fn finalize(
        &self,
        root: Self::BlockSummary,
        input: &Self::Input,
    ) -> Result<Self::Output, FrameworkError>;
}

/// Result returned by the parallel evaluator.
#[derive(Debug)]
pub struct EvaluationResult<O> {
    /// Final output synthesized from the root summary.
    pub output: O,
    /// Blocks processed.
    pub blocks: usize,
}

/// Runs a [`BlockProcessor`] over every block in parallel and merges the
/// summaries pairwise in block order.
#[derive(Debug)]
pub struct ParallelEvaluator<P: BlockProcessor> {
    processor: P,
    config: PartitionConfig,
}

impl<P: BlockProcessor> ParallelEvaluator<P> {
    /// Create a new evaluator with the provided processor and configuration.
    pub fn new(processor: P, config: PartitionConfig) -> Self {
        Self { processor, config }
    }

    /// Access configuration.
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Access the processor.
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Execute evaluation and return the final output.
    ///
    /// The first failing block aborts the run; summaries of other blocks are
    /// discarded.
    #[instrument(level = "debug", skip_all, fields(blocks = self.config.num_blocks()))]
    pub fn evaluate(
        &self,
        input: &P::Input,
    ) -> Result<EvaluationResult<P::Output>, FrameworkError> {
        let contexts = self.config.contexts();
        let summaries = match self.config.workers {
            Some(workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|index| format!("trio-index-{index}"))
                    .build()
                    .map_err(|err| FrameworkError::WorkerPool(err.to_string()))?;
                pool.install(|| self.process_all(input, &contexts))?
            }
            None => self.process_all(input, &contexts)?,
        };

        let root = match self.merge_range(summaries)? {
            Some(root) => root,
            None => self.processor.empty(),
        };
        let output = self.processor.finalize(root, input)?;
        Ok(EvaluationResult {
            output,
            blocks: contexts.len(),
        })
    }

    fn process_all(
        &self,
        input: &P::Input,
        contexts: &[BlockContext],
    ) -> Result<Vec<P::BlockSummary>, FrameworkError> {
        let verbose = self.config.verbose;
        contexts
            .par_iter()
            .map(|context| {
                if verbose {
                    debug!(block = context.block_id, region = %context.region, "processing block");
                }
                self.processor.process_block(input, context)
            })
            .collect()
    }

    /// Balanced merge over adjacent summaries, preserving block order.
    fn merge_range(
        &self,
        mut summaries: Vec<P::BlockSummary>,
    ) -> Result<Option<P::BlockSummary>, FrameworkError> {
        match summaries.len() {
            0 => Ok(None),
            1 => Ok(summaries.pop()),
            len => {
                let right = summaries.split_off(len / 2);
                let left = self.merge_range(summaries)?;
                let right = self.merge_range(right)?;
                match (left, right) {
                    (Some(left), Some(right)) => self.processor.merge(left, right).map(Some),
                    (left, right) => Ok(left.or(right)),
                }
            }
        }
    }
}
