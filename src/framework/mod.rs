//! Batch-aligned region partitioning and parallel block evaluation.
//!
//! The genome is cut into blocks that never straddle a batch boundary.
//! Blocks are processed concurrently and their summaries are merged back
//! in genomic order.

mod region_eval;

pub use region_eval::{
    BlockContext, BlockProcessor, EvaluationResult, FrameworkError, ParallelEvaluator,
    PartitionConfig,
};
