//! # Trio Family Indexing for Per-Sample Variant Indexes
//!
//! This library builds the family (trio) part of a per-sample variant index:
//! for every child it records, batch by batch, the child's genotype, the
//! parents' genotypes packed into one byte, and a Mendelian error code.
//!
//! ## Pipeline
//!
//! 1. **Conflict resolution**: overlapping or duplicated calls coming from
//!    merged call sets are reduced to non-overlapping calls ([`conflict`])
//! 2. **Trio encoding**: positions are checked against each trio and
//!    appended to the child's pending entry ([`family`])
//! 3. **Entry encoding**: entries are serialized into a compact delimited
//!    byte format and decoded lazily ([`index`])
//! 4. **Orchestration**: runs are validated, split into bounded batches,
//!    executed on parallel workers and tracked per sample ([`orchestrator`])
//!
//! ## Usage Example
//!
//! ```ignore
//! use trio_index::{BatchOrchestrator, FamilyIndexParams, IndexConfig, LocalExecutor};
//!
//! let executor = LocalExecutor::new(source, sink, IndexConfig::default());
//! let orchestrator = BatchOrchestrator::new(store, executor, IndexConfig::default());
//! let params = FamilyIndexParams::from_trios("dad,mum,kid").with_output("family_index");
//! let report = orchestrator.run(&params)?;
//! assert!(report.status_updated);
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod config; // Run configuration
pub mod conflict; // Overlapping call resolution
pub mod family; // Trios and the Mendelian trio encoder
pub mod framework; // Parallel batch-aligned block evaluation
pub mod genotype; // Genotype grammar and 4-bit codec
pub mod index; // Sample index entries and their byte format
pub mod mendel; // Mendelian inheritance rules
pub mod orchestrator; // Run lifecycle and status bookkeeping
pub mod telemetry; // Logging setup
pub mod variant; // Variant data model

// Re-exports for convenience
pub use config::{ConfigError, IndexConfig};
pub use conflict::{ConflictError, ConflictResolver};
pub use family::{PositionCalls, Trio, TrioContext, TrioMendelianEncoder};
pub use genotype::{CallGenotype, Genotype, GenotypeCode};
pub use index::{MendelianEntryIterator, SampleIndexEntry, SampleIndexEntryBuilder};
pub use orchestrator::{
    BatchOrchestrator, FamilyIndexParams, InMemoryIndexSink, InMemoryMetadataStore,
    InMemoryVariantSource, JobError, LocalExecutor, RunReport,
};
pub use variant::{FileId, Region, SampleId, Variant, VariantCall, VariantKind};
