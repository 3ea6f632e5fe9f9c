//! Local conflict resolution for overlapping variant calls.
//!
//! Calls coming from merged call sets can repeat the same allele or claim
//! overlapping positions. The resolver groups calls that transitively overlap
//! (secondary alternates included) and reduces every group to a set of calls
//! covering each position at most once.

mod alternate;
mod gaps;
mod ranking;
mod resolver;

pub use alternate::{calls_conflict, Alternate};
pub use gaps::missing_regions;
pub use ranking::rank;
pub use resolver::{ConflictResolver, Resolution, ResolutionStats};

use thiserror::Error;

/// Broken resolver invariants. These abort the unit being processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    /// A surviving call has an allele that no call owns.
    #[error("alternate '{alternate}' at {chromosome}:{position} is not claimed by any call")]
    AlternateUnclaimed {
        /// Chromosome of the alternate.
        chromosome: String,
        /// Start of the alternate.
        position: u32,
        /// Alternate allele.
        alternate: String,
    },
    /// A conflict group produced no calls.
    #[error("conflict group {chromosome}:{start}-{end} resolved to no calls")]
    EmptyGroup {
        /// Chromosome of the group.
        chromosome: String,
        /// Smallest start in the group.
        start: u32,
        /// Largest end in the group.
        end: u32,
    },
}
