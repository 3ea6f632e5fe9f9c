//! Trio definitions and the Mendelian trio encoder.
//!
//! The encoder consumes positions in genomic order. For every trio it checks
//! the child's genotype against both parents, summarises the parents in one
//! byte and appends the result to the child's pending index entry.

mod calls;
mod encoder;
mod trio;

pub use calls::PositionCalls;
pub use encoder::{EncoderStats, TrioContext, TrioMendelianEncoder, HOM_REF_DEFAULT};
pub use trio::{parse_trios, Trio, TrioNames, MISSING_MEMBER};
