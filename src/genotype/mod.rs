//! Genotype parsing and the 4-bit genotype codec.
//!
//! Parents of every indexed child are summarised in one byte: the father's
//! [`GenotypeCode`] in the high nibble and the mother's in the low nibble.

mod allele;
mod call;
mod codec;
mod filter;

pub use allele::{Genotype, GenotypeError};
pub use call::CallGenotype;
pub use codec::{
    decode, decode_father, decode_mother, encode, encode_all, encode_opt, encode_parsed, join,
    split, GenotypeCode,
};
pub use filter::ParentGenotypeFilter;
