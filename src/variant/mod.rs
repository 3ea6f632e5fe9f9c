//! Variant data model shared by the resolver, the encoder and the index codec.
//!
//! Records arrive already parsed from the variant store reader; this module
//! only describes them and provides the textual variant form stored in index
//! entries.

mod region;
mod types;

pub use region::{Region, RegionParseError};
pub use types::{
    AlternateCoordinate, FileEntry, FileId, OriginalCall, SampleGenotype, SampleId, Variant,
    VariantCall, VariantKind, VariantParseError, NO_CALL, PASS, SITE_CONFLICT,
};
