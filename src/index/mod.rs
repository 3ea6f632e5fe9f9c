//! Per-sample family index entries and their byte encoding.
//!
//! An entry is a list of `variant TAB genotype TAB occurrence [TAB error]`
//! records, each terminated by a newline. The error field is only written
//! for Mendelian errors. Parents bytes are stored next to the list, one
//! vector per child genotype, in occurrence order.

mod codec;
mod entry;
mod render;

pub use codec::{
    encode_entries, encode_entry, is_field_safe, CodecError, MendelianEntry,
    MendelianEntryIterator, ENTRY_TERMINATOR, FIELD_SEPARATOR,
};
pub use entry::{EntryKey, SampleIndexEntry, SampleIndexEntryBuilder};
pub use render::{render_entries, write_entries};
