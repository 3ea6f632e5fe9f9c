use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::variant::{Variant, VariantParseError};

/// Separates fields within an entry.
pub const FIELD_SEPARATOR: u8 = b'\t';
/// Terminates every entry, including the last one.
pub const ENTRY_TERMINATOR: u8 = b'\n';

/// Whether `text` can be stored as one field without breaking the entry framing.
pub fn is_field_safe(text: &str) -> bool {
    !text
        .bytes()
        .any(|b| b == FIELD_SEPARATOR || b == ENTRY_TERMINATOR)
}

/// Errors raised while decoding an encoded entry list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ends inside an entry.
    #[error("truncated entry at byte {offset}")]
    Unterminated {
        /// Byte offset where the unterminated entry starts.
        offset: usize,
    },
    /// An entry has fewer than three or more than four fields.
    #[error("entry at byte {offset} has {found} fields, expected 3 or 4")]
    FieldCount {
        /// Byte offset of the entry.
        offset: usize,
        /// Number of fields found.
        found: usize,
    },
    /// A numeric field failed to parse.
    #[error("entry at byte {offset} has invalid {field} '{value}'")]
    InvalidNumber {
        /// Byte offset of the entry.
        offset: usize,
        /// Field name.
        field: &'static str,
        /// Raw field value.
        value: String,
    },
    /// The variant field failed to parse.
    #[error("entry at byte {offset}: {source}")]
    InvalidVariant {
        /// Byte offset of the entry.
        offset: usize,
        /// Parse failure.
        #[source]
        source: VariantParseError,
    },
    /// The entry is not valid UTF-8.
    #[error("entry at byte {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Byte offset of the entry.
        offset: usize,
    },
    /// `next` was called on an exhausted iterator.
    #[error("no more entries")]
    Exhausted,
}

/// One decoded Mendelian index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MendelianEntry {
    /// Variant the child was called at.
    pub variant: Variant,
    /// Child genotype.
    pub genotype: String,
    /// Occurrence of this genotype within the batch.
    pub occurrence: u32,
    /// Mendelian error code, 0 when consistent.
    pub error_code: u8,
    /// Parents byte aligned with `(genotype, occurrence)`, when available.
    pub parents: Option<u8>,
}

/// Append one entry to `buffer`. The error field is omitted when zero.
///
/// Every text field must pass [`is_field_safe`]; otherwise the buffer decodes
/// to different entries.
pub fn encode_entry(
    buffer: &mut Vec<u8>,
    variant: &Variant,
    genotype: &str,
    occurrence: u32,
    error_code: u8,
) {
    buffer.extend_from_slice(variant.to_string().as_bytes());
    buffer.push(FIELD_SEPARATOR);
    buffer.extend_from_slice(genotype.as_bytes());
    buffer.push(FIELD_SEPARATOR);
    buffer.extend_from_slice(occurrence.to_string().as_bytes());
    if error_code != 0 {
        buffer.push(FIELD_SEPARATOR);
        buffer.extend_from_slice(error_code.to_string().as_bytes());
    }
    buffer.push(ENTRY_TERMINATOR);
}

/// Encode a list of entries in order.
pub fn encode_entries(entries: &[MendelianEntry]) -> Vec<u8> {
    let mut buffer = Vec::new();
    for entry in entries {
        encode_entry(
            &mut buffer,
            &entry.variant,
            &entry.genotype,
            entry.occurrence,
            entry.error_code,
        );
    }
    buffer
}

/// Walks a per-genotype parents list in lockstep with the entries.
#[derive(Debug)]
struct AnnotationCursor<'a> {
    values: &'a [u8],
    index: usize,
}

impl<'a> AnnotationCursor<'a> {
    /// Advance until the cursor sits on `occurrence`.
    fn seek(&mut self, occurrence: usize) -> Option<u8> {
        while self.index < occurrence && self.index < self.values.len() {
            self.index += 1;
        }
        if self.index == occurrence {
            self.values.get(self.index).copied()
        } else {
            None
        }
    }
}

/// Forward-only decoder over an encoded entry buffer.
///
/// Entries come back in encoding order. [`skip_entry`](Self::skip_entry)
/// moves past an entry without parsing it. After a decoding error the
/// iterator is exhausted.
#[derive(Debug)]
pub struct MendelianEntryIterator<'a> {
    data: &'a [u8],
    offset: usize,
    parents: HashMap<&'a str, AnnotationCursor<'a>>,
}

impl<'a> MendelianEntryIterator<'a> {
    /// Iterate `data` without parents annotations.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            parents: HashMap::new(),
        }
    }

    /// Iterate `data`, attaching parents bytes from the per-genotype lists.
    pub fn with_parents(data: &'a [u8], parents: &'a BTreeMap<String, Vec<u8>>) -> Self {
        let cursors = parents
            .iter()
            .map(|(genotype, values)| {
                (
                    genotype.as_str(),
                    AnnotationCursor {
                        values: values.as_slice(),
                        index: 0,
                    },
                )
            })
            .collect();
        Self {
            data,
            offset: 0,
            parents: cursors,
        }
    }

    /// Whether another entry is available.
    pub fn has_next(&self) -> bool {
        self.offset < self.data.len()
    }

    /// Decode the next entry.
    pub fn next_entry(&mut self) -> Result<MendelianEntry, CodecError> {
        if !self.has_next() {
            return Err(CodecError::Exhausted);
        }
        let start = self.offset;
        let line = self.take_line()?;
        match self.decode(line, start) {
            Ok(entry) => Ok(entry),
            Err(error) => {
                self.offset = self.data.len();
                Err(error)
            }
        }
    }

    /// Move past the next entry without decoding it.
    pub fn skip_entry(&mut self) -> Result<(), CodecError> {
        if !self.has_next() {
            return Err(CodecError::Exhausted);
        }
        self.take_line().map(|_| ())
    }

    fn take_line(&mut self) -> Result<&'a [u8], CodecError> {
        let data: &'a [u8] = self.data;
        let start = self.offset;
        let remaining = &data[start..];
        match remaining.iter().position(|&b| b == ENTRY_TERMINATOR) {
            Some(len) => {
                self.offset = start + len + 1;
                Ok(&remaining[..len])
            }
            None => {
                self.offset = self.data.len();
                Err(CodecError::Unterminated { offset: start })
            }
        }
    }

    fn decode(&mut self, line: &'a [u8], offset: usize) -> Result<MendelianEntry, CodecError> {
        let text = std::str::from_utf8(line).map_err(|_| CodecError::InvalidUtf8 { offset })?;
        let fields: Vec<&'a str> = text.split(FIELD_SEPARATOR as char).collect();
        let (variant, genotype, occurrence, error_code) = match fields.as_slice() {
            [v, g, o] => (*v, *g, *o, None),
            [v, g, o, e] => (*v, *g, *o, Some(*e)),
            _ => {
                return Err(CodecError::FieldCount {
                    offset,
                    found: fields.len(),
                })
            }
        };

        let variant = variant
            .parse::<Variant>()
            .map_err(|source| CodecError::InvalidVariant { offset, source })?;
        let occurrence = occurrence.parse::<u32>().map_err(|_| CodecError::InvalidNumber {
            offset,
            field: "occurrence",
            value: occurrence.to_string(),
        })?;
        let error_code = match error_code {
            Some(value) => value.parse::<u8>().map_err(|_| CodecError::InvalidNumber {
                offset,
                field: "error code",
                value: value.to_string(),
            })?,
            None => 0,
        };
        let parents = self
            .parents
            .get_mut(genotype)
            .and_then(|cursor| cursor.seek(occurrence as usize));

        Ok(MendelianEntry {
            variant,
            genotype: genotype.to_string(),
            occurrence,
            error_code,
            parents,
        })
    }
}

impl Iterator for MendelianEntryIterator<'_> {
    type Item = Result<MendelianEntry, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_next().then(|| self.next_entry())
    }
}
