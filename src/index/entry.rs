use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::codec::{encode_entry, MendelianEntryIterator};
use crate::variant::{SampleId, Variant};

/// Key of a persisted index entry: one sample, one batch of positions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    /// Child sample.
    pub sample: SampleId,
    /// Chromosome of the batch.
    pub chromosome: Arc<str>,
    /// First position of the batch.
    pub batch_start: u32,
}

/// Serialized per-sample index data for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleIndexEntry {
    /// Sample and batch this entry belongs to.
    pub key: EntryKey,
    /// Encoded Mendelian entries.
    pub mendelian: Vec<u8>,
    /// Parents bytes per child genotype, indexed by occurrence.
    pub parents: BTreeMap<String, Vec<u8>>,
    /// Positions where the child had discrepant calls.
    pub discrepancies: u32,
}

impl SampleIndexEntry {
    /// Iterate the Mendelian entries with their parents bytes.
    pub fn iter(&self) -> MendelianEntryIterator<'_> {
        MendelianEntryIterator::with_parents(&self.mendelian, &self.parents)
    }

    /// Number of encoded entries.
    pub fn len(&self) -> usize {
        self.parents.values().map(Vec::len).sum()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.mendelian.is_empty()
    }
}

/// Accumulates entries for one child until the next flush.
#[derive(Debug)]
pub struct SampleIndexEntryBuilder {
    sample: SampleId,
    chromosome: Arc<str>,
    batch_start: u32,
    mendelian: Vec<u8>,
    occurrences: HashMap<String, u32>,
    parents: BTreeMap<String, Vec<u8>>,
    discrepancies: u32,
}

impl SampleIndexEntryBuilder {
    /// Empty builder for `sample` positioned on a batch.
    pub fn new(sample: SampleId, chromosome: impl Into<Arc<str>>, batch_start: u32) -> Self {
        Self {
            sample,
            chromosome: chromosome.into(),
            batch_start,
            mendelian: Vec::new(),
            occurrences: HashMap::new(),
            parents: BTreeMap::new(),
            discrepancies: 0,
        }
    }

    /// Child sample.
    pub fn sample(&self) -> SampleId {
        self.sample
    }

    /// Append an entry and return its occurrence index for `genotype`.
    pub fn add(&mut self, variant: &Variant, genotype: &str, parents: u8, error_code: u8) -> u32 {
        let occurrence = match self.occurrences.get_mut(genotype) {
            Some(next) => {
                let current = *next;
                *next += 1;
                current
            }
            None => {
                self.occurrences.insert(genotype.to_string(), 1);
                0
            }
        };
        encode_entry(&mut self.mendelian, variant, genotype, occurrence, error_code);
        self.parents
            .entry(genotype.to_string())
            .or_default()
            .push(parents);
        occurrence
    }

    /// Count a position where the child had discrepant calls.
    pub fn add_discrepancy(&mut self) {
        self.discrepancies += 1;
    }

    /// Whether nothing was added since the last flush.
    pub fn is_empty(&self) -> bool {
        self.mendelian.is_empty()
    }

    /// Serialize the accumulated entries and reset for the batch starting at
    /// `chromosome:batch_start`. Returns `None` when nothing was recorded.
    pub fn flush(&mut self, chromosome: Arc<str>, batch_start: u32) -> Option<SampleIndexEntry> {
        let entry = (!self.is_empty()).then(|| SampleIndexEntry {
            key: EntryKey {
                sample: self.sample,
                chromosome: Arc::clone(&self.chromosome),
                batch_start: self.batch_start,
            },
            mendelian: std::mem::take(&mut self.mendelian),
            parents: std::mem::take(&mut self.parents),
            discrepancies: self.discrepancies,
        });
        self.mendelian.clear();
        self.parents.clear();
        self.occurrences.clear();
        self.discrepancies = 0;
        self.chromosome = chromosome;
        self.batch_start = batch_start;
        entry
    }
}
