use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::index::{EntryKey, SampleIndexEntry};
use crate::variant::{Region, VariantCall};

/// Errors reported by a variant source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The region cannot be served.
    #[error("cannot read {region}: {reason}")]
    Read {
        /// Requested region.
        region: String,
        /// Reason given by the source.
        reason: String,
    },
}

/// Errors reported by an index sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The output location refused the write.
    #[error("cannot write to '{output}': {reason}")]
    Write {
        /// Output location.
        output: String,
        /// Reason given by the sink.
        reason: String,
    },
}

/// Reader over stored variant calls.
pub trait VariantSource: Send + Sync {
    /// Chromosomes with the last position that holds data.
    fn chromosomes(&self) -> Result<Vec<(Arc<str>, u32)>, SourceError>;

    /// Calls whose start lies in `region`, ordered by start then end.
    fn calls(&self, region: &Region) -> Result<Vec<VariantCall>, SourceError>;
}

/// Destination for finished index entries.
pub trait IndexSink: Send + Sync {
    /// Store `entries` under `output`, replacing entries with the same key.
    fn write(&self, output: &str, entries: &[SampleIndexEntry]) -> Result<(), SinkError>;
}

/// [`VariantSource`] over calls held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVariantSource {
    calls: BTreeMap<Arc<str>, Vec<VariantCall>>,
}

impl InMemoryVariantSource {
    /// Index `calls` by chromosome and position.
    pub fn new<I: IntoIterator<Item = VariantCall>>(calls: I) -> Self {
        let mut by_chromosome: BTreeMap<Arc<str>, Vec<VariantCall>> = BTreeMap::new();
        for call in calls {
            by_chromosome
                .entry(Arc::clone(&call.variant.chromosome))
                .or_default()
                .push(call);
        }
        for calls in by_chromosome.values_mut() {
            calls.sort_by_key(|call| (call.start(), call.end()));
        }
        Self {
            calls: by_chromosome,
        }
    }
}

impl VariantSource for InMemoryVariantSource {
    fn chromosomes(&self) -> Result<Vec<(Arc<str>, u32)>, SourceError> {
        Ok(self
            .calls
            .iter()
            .map(|(chromosome, calls)| {
                let last = calls
                    .iter()
                    .map(|call| call.start().max(call.end()))
                    .max()
                    .unwrap_or(1);
                (Arc::clone(chromosome), last)
            })
            .collect())
    }

    fn calls(&self, region: &Region) -> Result<Vec<VariantCall>, SourceError> {
        let Some(calls) = self.calls.get(&region.chromosome) else {
            return Ok(Vec::new());
        };
        let first = calls.partition_point(|call| call.start() < region.start);
        Ok(calls[first..]
            .iter()
            .take_while(|call| call.start() <= region.end)
            .cloned()
            .collect())
    }
}

/// [`IndexSink`] keeping entries in memory, per output location.
#[derive(Debug, Default)]
pub struct InMemoryIndexSink {
    outputs: Mutex<BTreeMap<String, BTreeMap<EntryKey, SampleIndexEntry>>>,
}

impl InMemoryIndexSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries stored under `output`, in key order.
    pub fn entries(&self, output: &str) -> Vec<SampleIndexEntry> {
        match self.outputs.lock() {
            Ok(outputs) => outputs
                .get(output)
                .map(|entries| entries.values().cloned().collect())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

impl IndexSink for InMemoryIndexSink {
    fn write(&self, output: &str, entries: &[SampleIndexEntry]) -> Result<(), SinkError> {
        let mut outputs = self.outputs.lock().map_err(|_| SinkError::Write {
            output: output.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        let stored = outputs.entry(output.to_string()).or_default();
        for entry in entries {
            stored.insert(entry.key.clone(), entry.clone());
        }
        Ok(())
    }
}
