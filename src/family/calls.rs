use std::collections::{BTreeMap, HashMap};

use crate::genotype::CallGenotype;
use crate::variant::{SampleId, Variant, VariantCall};

/// Every sample's genotype(s) at one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCalls {
    variant: Variant,
    genotypes: HashMap<SampleId, CallGenotype>,
}

impl PositionCalls {
    /// No samples observed yet.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            genotypes: HashMap::new(),
        }
    }

    /// Variant these calls refer to.
    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Record a genotype for `sample`; differing repeats become a discrepancy.
    pub fn observe(&mut self, sample: SampleId, genotype: impl Into<String>) {
        let genotype = genotype.into();
        match self.genotypes.get_mut(&sample) {
            Some(existing) => existing.observe(genotype),
            None => {
                self.genotypes.insert(sample, CallGenotype::single(genotype));
            }
        }
    }

    /// Builder form of [`PositionCalls::observe`].
    pub fn with(mut self, sample: SampleId, genotype: impl Into<String>) -> Self {
        self.observe(sample, genotype);
        self
    }

    /// Genotype(s) of `sample`, if it was called here.
    pub fn get(&self, sample: SampleId) -> Option<&CallGenotype> {
        self.genotypes.get(&sample)
    }

    /// Number of samples with a call.
    pub fn len(&self) -> usize {
        self.genotypes.len()
    }

    /// Whether no sample was called.
    pub fn is_empty(&self) -> bool {
        self.genotypes.is_empty()
    }

    /// Group per-file records by variant, ordered by chromosome then position.
    /// Reference blocks carry no alternate allele and are skipped.
    pub fn from_calls<'a, I>(calls: I) -> Vec<PositionCalls>
    where
        I: IntoIterator<Item = &'a VariantCall>,
    {
        let mut grouped: BTreeMap<(&'a str, u32, u32, &'a str, &'a str), PositionCalls> =
            BTreeMap::new();
        for call in calls {
            if call.variant.is_no_variation() {
                continue;
            }
            let variant = &call.variant;
            let key = (
                &*variant.chromosome,
                variant.start,
                variant.end,
                variant.reference.as_str(),
                variant.alternate.as_str(),
            );
            let position = grouped
                .entry(key)
                .or_insert_with(|| PositionCalls::new(variant.clone()));
            for sample in &call.samples {
                position.observe(sample.sample, sample.genotype.clone());
            }
        }
        grouped.into_values().collect()
    }
}
