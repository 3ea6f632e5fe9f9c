use std::collections::BTreeSet;

use super::codec::{encode, encode_all, GenotypeCode};

/// Genotype value(s) observed for one sample at one position.
///
/// Overlapping source files can report different genotypes for the same
/// sample; those are kept as a [`CallGenotype::Discrepant`] set instead of
/// letting the last record win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallGenotype {
    /// One consistent value.
    Single(String),
    /// Two or more distinct values, sorted.
    Discrepant(BTreeSet<String>),
}

impl CallGenotype {
    /// Start from one observed value.
    pub fn single(value: impl Into<String>) -> Self {
        CallGenotype::Single(value.into())
    }

    /// Record another observation, upgrading to a discrepancy set when it differs.
    pub fn observe(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self {
            CallGenotype::Single(existing) if *existing == value => {}
            CallGenotype::Single(existing) => {
                let mut set = BTreeSet::new();
                set.insert(std::mem::take(existing));
                set.insert(value);
                *self = CallGenotype::Discrepant(set);
            }
            CallGenotype::Discrepant(set) => {
                set.insert(value);
            }
        }
    }

    /// Whether more than one distinct value was seen.
    pub fn is_discrepant(&self) -> bool {
        matches!(self, CallGenotype::Discrepant(_))
    }

    /// Every distinct value, in deterministic order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            CallGenotype::Single(value) => vec![value.as_str()],
            CallGenotype::Discrepant(set) => set.iter().map(String::as_str).collect(),
        }
    }

    /// 4-bit code for this observation.
    pub fn code(&self) -> GenotypeCode {
        match self {
            CallGenotype::Single(value) => encode(value),
            CallGenotype::Discrepant(set) => encode_all(set),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_value_stays_single() {
        let mut call = CallGenotype::single("0/1");
        call.observe("0/1");
        assert_eq!(call, CallGenotype::single("0/1"));
        assert_eq!(call.code(), GenotypeCode::HetRefUnphased);
    }

    #[test]
    fn different_values_become_discrepant() {
        let mut call = CallGenotype::single("1/1");
        call.observe("0/1");
        call.observe("1/1");
        assert!(call.is_discrepant());
        assert_eq!(call.values(), vec!["0/1", "1/1"]);
        assert_eq!(call.code(), GenotypeCode::DiscrepancySimple);
    }
}
