use std::sync::Arc;

use crate::variant::{VariantCall, VariantKind};

/// Flattened view of one allele of a call, used for overlap math.
///
/// Equality and ordering consider position, alleles and kind, so two calls
/// that report the same allele produce equal alternates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alternate {
    /// Chromosome/contig name.
    pub chromosome: Arc<str>,
    /// First covered position.
    pub start: u32,
    /// Last covered position (`start - 1` for insertions).
    pub end: u32,
    /// Reference allele.
    pub reference: String,
    /// Alternate allele.
    pub alternate: String,
    /// Variant class.
    pub kind: VariantKind,
}

impl Alternate {
    /// The primary allele of `call`.
    pub fn primary(call: &VariantCall) -> Self {
        let v = &call.variant;
        Self {
            chromosome: Arc::clone(&v.chromosome),
            start: v.start,
            end: v.end,
            reference: v.reference.clone(),
            alternate: v.alternate.clone(),
            kind: v.kind,
        }
    }

    /// The primary allele followed by every secondary alternate.
    /// Secondary coordinates fall back to the primary's values when unset.
    pub fn expand(call: &VariantCall) -> Vec<Alternate> {
        let primary = Self::primary(call);
        let mut alternates = Vec::with_capacity(1 + call.secondary_alternates.len());
        for secondary in &call.secondary_alternates {
            alternates.push(Alternate {
                chromosome: secondary
                    .chromosome
                    .clone()
                    .unwrap_or_else(|| Arc::clone(&primary.chromosome)),
                start: secondary.start.unwrap_or(primary.start),
                end: secondary.end.unwrap_or(primary.end),
                reference: secondary
                    .reference
                    .clone()
                    .unwrap_or_else(|| primary.reference.clone()),
                alternate: secondary.alternate.clone(),
                kind: secondary.kind.unwrap_or(primary.kind),
            });
        }
        alternates.insert(0, primary);
        alternates
    }

    /// Zero-length insertion anchor.
    pub fn is_insertion(&self) -> bool {
        self.start > self.end
    }

    /// Largest position this alternate can reach; bounds the grouping sweep.
    pub(crate) fn reach(&self) -> u32 {
        self.start.max(self.end)
    }

    /// Whether two alternates claim the same genomic positions.
    ///
    /// An insertion only conflicts with an interval that contains both of its
    /// anchor positions. Two insertions conflict only at the same anchor.
    pub fn conflicts_with(&self, other: &Alternate) -> bool {
        if self.chromosome != other.chromosome {
            return false;
        }
        match (self.is_insertion(), other.is_insertion()) {
            (false, false) => self.start <= other.end && other.start <= self.end,
            (true, false) => insertion_covered(self, other),
            (false, true) => insertion_covered(other, self),
            (true, true) => self.start == other.start && self.end == other.end,
        }
    }
}

fn insertion_covered(insertion: &Alternate, interval: &Alternate) -> bool {
    let covers = |position: u32| interval.start <= position && position <= interval.end;
    covers(insertion.start) && covers(insertion.end)
}

/// Whether any allele of `a` conflicts with any allele of `b`.
pub fn calls_conflict(a: &VariantCall, b: &VariantCall) -> bool {
    let left = Alternate::expand(a);
    let right = Alternate::expand(b);
    left.iter()
        .any(|x| right.iter().any(|y| x.conflicts_with(y)))
}
