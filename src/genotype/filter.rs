use bitvec::prelude::*;

use super::codec::{decode_father, decode_mother, encode, GenotypeCode};

/// Set of genotype codes used to select entries by their parents byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentGenotypeFilter {
    codes: BitVec,
}

impl ParentGenotypeFilter {
    /// Filter accepting nothing.
    pub fn empty() -> Self {
        Self {
            codes: bitvec![0; GenotypeCode::ALL.len()],
        }
    }

    /// Filter accepting the codes of the given GT strings.
    pub fn from_genotypes<I, S>(genotypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::empty();
        for genotype in genotypes {
            filter.insert(encode(genotype.as_ref()));
        }
        filter
    }

    /// Accept an additional code.
    pub fn insert(&mut self, code: GenotypeCode) {
        self.codes.set(code.as_u8() as usize, true);
    }

    /// Whether `code` is accepted.
    pub fn matches(&self, code: GenotypeCode) -> bool {
        self.codes[code.as_u8() as usize]
    }

    /// Whether the father half of a parents byte is accepted.
    pub fn matches_father(&self, parents: u8) -> bool {
        self.matches(decode_father(parents))
    }

    /// Whether the mother half of a parents byte is accepted.
    pub fn matches_mother(&self, parents: u8) -> bool {
        self.matches(decode_mother(parents))
    }

    /// Accepted codes in numeric order.
    pub fn codes(&self) -> Vec<GenotypeCode> {
        self.codes
            .iter_ones()
            .map(|index| GenotypeCode::from_nibble(index as u8))
            .collect()
    }

    /// True when no ambiguous code is selected, so a match is exact and no
    /// further genotype check is needed.
    pub fn is_fully_covered(&self) -> bool {
        self.codes.iter_ones().all(|index| index < GenotypeCode::MultiHom.as_u8() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::join;

    #[test]
    fn matches_selected_parent_codes() {
        let filter = ParentGenotypeFilter::from_genotypes(["0/1", "1/1"]);
        let parents = join(GenotypeCode::HetRefUnphased, GenotypeCode::HomRefUnphased);
        assert!(filter.matches_father(parents));
        assert!(!filter.matches_mother(parents));
        assert_eq!(
            filter.codes(),
            vec![GenotypeCode::HetRefUnphased, GenotypeCode::HomAltUnphased]
        );
        assert!(filter.is_fully_covered());
    }

    #[test]
    fn ambiguous_codes_are_not_fully_covered() {
        let filter = ParentGenotypeFilter::from_genotypes(["0/1", "1/2"]);
        assert!(!filter.is_fully_covered());
        assert!(ParentGenotypeFilter::empty().is_fully_covered());
    }
}
