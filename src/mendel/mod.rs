//! Mendelian-consistency rules for father/mother/child triples.
//!
//! Codes follow the usual trio conventions: 0 is consistent, 1..=8 are
//! autosomal (or diploid sex chromosome) inconsistencies, 9..=12 cover
//! hemizygous X/Y children and 13 covers mitochondrial inheritance.

mod ploidy;

pub use ploidy::ChromosomeClass;

use crate::genotype::{Genotype, GenotypeError};

/// Child genotype agrees with the parents.
pub const CONSISTENT: u8 = 0;
/// Heterozygous child, both parents homozygous reference.
pub const HET_CHILD_HOM_REF_PARENTS: u8 = 1;
/// Heterozygous child whose alleles the parents cannot provide.
pub const HET_CHILD: u8 = 2;
/// Homozygous reference child, father lacks the reference allele.
pub const HOM_REF_FATHER: u8 = 3;
/// Homozygous reference child, mother lacks the reference allele.
pub const HOM_REF_MOTHER: u8 = 4;
/// Homozygous reference child, neither parent carries the reference allele.
pub const HOM_REF_BOTH: u8 = 5;
/// Homozygous alternate child, father lacks the allele.
pub const HOM_ALT_FATHER: u8 = 6;
/// Homozygous alternate child, mother lacks the allele.
pub const HOM_ALT_MOTHER: u8 = 7;
/// Homozygous alternate child, neither parent carries the allele.
pub const HOM_ALT_BOTH: u8 = 8;
/// Hemizygous X child with an alternate allele the mother lacks.
pub const X_ALT_MOTHER: u8 = 9;
/// Hemizygous X child with a reference allele the mother lacks.
pub const X_REF_MOTHER: u8 = 10;
/// Y child with an alternate allele the father lacks.
pub const Y_ALT_FATHER: u8 = 11;
/// Y child with a reference allele the father lacks.
pub const Y_REF_FATHER: u8 = 12;
/// Mitochondrial allele absent in the mother.
pub const MT_MOTHER: u8 = 13;

/// Compute the Mendelian error code of `child` given its parents.
///
/// `None` parents are unknown and can provide any allele; missing alleles in
/// any genotype behave the same way.
pub fn mendelian_error(
    father: Option<&Genotype>,
    mother: Option<&Genotype>,
    child: &Genotype,
    chromosome: &str,
) -> u8 {
    let father = Parent::from(father);
    let mother = Parent::from(mother);
    match ChromosomeClass::of(chromosome) {
        ChromosomeClass::Mitochondrial => mitochondrial(&mother, child),
        ChromosomeClass::X if child.is_haploid() => {
            hemizygous(&mother, child, X_REF_MOTHER, X_ALT_MOTHER)
        }
        ChromosomeClass::Y if child.is_haploid() => {
            hemizygous(&father, child, Y_REF_FATHER, Y_ALT_FATHER)
        }
        _ => autosomal(&father, &mother, child),
    }
}

/// String form of [`mendelian_error`]. Unknown markers (`?/?`, empty) on a
/// parent mean "any allele"; on the child they make the triple consistent.
pub fn mendelian_error_str(
    father: Option<&str>,
    mother: Option<&str>,
    child: &str,
    chromosome: &str,
) -> Result<u8, GenotypeError> {
    let father = parse_parent(father)?;
    let mother = parse_parent(mother)?;
    let Some(child) = Genotype::parse_call(child)? else {
        return Ok(CONSISTENT);
    };
    Ok(mendelian_error(father.as_ref(), mother.as_ref(), &child, chromosome))
}

fn parse_parent(genotype: Option<&str>) -> Result<Option<Genotype>, GenotypeError> {
    match genotype {
        Some(text) => Genotype::parse_call(text),
        None => Ok(None),
    }
}

enum Parent<'a> {
    Any,
    Known(&'a Genotype),
}

impl<'a> From<Option<&'a Genotype>> for Parent<'a> {
    fn from(genotype: Option<&'a Genotype>) -> Self {
        match genotype {
            Some(gt) if !gt.has_missing() => Parent::Known(gt),
            _ => Parent::Any,
        }
    }
}

impl Parent<'_> {
    fn provides(&self, allele: u32) -> bool {
        match self {
            Parent::Any => true,
            Parent::Known(gt) => gt.carries(allele),
        }
    }

    fn is_hom_ref(&self) -> bool {
        match self {
            Parent::Any => false,
            Parent::Known(gt) => gt.called().all(|a| a == 0),
        }
    }
}

fn autosomal(father: &Parent<'_>, mother: &Parent<'_>, child: &Genotype) -> u8 {
    if child.has_missing() {
        return CONSISTENT;
    }
    let alleles: Vec<u32> = child.called().collect();
    match alleles.as_slice() {
        [allele] => {
            if father.provides(*allele) || mother.provides(*allele) {
                CONSISTENT
            } else {
                homozygous_code(*allele, true, true)
            }
        }
        [a, b] if a == b => {
            let father_lacks = !father.provides(*a);
            let mother_lacks = !mother.provides(*a);
            if father_lacks || mother_lacks {
                homozygous_code(*a, father_lacks, mother_lacks)
            } else {
                CONSISTENT
            }
        }
        [a, b] => {
            let ordered = father.provides(*a) && mother.provides(*b);
            let swapped = father.provides(*b) && mother.provides(*a);
            if ordered || swapped {
                CONSISTENT
            } else if father.is_hom_ref() && mother.is_hom_ref() {
                HET_CHILD_HOM_REF_PARENTS
            } else {
                HET_CHILD
            }
        }
        // Polyploid calls are not checked.
        _ => CONSISTENT,
    }
}

fn homozygous_code(allele: u32, father_lacks: bool, mother_lacks: bool) -> u8 {
    let base = if allele == 0 { HOM_REF_FATHER } else { HOM_ALT_FATHER };
    match (father_lacks, mother_lacks) {
        (true, true) => base + 2,
        (true, false) => base,
        _ => base + 1,
    }
}

fn hemizygous(parent: &Parent<'_>, child: &Genotype, ref_code: u8, alt_code: u8) -> u8 {
    match child.alleles() {
        [Some(allele)] if !parent.provides(*allele) => {
            if *allele == 0 {
                ref_code
            } else {
                alt_code
            }
        }
        _ => CONSISTENT,
    }
}

fn mitochondrial(mother: &Parent<'_>, child: &Genotype) -> u8 {
    if child.called().all(|allele| mother.provides(allele)) {
        CONSISTENT
    } else {
        MT_MOTHER
    }
}
