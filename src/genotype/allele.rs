use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing a GT string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenotypeError {
    /// The allele list could not be parsed.
    #[error("malformed genotype '{genotype}'")]
    Malformed {
        /// Offending genotype string.
        genotype: String,
    },
}

impl GenotypeError {
    fn malformed(genotype: &str) -> Self {
        GenotypeError::Malformed {
            genotype: genotype.to_string(),
        }
    }
}

/// Parsed allele list of a GT string. `None` alleles are missing (`.`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genotype {
    alleles: Vec<Option<u32>>,
    phased: bool,
}

impl Genotype {
    /// Build a genotype from explicit alleles.
    pub fn new(alleles: Vec<Option<u32>>, phased: bool) -> Self {
        Self { alleles, phased }
    }

    /// Parse a call, treating empty and `?` genotypes as unknown rather than malformed.
    pub fn parse_call(text: &str) -> Result<Option<Genotype>, GenotypeError> {
        if is_unknown_marker(text) {
            return Ok(None);
        }
        text.parse().map(Some)
    }

    /// Allele indices in call order.
    pub fn alleles(&self) -> &[Option<u32>] {
        &self.alleles
    }

    /// Whether the alleles are phased (`|`).
    pub fn is_phased(&self) -> bool {
        self.phased
    }

    /// Number of alleles.
    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    /// Whether a single allele is present.
    pub fn is_haploid(&self) -> bool {
        self.alleles.len() == 1
    }

    /// Whether any allele is missing.
    pub fn has_missing(&self) -> bool {
        self.alleles.iter().any(Option::is_none)
    }

    /// Whether every allele is missing.
    pub fn is_all_missing(&self) -> bool {
        self.alleles.iter().all(Option::is_none)
    }

    /// Called alleles, skipping missing ones.
    pub fn called(&self) -> impl Iterator<Item = u32> + '_ {
        self.alleles.iter().flatten().copied()
    }

    /// Whether `allele` is carried.
    pub fn carries(&self, allele: u32) -> bool {
        self.called().any(|a| a == allele)
    }
}

pub(crate) fn is_unknown_marker(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.contains('?')
}

impl FromStr for Genotype {
    type Err = GenotypeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(GenotypeError::malformed(text));
        }
        let phased = trimmed.contains('|');
        if phased && trimmed.contains('/') {
            return Err(GenotypeError::malformed(text));
        }
        let alleles = trimmed
            .split(|c| c == '/' || c == '|')
            .map(|allele| match allele {
                "." => Ok(None),
                value => value
                    .parse::<u32>()
                    .map(Some)
                    .map_err(|_| GenotypeError::malformed(text)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Genotype { alleles, phased })
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.phased { "|" } else { "/" };
        for (i, allele) in self.alleles.iter().enumerate() {
            if i > 0 {
                f.write_str(separator)?;
            }
            match allele {
                Some(index) => write!(f, "{index}")?,
                None => f.write_str(".")?,
            }
        }
        Ok(())
    }
}
