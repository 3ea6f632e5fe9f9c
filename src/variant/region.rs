use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while parsing a region string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegionParseError {
    /// Empty chromosome name.
    #[error("region '{0}' has no chromosome")]
    MissingChromosome(String),
    /// Bounds are not numbers or are reversed.
    #[error("region '{0}' has invalid bounds")]
    Bounds(String),
}

/// Inclusive genomic key range `chromosome:start-end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region {
    /// Chromosome/contig name.
    pub chromosome: Arc<str>,
    /// First position (1-based).
    pub start: u32,
    /// Last position (inclusive).
    pub end: u32,
}

impl Region {
    /// Construct a region.
    pub fn new(chromosome: impl Into<Arc<str>>, start: u32, end: u32) -> Self {
        Self {
            chromosome: chromosome.into(),
            start,
            end,
        }
    }

    /// Whole chromosome.
    pub fn whole_chromosome(chromosome: impl Into<Arc<str>>) -> Self {
        Self::new(chromosome, 1, u32::MAX)
    }

    /// Whether `position` on `chromosome` falls inside this region.
    pub fn contains(&self, chromosome: &str, position: u32) -> bool {
        &*self.chromosome == chromosome && self.start <= position && position <= self.end
    }

    /// Intersection with another region on the same chromosome.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        if self.chromosome != other.chromosome {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then(|| Region::new(Arc::clone(&self.chromosome), start, end))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let Some((chromosome, bounds)) = text.rsplit_once(':') else {
            if text.is_empty() {
                return Err(RegionParseError::MissingChromosome(text.to_string()));
            }
            return Ok(Region::whole_chromosome(text));
        };
        if chromosome.is_empty() {
            return Err(RegionParseError::MissingChromosome(text.to_string()));
        }
        let bad = || RegionParseError::Bounds(text.to_string());
        let (start, end) = match bounds.split_once('-') {
            Some((s, e)) => (
                s.parse::<u32>().map_err(|_| bad())?,
                e.parse::<u32>().map_err(|_| bad())?,
            ),
            None => {
                let position = bounds.parse::<u32>().map_err(|_| bad())?;
                (position, position)
            }
        };
        if start > end {
            return Err(bad());
        }
        Ok(Region::new(chromosome, start, end))
    }
}
