use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Numeric identifier of a sample in the metadata store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleId(pub u32);

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric identifier of a source file that contributed calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filter value carried by records that lost an overlap conflict.
pub const SITE_CONFLICT: &str = "SiteConflict";
/// Filter value for records that passed all upstream filters.
pub const PASS: &str = "PASS";
/// Genotype written into placeholder records.
pub const NO_CALL: &str = ".";

/// Variant classes relevant to overlap resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariantKind {
    /// Single nucleotide variant.
    Snv,
    /// Multi nucleotide variant of equal length alleles.
    Mnv,
    /// Pure insertion (`start > end`).
    Insertion,
    /// Pure deletion.
    Deletion,
    /// Mixed length substitution.
    Indel,
    /// Reference block / no variant asserted.
    NoVariation,
    /// Symbolic or structural allele.
    Symbolic,
}

impl VariantKind {
    /// Infer a kind from the reference and alternate allele strings.
    pub fn infer(reference: &str, alternate: &str) -> Self {
        if alternate.starts_with('<') {
            return VariantKind::Symbolic;
        }
        match (reference.len(), alternate.len()) {
            (0, 0) => VariantKind::NoVariation,
            (0, _) => VariantKind::Insertion,
            (_, 0) => VariantKind::Deletion,
            (1, 1) => VariantKind::Snv,
            (r, a) if r == a => VariantKind::Mnv,
            _ => VariantKind::Indel,
        }
    }
}

/// Errors raised while parsing a variant string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariantParseError {
    /// Wrong number of `:` separated fields.
    #[error("variant '{0}' must have the form chrom:start:ref:alt")]
    Shape(String),
    /// Position field is not a number.
    #[error("variant '{text}' has invalid position '{position}'")]
    Position {
        /// Full variant text.
        text: String,
        /// Offending position field.
        position: String,
    },
}

/// A genomic variant with 1-based inclusive coordinates.
///
/// Insertions are anchored between `end` and `start`, so `start == end + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    /// Chromosome/contig name.
    pub chromosome: Arc<str>,
    /// First reference position covered.
    pub start: u32,
    /// Last reference position covered.
    pub end: u32,
    /// Reference allele (empty for insertions).
    pub reference: String,
    /// Alternate allele (empty for deletions).
    pub alternate: String,
    /// Variant class.
    pub kind: VariantKind,
}

impl Variant {
    /// Build a variant, inferring its end and kind from the alleles.
    pub fn new(
        chromosome: impl Into<Arc<str>>,
        start: u32,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        let reference = reference.into();
        let alternate = alternate.into();
        let kind = VariantKind::infer(&reference, &alternate);
        let end = inferred_end(start, &reference);
        Self {
            chromosome: chromosome.into(),
            start,
            end,
            reference,
            alternate,
            kind,
        }
    }

    /// Build a reference block spanning `start..=end`.
    pub fn reference_block(chromosome: impl Into<Arc<str>>, start: u32, end: u32) -> Self {
        Self {
            chromosome: chromosome.into(),
            start,
            end,
            reference: String::new(),
            alternate: String::new(),
            kind: VariantKind::NoVariation,
        }
    }

    /// Override the inferred kind.
    pub fn with_kind(mut self, kind: VariantKind) -> Self {
        self.kind = kind;
        self
    }

    /// Override the end coordinate.
    pub fn with_end(mut self, end: u32) -> Self {
        self.end = end;
        self
    }

    /// Whether the variant is a zero-length insertion anchor.
    pub fn is_insertion(&self) -> bool {
        self.start > self.end
    }

    /// Whether the variant is a reference block.
    pub fn is_no_variation(&self) -> bool {
        self.kind == VariantKind::NoVariation
    }
}

/// Last position covered by `reference` placed at `start`; `start - 1` for an
/// empty reference. Saturates at the ends of the coordinate range.
fn inferred_end(start: u32, reference: &str) -> u32 {
    match u32::try_from(reference.len()) {
        Ok(0) => start.saturating_sub(1),
        Ok(len) => start.saturating_add(len - 1),
        Err(_) => u32::MAX,
    }
}

fn allele_text(allele: &str) -> &str {
    if allele.is_empty() {
        "-"
    } else {
        allele
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_no_variation() {
            return write!(
                f,
                "{}:{}-{}:{}:.",
                self.chromosome,
                self.start,
                self.end,
                allele_text(&self.reference)
            );
        }
        write!(f, "{}:{}", self.chromosome, self.start)?;
        if self.end != inferred_end(self.start, &self.reference) {
            write!(f, "-{}", self.end)?;
        }
        write!(
            f,
            ":{}:{}",
            allele_text(&self.reference),
            allele_text(&self.alternate)
        )
    }
}

impl FromStr for Variant {
    type Err = VariantParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        // Split from the right so contig names may contain ':'.
        let mut fields = text.rsplitn(4, ':');
        let (alternate, reference, position, chromosome) =
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(a), Some(r), Some(p), Some(c)) if !c.is_empty() => (a, r, p, c),
                _ => return Err(VariantParseError::Shape(text.to_string())),
            };

        let bad_position = || VariantParseError::Position {
            text: text.to_string(),
            position: position.to_string(),
        };
        let (start, explicit_end) = match position.split_once('-') {
            Some((s, e)) => (
                s.parse::<u32>().map_err(|_| bad_position())?,
                Some(e.parse::<u32>().map_err(|_| bad_position())?),
            ),
            None => (position.parse::<u32>().map_err(|_| bad_position())?, None),
        };

        let reference = if reference == "-" { "" } else { reference };
        if alternate == "." {
            let end = explicit_end.unwrap_or_else(|| inferred_end(start, reference));
            let mut block = Variant::reference_block(chromosome, start, end);
            block.reference = reference.to_string();
            return Ok(block);
        }
        let alternate = if alternate == "-" { "" } else { alternate };
        let variant = Variant::new(chromosome, start, reference, alternate);
        Ok(match explicit_end {
            Some(end) => variant.with_end(end),
            None => variant,
        })
    }
}

/// A secondary allele of a multi-allelic call. Missing fields inherit from the primary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlternateCoordinate {
    /// Chromosome override.
    pub chromosome: Option<Arc<str>>,
    /// Start override.
    pub start: Option<u32>,
    /// End override.
    pub end: Option<u32>,
    /// Reference override.
    pub reference: Option<String>,
    /// Alternate allele.
    pub alternate: String,
    /// Kind override.
    pub kind: Option<VariantKind>,
}

impl AlternateCoordinate {
    /// Secondary allele sharing every coordinate with the primary.
    pub fn allele(alternate: impl Into<String>) -> Self {
        Self {
            alternate: alternate.into(),
            ..Self::default()
        }
    }

    /// Secondary allele with its own coordinates and alleles.
    pub fn at(start: u32, end: u32, reference: impl Into<String>, alternate: impl Into<String>) -> Self {
        let reference = reference.into();
        let alternate = alternate.into();
        let kind = VariantKind::infer(&reference, &alternate);
        Self {
            chromosome: None,
            start: Some(start),
            end: Some(end),
            reference: Some(reference),
            alternate,
            kind: Some(kind),
        }
    }
}

/// Origin of a record split out of a multi-allelic source line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginalCall {
    /// Identifier of the source site (e.g. `chr1:100:A:T,C`).
    pub variant_id: String,
    /// Index of the allele this record was derived from.
    pub allele_index: u32,
}

/// Per-file metadata attached to a call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileEntry {
    /// Source file.
    pub file_id: FileId,
    /// Multi-allelic origin, if the record was split.
    pub call: Option<OriginalCall>,
    /// FILTER column.
    pub filter: Option<String>,
    /// QUAL column; `None` for `.`.
    pub quality: Option<f64>,
}

/// Genotype and FT filter of one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGenotype {
    /// Sample the data belongs to.
    pub sample: SampleId,
    /// Raw GT string.
    pub genotype: String,
    /// Per-sample genotype filter.
    pub filter: Option<String>,
}

impl SampleGenotype {
    /// Sample data with only a genotype.
    pub fn new(sample: SampleId, genotype: impl Into<String>) -> Self {
        Self {
            sample,
            genotype: genotype.into(),
            filter: None,
        }
    }
}

/// One parsed record from the variant store reader.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCall {
    /// Primary allele.
    pub variant: Variant,
    /// Additional alleles of the same site, in file order.
    pub secondary_alternates: Vec<AlternateCoordinate>,
    /// Source file metadata.
    pub file: FileEntry,
    /// Sample genotypes.
    pub samples: Vec<SampleGenotype>,
}

impl VariantCall {
    /// Call without secondaries or sample data.
    pub fn new(variant: Variant, file_id: FileId) -> Self {
        Self {
            variant,
            secondary_alternates: Vec::new(),
            file: FileEntry {
                file_id,
                ..FileEntry::default()
            },
            samples: Vec::new(),
        }
    }

    /// Set FILTER.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.file.filter = Some(filter.into());
        self
    }

    /// Set QUAL.
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.file.quality = Some(quality);
        self
    }

    /// Set the multi-allelic origin.
    pub fn with_original_call(mut self, variant_id: impl Into<String>, allele_index: u32) -> Self {
        self.file.call = Some(OriginalCall {
            variant_id: variant_id.into(),
            allele_index,
        });
        self
    }

    /// Append a secondary alternate.
    pub fn with_secondary(mut self, alternate: AlternateCoordinate) -> Self {
        self.secondary_alternates.push(alternate);
        self
    }

    /// Append a sample genotype.
    pub fn with_sample(mut self, sample: SampleId, genotype: impl Into<String>) -> Self {
        self.samples.push(SampleGenotype::new(sample, genotype));
        self
    }

    /// Genotype filter of the first sample, if any.
    pub fn first_sample_filter(&self) -> Option<&str> {
        self.samples.first().and_then(|s| s.filter.as_deref())
    }

    /// FILTER column falling back to the first sample's FT.
    pub fn effective_filter(&self) -> Option<&str> {
        self.file
            .filter
            .as_deref()
            .or_else(|| self.first_sample_filter())
    }

    /// Start of the primary allele.
    pub fn start(&self) -> u32 {
        self.variant.start
    }

    /// End of the primary allele.
    pub fn end(&self) -> u32 {
        self.variant.end
    }
}
