use std::fmt;

use super::allele::{is_unknown_marker, Genotype};

/// 4-bit genotype category stored in the parents byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum GenotypeCode {
    /// `0/0`
    HomRefUnphased = 0,
    /// `0/1` or `1/0`
    HetRefUnphased = 1,
    /// `1/1`
    HomAltUnphased = 2,
    /// `0|0`
    HomRefPhased = 3,
    /// `0|1`
    HetRef01Phased = 4,
    /// `1|0`
    HetRef10Phased = 5,
    /// `1|1`
    HomAltPhased = 6,
    /// `0`
    HemiRef = 7,
    /// `1`
    HemiAlt = 8,
    /// Homozygous for a secondary alternate, e.g. `2/2`.
    MultiHom = 9,
    /// Heterozygous involving a secondary alternate, e.g. `1/2`.
    MultiHet = 10,
    /// Every allele missing, e.g. `./.`.
    MissingHom = 11,
    /// Some alleles missing, e.g. `./1`.
    MissingHet = 12,
    /// Unknown or unparseable.
    Unknown = 13,
    /// Discrepant calls, none involving reference or ambiguous codes.
    DiscrepancySimple = 14,
    /// Discrepant calls involving reference or ambiguous codes.
    DiscrepancyAny = 15,
}

impl GenotypeCode {
    /// Every code in numeric order.
    pub const ALL: [GenotypeCode; 16] = [
        GenotypeCode::HomRefUnphased,
        GenotypeCode::HetRefUnphased,
        GenotypeCode::HomAltUnphased,
        GenotypeCode::HomRefPhased,
        GenotypeCode::HetRef01Phased,
        GenotypeCode::HetRef10Phased,
        GenotypeCode::HomAltPhased,
        GenotypeCode::HemiRef,
        GenotypeCode::HemiAlt,
        GenotypeCode::MultiHom,
        GenotypeCode::MultiHet,
        GenotypeCode::MissingHom,
        GenotypeCode::MissingHet,
        GenotypeCode::Unknown,
        GenotypeCode::DiscrepancySimple,
        GenotypeCode::DiscrepancyAny,
    ];

    /// Numeric value (0..=15).
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Code for a numeric value; only the low nibble is considered.
    pub fn from_nibble(value: u8) -> Self {
        Self::ALL[(value & 0x0F) as usize]
    }

    /// Whether the code stands for more than one literal genotype.
    pub fn is_ambiguous(self) -> bool {
        self >= GenotypeCode::MultiHom
    }
}

impl fmt::Display for GenotypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match decode(*self) {
            Some(genotype) => f.write_str(genotype),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Encode a GT string. Never fails: anything unparseable is [`GenotypeCode::Unknown`].
pub fn encode(genotype: &str) -> GenotypeCode {
    if is_unknown_marker(genotype) {
        return GenotypeCode::Unknown;
    }
    match genotype.parse::<Genotype>() {
        Ok(parsed) => encode_parsed(&parsed),
        Err(_) => GenotypeCode::Unknown,
    }
}

/// Encode an optional GT string; `None` is unknown.
pub fn encode_opt(genotype: Option<&str>) -> GenotypeCode {
    genotype.map_or(GenotypeCode::Unknown, encode)
}

/// Encode a parsed genotype.
pub fn encode_parsed(genotype: &Genotype) -> GenotypeCode {
    use GenotypeCode::*;

    if genotype.is_all_missing() {
        return MissingHom;
    }
    if genotype.has_missing() {
        return MissingHet;
    }
    let alleles: Vec<u32> = genotype.called().collect();
    match alleles.as_slice() {
        [0] => HemiRef,
        [1] => HemiAlt,
        [_] => MultiHom,
        [a, b] if *a <= 1 && *b <= 1 => match (genotype.is_phased(), *a, *b) {
            (false, 0, 0) => HomRefUnphased,
            (false, 1, 1) => HomAltUnphased,
            (false, _, _) => HetRefUnphased,
            (true, 0, 0) => HomRefPhased,
            (true, 0, 1) => HetRef01Phased,
            (true, 1, 0) => HetRef10Phased,
            (true, _, _) => HomAltPhased,
        },
        [first, rest @ ..] => {
            if rest.iter().all(|allele| allele == first) {
                MultiHom
            } else {
                MultiHet
            }
        }
        [] => Unknown,
    }
}

/// Encode the set of genotypes observed for one sample at one position.
///
/// A single value delegates to [`encode`]; several values are a discrepancy.
pub fn encode_all<I, S>(genotypes: I) -> GenotypeCode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let codes: Vec<GenotypeCode> = genotypes
        .into_iter()
        .map(|g| encode(g.as_ref()))
        .collect();
    match codes.as_slice() {
        [] => GenotypeCode::Unknown,
        [single] => *single,
        many => {
            let any = many.iter().any(|code| {
                matches!(code, GenotypeCode::HomRefUnphased | GenotypeCode::HomRefPhased)
                    || code.is_ambiguous()
            });
            if any {
                GenotypeCode::DiscrepancyAny
            } else {
                GenotypeCode::DiscrepancySimple
            }
        }
    }
}

/// Canonical GT string for a code. Ambiguous codes yield a representative
/// member; discrepancy codes have no string form.
pub fn decode(code: GenotypeCode) -> Option<&'static str> {
    use GenotypeCode::*;

    match code {
        HomRefUnphased => Some("0/0"),
        HetRefUnphased => Some("0/1"),
        HomAltUnphased => Some("1/1"),
        HomRefPhased => Some("0|0"),
        HetRef01Phased => Some("0|1"),
        HetRef10Phased => Some("1|0"),
        HomAltPhased => Some("1|1"),
        HemiRef => Some("0"),
        HemiAlt => Some("1"),
        MultiHom => Some("2/2"),
        MultiHet => Some("1/2"),
        MissingHom => Some("./."),
        MissingHet => Some("./1"),
        Unknown => Some("?/?"),
        DiscrepancySimple | DiscrepancyAny => None,
    }
}

/// Pack father (high nibble) and mother (low nibble) codes into one byte.
pub fn join(father: GenotypeCode, mother: GenotypeCode) -> u8 {
    (father.as_u8() << 4) | mother.as_u8()
}

/// Inverse of [`join`].
pub fn split(parents: u8) -> (GenotypeCode, GenotypeCode) {
    (decode_father(parents), decode_mother(parents))
}

/// Father code of a parents byte.
pub fn decode_father(parents: u8) -> GenotypeCode {
    GenotypeCode::from_nibble(parents >> 4)
}

/// Mother code of a parents byte.
pub fn decode_mother(parents: u8) -> GenotypeCode {
    GenotypeCode::from_nibble(parents)
}
