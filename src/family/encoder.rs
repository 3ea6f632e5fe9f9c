use std::ops::AddAssign;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::calls::PositionCalls;
use super::trio::Trio;
use crate::config::batch_start;
use crate::genotype::{encode_opt, join, CallGenotype, Genotype, GenotypeCode};
use crate::index::{is_field_safe, SampleIndexEntry, SampleIndexEntryBuilder};
use crate::mendel::{mendelian_error, CONSISTENT};
use crate::variant::{SampleId, Variant};

/// Genotype assumed for a sample with no call at a position.
pub const HOM_REF_DEFAULT: &str = "0/0";

/// A trio plus how its parents' absence should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrioContext {
    /// The trio.
    pub trio: Trio,
    /// Parents were loaded from different files than the child, so a parent
    /// without a call is unknown rather than homozygous reference.
    pub parents_in_other_files: bool,
}

impl TrioContext {
    /// Context with the homozygous-reference default.
    pub fn new(trio: Trio) -> Self {
        Self {
            trio,
            parents_in_other_files: false,
        }
    }

    /// Set whether the parents come from other files.
    pub fn with_parents_in_other_files(mut self, flag: bool) -> Self {
        self.parents_in_other_files = flag;
        self
    }

    fn parent_default(&self) -> Option<&'static str> {
        (!self.parents_in_other_files).then_some(HOM_REF_DEFAULT)
    }
}

impl From<Trio> for TrioContext {
    fn from(trio: Trio) -> Self {
        Self::new(trio)
    }
}

/// Counters collected while encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderStats {
    /// Positions processed.
    pub positions: u64,
    /// Entries appended.
    pub entries: u64,
    /// Entries with a non-zero error code.
    pub mendelian_errors: u64,
    /// Genotype combinations skipped because a value did not parse.
    pub malformed_genotypes: u64,
    /// Child positions with more than one distinct call.
    pub discrepancies: u64,
    /// Positions skipped because the variant text would break the entry framing.
    pub unencodable_variants: u64,
}

impl AddAssign for EncoderStats {
    fn add_assign(&mut self, other: Self) {
        self.positions += other.positions;
        self.entries += other.entries;
        self.mendelian_errors += other.mendelian_errors;
        self.malformed_genotypes += other.malformed_genotypes;
        self.discrepancies += other.discrepancies;
        self.unencodable_variants += other.unencodable_variants;
    }
}

/// Streams positions for a set of trios and builds one entry per child and batch.
///
/// Positions must arrive sorted by chromosome and start; a change of either
/// chromosome or batch flushes every child's pending entry.
#[derive(Debug)]
pub struct TrioMendelianEncoder {
    trios: Vec<TrioContext>,
    builders: Vec<SampleIndexEntryBuilder>,
    batch_size: u32,
    current: Option<(Arc<str>, u32)>,
    flushed: Vec<SampleIndexEntry>,
    stats: EncoderStats,
}

impl TrioMendelianEncoder {
    /// Encoder for `trios`, flushing on `batch_size` boundaries.
    pub fn new<I, T>(trios: I, batch_size: u32) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TrioContext>,
    {
        let trios: Vec<TrioContext> = trios.into_iter().map(Into::into).collect();
        let builders = trios
            .iter()
            .map(|context| SampleIndexEntryBuilder::new(context.trio.child, "", 0))
            .collect();
        Self {
            trios,
            builders,
            batch_size: batch_size.max(1),
            current: None,
            flushed: Vec::new(),
            stats: EncoderStats::default(),
        }
    }

    /// Trios handled by this encoder.
    pub fn trios(&self) -> &[TrioContext] {
        &self.trios
    }

    /// Counters so far.
    pub fn stats(&self) -> EncoderStats {
        self.stats
    }

    /// Encode every trio at one position.
    pub fn process(&mut self, calls: &PositionCalls) {
        let variant = calls.variant();
        if !variant_is_field_safe(variant) {
            debug!(
                chromosome = %variant.chromosome,
                start = variant.start,
                "variant cannot be indexed"
            );
            self.stats.unencodable_variants += 1;
            return;
        }
        let batch = batch_start(variant.start, self.batch_size);
        let same_batch = matches!(
            &self.current,
            Some((chromosome, start)) if **chromosome == *variant.chromosome && *start == batch
        );
        if !same_batch {
            self.flush_to(Arc::clone(&variant.chromosome), batch);
        }

        self.stats.positions += 1;
        for (context, builder) in self.trios.iter().zip(self.builders.iter_mut()) {
            encode_trio(context, builder, calls, &mut self.stats);
        }
    }

    /// Emit pending entries without moving to a new batch.
    pub fn flush(&mut self) {
        if let Some((chromosome, start)) = self.current.clone() {
            self.flush_to(chromosome, start);
        }
    }

    /// Flush and return every entry built so far with the counters.
    #[instrument(level = "debug", skip_all, fields(trios = self.trios.len()))]
    pub fn finish(mut self) -> (Vec<SampleIndexEntry>, EncoderStats) {
        self.flush();
        debug!(
            entries = self.flushed.len(),
            positions = self.stats.positions,
            mendelian_errors = self.stats.mendelian_errors,
            "trio encoding finished"
        );
        (self.flushed, self.stats)
    }

    fn flush_to(&mut self, chromosome: Arc<str>, batch: u32) {
        for builder in &mut self.builders {
            if let Some(entry) = builder.flush(Arc::clone(&chromosome), batch) {
                self.flushed.push(entry);
            }
        }
        self.current = Some((chromosome, batch));
    }
}

/// Genotype strings to test for one parent, plus its code for the parents byte.
fn parent_values<'c>(
    context: &TrioContext,
    parent: Option<SampleId>,
    calls: &'c PositionCalls,
) -> (Vec<Option<&'c str>>, GenotypeCode) {
    let Some(parent) = parent else {
        return (vec![None], GenotypeCode::MissingHom);
    };
    match calls.get(parent) {
        Some(call) => (call.values().into_iter().map(Some).collect(), call.code()),
        None => {
            let default = context.parent_default();
            (vec![default], encode_opt(default))
        }
    }
}

fn encode_trio(
    context: &TrioContext,
    builder: &mut SampleIndexEntryBuilder,
    calls: &PositionCalls,
    stats: &mut EncoderStats,
) {
    let trio = &context.trio;
    let child_call = calls.get(trio.child);
    if child_call.is_some_and(CallGenotype::is_discrepant) {
        builder.add_discrepancy();
        stats.discrepancies += 1;
    }
    let child_values = child_call.map_or_else(|| vec![HOM_REF_DEFAULT], CallGenotype::values);

    let (fathers, father_code) = parent_values(context, trio.father, calls);
    let (mothers, mother_code) = parent_values(context, trio.mother, calls);
    let parents = join(father_code, mother_code);
    let variant = calls.variant();

    for child in child_values {
        if !is_field_safe(child) {
            stats.malformed_genotypes += 1;
            continue;
        }
        let Some(code) = best_code(variant, &fathers, &mothers, child, stats) else {
            continue;
        };
        if child_call.is_none() && code == CONSISTENT {
            continue;
        }
        builder.add(variant, child, parents, code);
        stats.entries += 1;
        if code != CONSISTENT {
            stats.mendelian_errors += 1;
        }
    }
}

/// Lowest error over every parent combination; consistent if any combination is.
fn best_code(
    variant: &Variant,
    fathers: &[Option<&str>],
    mothers: &[Option<&str>],
    child: &str,
    stats: &mut EncoderStats,
) -> Option<u8> {
    let child = match Genotype::parse_call(child) {
        Ok(Some(child)) => child,
        Ok(None) => return Some(CONSISTENT),
        Err(_) => {
            stats.malformed_genotypes += 1;
            return None;
        }
    };
    let mut best = None;
    for father in fathers {
        for mother in mothers {
            let (Ok(father), Ok(mother)) = (parse_parent(*father), parse_parent(*mother)) else {
                stats.malformed_genotypes += 1;
                continue;
            };
            let code = mendelian_error(father.as_ref(), mother.as_ref(), &child, &variant.chromosome);
            best = Some(match best {
                Some(current) => lowest_error(current, code),
                None => code,
            });
        }
    }
    best
}

fn variant_is_field_safe(variant: &Variant) -> bool {
    is_field_safe(&variant.chromosome)
        && is_field_safe(&variant.reference)
        && is_field_safe(&variant.alternate)
}

fn parse_parent(genotype: Option<&str>) -> Result<Option<Genotype>, crate::genotype::GenotypeError> {
    genotype.map_or(Ok(None), Genotype::parse_call)
}

fn lowest_error(a: u8, b: u8) -> u8 {
    if a == CONSISTENT || b == CONSISTENT {
        CONSISTENT
    } else {
        a.min(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::split;
    use crate::mendel::{HET_CHILD_HOM_REF_PARENTS, HOM_REF_BOTH};

    const DAD: SampleId = SampleId(1);
    const MUM: SampleId = SampleId(2);
    const KID: SampleId = SampleId(3);

    fn snv(start: u32) -> Variant {
        Variant::new("1", start, "A", "T")
    }

    fn decoded(entries: &[SampleIndexEntry]) -> Vec<(String, u8, Option<u8>)> {
        entries
            .iter()
            .flat_map(SampleIndexEntry::iter)
            .map(|entry| {
                let entry = entry.expect("decodes");
                (entry.genotype, entry.error_code, entry.parents)
            })
            .collect()
    }

    #[test]
    fn de_novo_het_is_an_error() {
        let mut encoder = TrioMendelianEncoder::new([Trio::new(DAD, MUM, KID)], 1_000);
        encoder.process(&PositionCalls::new(snv(100)).with(KID, "0/1"));
        let (entries, stats) = encoder.finish();

        assert_eq!(
            decoded(&entries),
            vec![("0/1".to_string(), HET_CHILD_HOM_REF_PARENTS, Some(0x00))]
        );
        assert_eq!(stats.mendelian_errors, 1);
    }

    #[test]
    fn uncalled_child_is_emitted_only_on_error() {
        let mut encoder = TrioMendelianEncoder::new([Trio::new(DAD, MUM, KID)], 1_000);
        encoder.process(&PositionCalls::new(snv(100)).with(DAD, "0/1"));
        encoder.process(
            &PositionCalls::new(snv(200))
                .with(DAD, "1/1")
                .with(MUM, "1/1"),
        );
        let (entries, stats) = encoder.finish();

        let decoded = decoded(&entries);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].0, HOM_REF_DEFAULT);
        assert_eq!(decoded[0].1, HOM_REF_BOTH);
        assert_eq!(stats.positions, 2);
    }

    #[test]
    fn parents_in_other_files_default_to_unknown() {
        let trio = TrioContext::new(Trio::new(DAD, MUM, KID)).with_parents_in_other_files(true);
        let mut encoder = TrioMendelianEncoder::new([trio], 1_000);
        encoder.process(&PositionCalls::new(snv(100)).with(KID, "0/1"));
        let (entries, _) = encoder.finish();

        let decoded = decoded(&entries);
        assert_eq!(decoded[0].1, CONSISTENT);
        let parents = decoded[0].2.expect("parents byte");
        assert_eq!(split(parents), (GenotypeCode::Unknown, GenotypeCode::Unknown));
    }

    #[test]
    fn batch_change_flushes_entries() {
        let mut encoder = TrioMendelianEncoder::new([Trio::new(DAD, MUM, KID)], 1_000);
        encoder.process(&PositionCalls::new(snv(100)).with(KID, "0/1"));
        encoder.process(&PositionCalls::new(snv(1_100)).with(KID, "0/1"));
        encoder.process(&PositionCalls::new(Variant::new("2", 5, "A", "T")).with(KID, "0/1"));
        let (entries, _) = encoder.finish();

        let keys: Vec<(&str, u32)> = entries
            .iter()
            .map(|entry| (&*entry.key.chromosome, entry.key.batch_start))
            .collect();
        assert_eq!(keys, vec![("1", 0), ("1", 1_000), ("2", 0)]);
    }

    #[test]
    fn malformed_child_genotype_is_skipped() {
        let mut encoder = TrioMendelianEncoder::new([Trio::new(DAD, MUM, KID)], 1_000);
        encoder.process(&PositionCalls::new(snv(100)).with(KID, "0/x"));
        let (entries, stats) = encoder.finish();
        assert!(entries.is_empty());
        assert_eq!(stats.malformed_genotypes, 1);
    }
}
