mod common;

use common::{call, snv, DAD, KID, MUM};
use trio_index::family::EncoderStats;
use trio_index::genotype::{split, GenotypeCode};
use trio_index::index::MendelianEntry;
use trio_index::mendel::{HET_CHILD_HOM_REF_PARENTS, HOM_ALT_BOTH, HOM_ALT_MOTHER, X_ALT_MOTHER};
use trio_index::{PositionCalls, SampleIndexEntry, Trio, TrioMendelianEncoder, Variant};

fn encode(trio: Trio, calls: &[trio_index::VariantCall]) -> (Vec<SampleIndexEntry>, EncoderStats) {
    let mut encoder = TrioMendelianEncoder::new([trio], 1_000_000);
    for position in PositionCalls::from_calls(calls) {
        encoder.process(&position);
    }
    encoder.finish()
}

fn decoded(entries: &[SampleIndexEntry]) -> Vec<MendelianEntry> {
    entries
        .iter()
        .flat_map(SampleIndexEntry::iter)
        .collect::<Result<Vec<_>, _>>()
        .expect("entries decode")
}

#[test]
fn missing_father_is_checked_against_mother_only() {
    let trio = Trio::partial(None, Some(MUM), KID);
    let calls = [call(snv("1", 100, "T"), 1, &[(MUM, "0/1"), (KID, "1/1")])];

    let (entries, stats) = encode(trio, &calls);
    let decoded = decoded(&entries);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].genotype, "1/1");
    assert_eq!(decoded[0].error_code, 0);
    assert_eq!(decoded[0].parents, Some(0xB1));
    assert_eq!(
        split(0xB1),
        (GenotypeCode::MissingHom, GenotypeCode::HetRefUnphased)
    );
    assert_eq!(stats.malformed_genotypes, 0);
}

#[test]
fn inconsistent_triple_is_flagged() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [call(
        snv("1", 100, "T"),
        1,
        &[(DAD, "0/0"), (MUM, "0/0"), (KID, "1/1")],
    )];

    let (entries, stats) = encode(trio, &calls);
    let decoded = decoded(&entries);
    assert_eq!(decoded[0].error_code, HOM_ALT_BOTH);
    assert_eq!(stats.mendelian_errors, 1);
}

#[test]
fn discrepant_child_emits_one_entry_per_value() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(snv("1", 100, "T"), 1, &[(DAD, "0/0"), (MUM, "0/0"), (KID, "0/1")]),
        call(snv("1", 100, "T"), 2, &[(KID, "1/1")]),
    ];

    let (entries, stats) = encode(trio, &calls);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].discrepancies, 1);
    let codes: Vec<(String, u8)> = decoded(&entries)
        .into_iter()
        .map(|entry| (entry.genotype, entry.error_code))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("0/1".to_string(), HET_CHILD_HOM_REF_PARENTS),
            ("1/1".to_string(), HOM_ALT_BOTH),
        ]
    );
    assert_eq!(stats.discrepancies, 1);
}

#[test]
fn discrepant_parent_is_consistent_if_any_value_explains_the_child() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(snv("1", 100, "T"), 1, &[(DAD, "0/0"), (MUM, "0/0"), (KID, "0/1")]),
        call(snv("1", 100, "T"), 2, &[(DAD, "1/1")]),
    ];

    let (entries, _) = encode(trio, &calls);
    let decoded = decoded(&entries);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].error_code, 0);
    let (father, mother) = split(decoded[0].parents.expect("parents byte"));
    assert_eq!(father, GenotypeCode::DiscrepancyAny);
    assert_eq!(mother, GenotypeCode::HomRefUnphased);
}

#[test]
fn discrepant_father_and_child_take_the_best_combination_per_child_value() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(snv("1", 100, "T"), 1, &[(DAD, "0/0"), (MUM, "0/0"), (KID, "0/1")]),
        call(snv("1", 100, "T"), 2, &[(DAD, "1/1"), (KID, "1/1")]),
    ];

    let (entries, stats) = encode(trio, &calls);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].discrepancies, 1);
    let decoded = decoded(&entries);
    let codes: Vec<(&str, u32, u8)> = decoded
        .iter()
        .map(|entry| (entry.genotype.as_str(), entry.occurrence, entry.error_code))
        .collect();
    // 0/1 is explained by 1/1 x 0/0; 1/1 always lacks a maternal alt.
    assert_eq!(codes, vec![("0/1", 0, 0), ("1/1", 0, HOM_ALT_MOTHER)]);
    for entry in &decoded {
        let (father, mother) = split(entry.parents.expect("parents byte"));
        assert_eq!(father, GenotypeCode::DiscrepancyAny);
        assert_eq!(mother, GenotypeCode::HomRefUnphased);
    }
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.mendelian_errors, 1);
    assert_eq!(stats.malformed_genotypes, 0);
}

#[test]
fn malformed_value_in_a_discrepant_parent_skips_only_that_combination() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(snv("1", 100, "T"), 1, &[(DAD, "0/0"), (MUM, "0/0"), (KID, "0/1")]),
        call(snv("1", 100, "T"), 2, &[(DAD, "0/z")]),
        call(snv("1", 200, "T"), 1, &[(DAD, "0/z"), (MUM, "0/0"), (KID, "0/1")]),
        call(snv("1", 200, "T"), 2, &[(DAD, "1/y")]),
    ];

    let (entries, stats) = encode(trio, &calls);
    let decoded = decoded(&entries);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].variant.start, 100);
    assert_eq!(decoded[0].error_code, HET_CHILD_HOM_REF_PARENTS);
    assert_eq!(stats.malformed_genotypes, 3);
    assert_eq!(stats.entries, 1);
}

#[test]
fn genotype_with_framing_bytes_is_not_written() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(snv("1", 100, "T"), 1, &[(KID, "?\t7")]),
        call(snv("1", 200, "T"), 1, &[(KID, "0/1\n")]),
        call(snv("1", 300, "T"), 1, &[(KID, "?/?")]),
    ];

    let (entries, stats) = encode(trio, &calls);
    let decoded = decoded(&entries);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].genotype, "?/?");
    assert_eq!(decoded[0].occurrence, 0);
    assert_eq!(stats.malformed_genotypes, 2);
}

#[test]
fn variant_with_framing_bytes_is_skipped() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(Variant::new("chr\t1", 100, "A", "T"), 1, &[(KID, "0/1")]),
        call(snv("1", 100, "T"), 1, &[(KID, "0/1")]),
    ];

    let (entries, stats) = encode(trio, &calls);
    assert_eq!(entries.len(), 1);
    assert_eq!(&*entries[0].key.chromosome, "1");
    assert_eq!(stats.unencodable_variants, 1);
}

#[test]
fn hemizygous_x_child_checks_mother() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [call(
        Variant::new("X", 5_000, "A", "G"),
        1,
        &[(DAD, "1"), (MUM, "0/0"), (KID, "1")],
    )];

    let (entries, _) = encode(trio, &calls);
    assert_eq!(decoded(&entries)[0].error_code, X_ALT_MOTHER);
}

#[test]
fn malformed_genotypes_are_counted_not_fatal() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(snv("1", 100, "T"), 1, &[(DAD, "0/z"), (KID, "0/1")]),
        call(snv("1", 200, "T"), 1, &[(KID, "0/1")]),
    ];

    let (entries, stats) = encode(trio, &calls);
    let decoded = decoded(&entries);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].variant.start, 200);
    assert_eq!(stats.malformed_genotypes, 1);
    assert_eq!(stats.positions, 2);
}

#[test]
fn entries_are_grouped_per_batch() {
    let trio = Trio::new(DAD, MUM, KID);
    let calls = [
        call(snv("1", 999_999, "T"), 1, &[(KID, "0/1")]),
        call(snv("1", 1_000_000, "T"), 1, &[(KID, "0/1")]),
        call(snv("1", 1_000_001, "C"), 1, &[(KID, "0/1")]),
    ];

    let (entries, _) = encode(trio, &calls);
    let batches: Vec<(u32, usize)> = entries
        .iter()
        .map(|entry| (entry.key.batch_start, entry.len()))
        .collect();
    assert_eq!(batches, vec![(0, 1), (1_000_000, 2)]);
    let second = decoded(&entries[1..]);
    assert_eq!(second[0].occurrence, 0);
    assert_eq!(second[1].occurrence, 1);
}
