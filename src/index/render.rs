use anyhow::{anyhow, Context, Result};
use std::io::Write;

use super::entry::SampleIndexEntry;

const HEADER: &str = "#SAMPLE\tCHROM\tBATCH\tVARIANT\tGT\tOCCURRENCE\tERROR\tPARENTS\n";

/// Write decoded entries as a tab-separated table, one row per Mendelian entry.
pub fn write_entries<W: Write>(writer: &mut W, entries: &[SampleIndexEntry]) -> Result<()> {
    writer.write_all(HEADER.as_bytes())?;

    for entry in entries {
        for decoded in entry.iter() {
            let decoded = decoded.with_context(|| {
                format!(
                    "decoding entry of sample {} at {}:{}",
                    entry.key.sample, entry.key.chromosome, entry.key.batch_start
                )
            })?;
            let parents = decoded
                .parents
                .map_or_else(|| ".".to_string(), |byte| format!("{byte:02x}"));
            let line = format!(
                "{sample}\t{chrom}\t{batch}\t{variant}\t{gt}\t{occurrence}\t{error}\t{parents}\n",
                sample = entry.key.sample,
                chrom = entry.key.chromosome,
                batch = entry.key.batch_start,
                variant = decoded.variant,
                gt = decoded.genotype,
                occurrence = decoded.occurrence,
                error = decoded.error_code,
            );
            writer.write_all(line.as_bytes())?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Render entries into a string (useful for tests and snapshots).
pub fn render_entries(entries: &[SampleIndexEntry]) -> Result<String> {
    let mut buffer = Vec::new();
    write_entries(&mut buffer, entries)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered entries are not valid UTF-8"))
}
