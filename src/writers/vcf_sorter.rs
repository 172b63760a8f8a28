
use anyhow::Context;
use indexmap::IndexSet;
use log::debug;
use noodles::vcf;
use noodles::vcf::header::record::key::Other;
use noodles::vcf::header::record::Value;
use noodles::vcf::variant::io::Write;
use std::path::Path;

use crate::parsing::vcf_summary::open_vcf;

/// Re-sorts a VCF by position, e.g. after a liftover shuffled the coordinates.
/// Chromosomes stay in the order they are first seen; records at the same position keep their input order.
/// # Arguments
/// * `in_vcf_fn` - the unsorted input, plain or bgzipped
/// * `out_vcf_fn` - the sorted output, bgzipped if it ends in .gz
/// * `reference_label` - replaces the `##reference` header line when provided, e.g. with the build the records were lifted to
/// Records without a position sort to the front of their chromosome.
pub fn sort_vcf(in_vcf_fn: &Path, out_vcf_fn: &Path, reference_label: Option<&str>) -> anyhow::Result<usize> {
    let (mut vcf_reader, mut vcf_header) = open_vcf(in_vcf_fn)?;
    if let Some(label) = reference_label {
        let key: Other = "reference".parse()?;
        vcf_header.other_records_mut().shift_remove(&key);
        vcf_header.insert(key, Value::from(label.to_string()))?;
    }

    let mut chrom_order: IndexSet<String> = Default::default();
    let mut keyed_records = vec![];
    for result in vcf_reader.records() {
        let record = result
            .with_context(|| format!("Error while reading record from {in_vcf_fn:?}:"))?;
        let chrom = record.reference_sequence_name().to_string();
        let (chrom_index, _is_new) = chrom_order.insert_full(chrom);
        let position = record.variant_start()
            .transpose()
            .with_context(|| format!("Error while parsing position in {in_vcf_fn:?}:"))?
            .map(usize::from)
            .unwrap_or(0);
        keyed_records.push(((chrom_index, position), record));
    }

    // sort_by_key is stable
    keyed_records.sort_by_key(|(key, _record)| *key);

    let mut builder = vcf::io::writer::Builder::default();
    if out_vcf_fn.extension().unwrap_or_default() == "gz" {
        builder = builder.set_compression_method(vcf::io::CompressionMethod::Bgzf);
    }
    let mut vcf_writer = builder
        .build_from_path(out_vcf_fn)
        .with_context(|| format!("Error while creating {out_vcf_fn:?}:"))?;
    vcf_writer.write_header(&vcf_header)?;
    for (_key, record) in keyed_records.iter() {
        vcf_writer.write_variant_record(&vcf_header, record)
            .with_context(|| format!("Error while writing to {out_vcf_fn:?}:"))?;
    }

    debug!("Sorted {} records from {in_vcf_fn:?} into {out_vcf_fn:?}", keyed_records.len());
    Ok(keyed_records.len())
}
