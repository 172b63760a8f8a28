
use anyhow::Context;
use log::debug;
use noodles::vcf;
use std::path::Path;

use crate::errors::CoreError;

/// Opens a VCF (plain or bgzipped, based on extension) and reads past the header.
/// # Arguments
/// * `vcf_fn` - the VCF to open
pub fn open_vcf(vcf_fn: &Path) -> anyhow::Result<(vcf::io::Reader<Box<dyn std::io::BufRead>>, vcf::Header)> {
    let mut vcf_reader = vcf::io::reader::Builder::default()
        .build_from_path(vcf_fn)
        .with_context(|| format!("Error while opening {vcf_fn:?}:"))?;
    let vcf_header = vcf_reader.read_header()
        .with_context(|| format!("Error while reading header of {vcf_fn:?}:"))?;
    Ok((vcf_reader, vcf_header))
}

/// Counts the data records in a VCF
/// # Arguments
/// * `vcf_fn` - the VCF to scan
pub fn count_variants(vcf_fn: &Path) -> anyhow::Result<usize> {
    let (mut vcf_reader, _vcf_header) = open_vcf(vcf_fn)?;
    let mut count = 0;
    for result in vcf_reader.records() {
        result.with_context(|| format!("Error while reading record from {vcf_fn:?}:"))?;
        count += 1;
    }
    debug!("Found {count} records in {vcf_fn:?}");
    Ok(count)
}

/// Returns the single chromosome a VCF contains.
/// # Arguments
/// * `vcf_fn` - the VCF to scan
/// # Errors
/// * `CoreError::ChromosomeConsistency` if there are no records, or more than one chromosome
pub fn extract_chromosome(vcf_fn: &Path) -> anyhow::Result<String> {
    let (mut vcf_reader, _vcf_header) = open_vcf(vcf_fn)?;
    let mut observed: Vec<String> = vec![];
    for result in vcf_reader.records() {
        let record = result
            .with_context(|| format!("Error while reading record from {vcf_fn:?}:"))?;
        let chrom = record.reference_sequence_name();
        if observed.first().map(|c| c.as_str()) != Some(chrom) {
            observed.push(chrom.to_string());
            if observed.len() > 1 {
                // no need to scan the rest of the file
                break;
            }
        }
    }

    let chrom = single_chromosome(observed.iter().map(|c| c.as_str()))
        .with_context(|| format!("Error while checking chromosomes of {vcf_fn:?}:"))?;
    Ok(chrom)
}

/// Collapses a stream of chromosome labels into its one distinct value.
/// Stops consuming at the first label that differs from the first one.
/// # Errors
/// * `CoreError::ChromosomeConsistency` if the stream is empty or contains two labels
pub fn single_chromosome<'a, I: IntoIterator<Item = &'a str>>(chroms: I) -> Result<String, CoreError> {
    let mut iter = chroms.into_iter();
    let first = iter.next()
        .ok_or_else(|| CoreError::ChromosomeConsistency { observed: vec![] })?;
    match iter.find(|&c| c != first) {
        Some(other) => Err(CoreError::ChromosomeConsistency {
            observed: vec![first.to_string(), other.to_string()]
        }),
        None => Ok(first.to_string())
    }
}
