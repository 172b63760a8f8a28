
/*!
Detects the reference build of an array export by matching its loci against per-build whitelists.
*/

use log::{debug, info};
use rustc_hash::FxHashSet as HashSet;

use crate::data_types::build::{BuildCandidate, ReferenceBuild};
use crate::errors::CoreError;
use crate::parsing::locus_whitelist::LocusWhitelist;

/// The fraction of input loci that must be whitelisted for a build to be accepted; strictly greater-than
pub const MATCH_THRESHOLD: f64 = 0.9;

/// Builds the `rsid:chrom:pos` key for a raw, tab-delimited data line.
/// The text is used as-is from the export, so the position stays 1-based and the chromosome is not normalized.
/// Returns None if the line has fewer than 3 columns.
pub fn raw_locus_key(line: &str) -> Option<String> {
    let mut columns = line.trim().split('\t');
    let rsid = columns.next()?;
    let chrom = columns.next()?;
    let position = columns.next()?;
    Some(format!("{rsid}:{chrom}:{position}"))
}

/// Collects the unique locus keys from a set of data lines
pub fn collect_locus_keys<I, S>(lines: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>
{
    lines.into_iter()
        .filter_map(|l| raw_locus_key(l.as_ref()))
        .collect()
}

/// Fraction of the input keys present in the whitelist; 0.0 if there are no input keys
pub fn match_ratio(input_keys: &HashSet<String>, whitelist: &LocusWhitelist) -> f64 {
    if input_keys.is_empty() {
        0.0
    } else {
        whitelist.count_matches(input_keys) as f64 / input_keys.len() as f64
    }
}

/// Tries each candidate in order and returns the first build whose match ratio exceeds the threshold.
/// Whitelists are only loaded for the candidates that actually get evaluated.
/// # Arguments
/// * `lines` - raw data lines of the export
/// * `candidates` - builds to try, in priority order
/// # Errors
/// * `CoreError::BuildDetection` if no candidate passes, carrying every ratio that was computed
/// * if a whitelist fails to load
pub fn detect_build<I, S>(lines: I, candidates: &[BuildCandidate]) -> anyhow::Result<(ReferenceBuild, f64)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>
{
    let input_keys = collect_locus_keys(lines);
    debug!("Collected {} unique locus keys for build detection", input_keys.len());

    let mut ratios = Vec::with_capacity(candidates.len());
    for candidate in candidates.iter() {
        let whitelist = LocusWhitelist::from_path(&candidate.whitelist_path)?;
        let ratio = match_ratio(&input_keys, &whitelist);
        debug!("Match ratio for {}: {ratio:.4}", candidate.build);
        if ratio > MATCH_THRESHOLD {
            info!("Detected build {} with match ratio {ratio:.4}", candidate.build);
            return Ok((candidate.build, ratio));
        }
        ratios.push((candidate.build, ratio));
    }

    Err(CoreError::BuildDetection {
        threshold: MATCH_THRESHOLD,
        ratios
    }.into())
}
