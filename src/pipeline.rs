
/*!
End-to-end orchestration: array export to build-correct VCF, and imputed VCF to calibrated score.
*/

use anyhow::Context;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::allele_resolver::resolve_record;
use crate::build_detector::detect_build;
use crate::calibrator::calibrate;
use crate::collaborators::CollaboratorConfig;
use crate::collaborators::imputation::{impute, ImputationRequest};
use crate::collaborators::liftover::{liftover, LiftoverRequest};
use crate::collaborators::phasing::{phase, PhasingRequest};
use crate::data_types::build::ReferenceBuild;
use crate::data_types::genotype::GenotypeRecord;
use crate::data_types::score_result::ScoreResult;
use crate::dosage_scorer::score_dosages;
use crate::parsing::genotype_input::load_genotype_lines;
use crate::parsing::genotype_parser::{GenotypeDialect, GenotypeParser};
use crate::parsing::imputed_vcf::ImputedVariants;
use crate::parsing::population_model::PopulationReferenceModel;
use crate::parsing::reference_index::IndexedFasta;
use crate::parsing::vcf_summary::{count_variants, extract_chromosome, single_chromosome};
use crate::parsing::weights::SnpWeightTable;
use crate::reference_layout::ReferenceLayout;
use crate::writers::noodles_idx::{compress_and_index, index_vcf};
use crate::writers::vcf_sorter::sort_vcf;
use crate::writers::vcf_writer::VariantWriter;

/// Summary of a genotype conversion
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversionSummary {
    /// Vendor dialect of the export
    pub dialect: GenotypeDialect,
    /// Build the export was generated against
    pub source_build: ReferenceBuild,
    /// Whitelist match ratio, if the build was detected rather than provided
    pub match_ratio: Option<f64>,
    /// Genotype records that passed validation
    pub records_parsed: usize,
    /// Records written after multi-allelic and duplicate-site removal
    pub variants_written: usize,
    /// Records in the final VCF, which can drop during liftover
    pub variants_final: usize,
    /// The output VCF, in target build coordinates
    pub vcf_fn: PathBuf
}

/// Converts an array export into a VCF in target build coordinates.
/// # Arguments
/// * `genotype_fn` - the raw export, plain or gzipped
/// * `layout` - reference bundle
/// * `build_hint` - skips detection when provided
/// * `out_vcf_fn` - the output VCF
/// * `scratch` - holds the pre-liftover VCF and the liftover outputs
/// * `config` - liftover tool settings
/// # Errors
/// * `CoreError::Format` if the export is not a known dialect
/// * `CoreError::ChromosomeConsistency` if detection is needed and the export covers more than one chromosome
/// * `CoreError::BuildDetection` if no build passes the whitelist threshold
/// * `CoreError::ReferenceLookup` if a site is not in the reference
/// * `CoreError::Collaborator` if the liftover fails
pub fn convert_genotypes(
    genotype_fn: &Path,
    layout: &ReferenceLayout,
    build_hint: Option<ReferenceBuild>,
    out_vcf_fn: &Path,
    scratch: &ScratchSpace,
    config: &CollaboratorConfig
) -> anyhow::Result<ConversionSummary> {
    info!("Loading genotypes from {genotype_fn:?}...");
    let lines = load_genotype_lines(genotype_fn)?;
    let parser = GenotypeParser::new(lines.iter())?;
    let dialect = parser.dialect();
    let records: Vec<GenotypeRecord> = parser.collect::<Result<_, _>>()?;
    info!("Parsed {} {dialect} genotype records from {} data lines", records.len(), lines.len());

    let (source_build, match_ratio) = match build_hint {
        Some(build) => {
            info!("Using provided build {build}");
            (build, None)
        },
        None => {
            // whitelists are per-chromosome
            let chrom = single_chromosome(records.iter().map(|r| r.chrom()))
                .context("Error while selecting build detection whitelists:")?;
            let (build, ratio) = detect_build(lines.iter(), &layout.build_candidates(&chrom))?;
            (build, Some(ratio))
        }
    };

    // resolve against the build the data came from; liftover takes it the rest of the way
    let needs_liftover = source_build.requires_liftover();
    let resolved_fn = if needs_liftover {
        scratch.path().join("source.vcf")
    } else {
        out_vcf_fn.to_path_buf()
    };

    let fasta_fn = layout.fasta(source_build);
    info!("Resolving alleles against {fasta_fn:?}...");
    let mut fasta = IndexedFasta::open_with_default_index(&fasta_fn)?;
    let mut writer = VariantWriter::new(&resolved_fn, &source_build.to_string())?;
    let mut multi_allelic = 0;
    for record in records.iter() {
        match resolve_record(record, &mut fasta)? {
            Some(variant) => { writer.write_variant(&variant)?; },
            None => multi_allelic += 1
        };
    }
    let (variants_written, duplicates) = writer.finish()?;
    info!("Wrote {variants_written} variants; dropped {multi_allelic} multi-allelic sites and {duplicates} duplicate sites");

    let variants_final = if needs_liftover {
        lift_to_target(source_build, &resolved_fn, out_vcf_fn, layout, scratch, config)?
    } else {
        variants_written
    };

    Ok(ConversionSummary {
        dialect,
        source_build,
        match_ratio,
        records_parsed: records.len(),
        variants_written,
        variants_final,
        vcf_fn: out_vcf_fn.to_path_buf()
    })
}

/// Runs the liftover, then sorts the result into the final output under the target build label
fn lift_to_target(
    source_build: ReferenceBuild,
    source_vcf_fn: &Path,
    out_vcf_fn: &Path,
    layout: &ReferenceLayout,
    scratch: &ScratchSpace,
    config: &CollaboratorConfig
) -> anyhow::Result<usize> {
    let chain_fn = layout.chain_to_target(source_build)
        .with_context(|| format!("No chain file for {source_build}"))?;
    let target_fasta = layout.fasta(ReferenceBuild::TARGET);
    // CrossMap puts its .unmap and log next to this
    let lifted_fn = scratch.path().join("lifted.vcf");

    info!("Lifting {source_build} coordinates over to {}...", ReferenceBuild::TARGET);
    let request = LiftoverRequest {
        chain: &chain_fn,
        in_vcf: source_vcf_fn,
        target_fasta: &target_fasta,
        out_vcf: &lifted_fn
    };
    liftover(&request, config)?;

    let target_label = ReferenceBuild::TARGET.to_string();
    let num_sorted = sort_vcf(&lifted_fn, out_vcf_fn, Some(target_label.as_str()))?;
    info!("Kept {num_sorted} variants after liftover");
    Ok(num_sorted)
}

/// Scores an imputed VCF for one chromosome, or with the genome-wide model for "0".
/// # Arguments
/// * `imputed_fn` - minimac4 output
/// * `layout` - reference bundle holding weights and population tables
/// * `chrom` - selects the weights and population model
/// # Errors
/// * `CoreError::DosageParse` if a matched row has no usable DS value
/// * `CoreError::DimensionMismatch` if the population tables do not line up with the data
pub fn score_imputed(imputed_fn: &Path, layout: &ReferenceLayout, chrom: &str) -> anyhow::Result<ScoreResult> {
    info!("Loading imputed dosages from {imputed_fn:?}...");
    let imputed = ImputedVariants::from_path(imputed_fn)?;

    let weights_fn = layout.weights(chrom);
    let weights = SnpWeightTable::from_path(&weights_fn, layout.weight_column())?;
    let raw_score = score_dosages(&imputed, &weights)
        .with_context(|| format!("Error while scoring {imputed_fn:?} with {weights_fn:?}:"))?;
    info!("Raw score: {} from {} variants", raw_score.score, raw_score.variants_scored);

    let model_files = layout.population_model(chrom);
    debug!("Population model files: {model_files:?}");
    let model = PopulationReferenceModel::from_files(&model_files)?;
    let result = calibrate(raw_score, &imputed, &model, chrom)
        .with_context(|| format!("Error while calibrating {imputed_fn:?}:"))?;
    Ok(result)
}

/// Scratch space for one request; either a temporary folder or a kept one for debugging
pub enum ScratchSpace {
    Temporary(tempfile::TempDir),
    Kept(PathBuf)
}

impl ScratchSpace {
    /// Creates a unique temporary folder, or uses (and creates) the provided folder
    pub fn new(keep_folder: Option<&Path>) -> anyhow::Result<Self> {
        match keep_folder {
            Some(folder) => {
                std::fs::create_dir_all(folder)
                    .with_context(|| format!("Error while creating {folder:?}:"))?;
                Ok(ScratchSpace::Kept(folder.to_path_buf()))
            },
            None => {
                let temp_dir = tempfile::Builder::new()
                    .prefix("meerkat_")
                    .tempdir()
                    .context("Error while creating scratch folder:")?;
                Ok(ScratchSpace::Temporary(temp_dir))
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ScratchSpace::Temporary(temp_dir) => temp_dir.path(),
            ScratchSpace::Kept(folder) => folder
        }
    }
}

/// Runs the full pipeline from an array export to a calibrated score.
/// # Arguments
/// * `genotype_fn` - the raw export, plain or gzipped
/// * `layout` - reference bundle
/// * `build_hint` - skips detection when provided
/// * `scratch` - per-request working folder
/// * `config` - external tool settings
pub fn run_pipeline(
    genotype_fn: &Path,
    layout: &ReferenceLayout,
    build_hint: Option<ReferenceBuild>,
    scratch: &ScratchSpace,
    config: &CollaboratorConfig
) -> anyhow::Result<ScoreResult> {
    let scratch_path = scratch.path();
    debug!("Scratch folder: {scratch_path:?}");

    let input_vcf = scratch_path.join("input.vcf");
    let summary = convert_genotypes(genotype_fn, layout, build_hint, &input_vcf, scratch, config)?;
    if summary.variants_final == 0 {
        warn!("No variants survived conversion");
    }
    debug!("Converted VCF has {} records", count_variants(&input_vcf)?);

    let chrom = extract_chromosome(&input_vcf)?;
    info!("Chromosome found: {chrom}");
    let input_gz = compress_and_index(&input_vcf)?;

    let phased_prefix = scratch_path.join("phased");
    let phasing_panel = layout.phasing_panel();
    let genetic_map = layout.genetic_map();
    let phased_vcf = phase(&PhasingRequest {
        target_vcf: &input_gz,
        reference_panel: &phasing_panel,
        genetic_map: &genetic_map,
        chrom: &chrom,
        out_prefix: &phased_prefix
    }, config)?;
    index_vcf(&phased_vcf)?;

    let imputation_panel = layout.imputation_panel(&chrom);
    let imputed_vcf = impute(&ImputationRequest {
        phased_vcf: &phased_vcf,
        reference_panel: &imputation_panel,
        out_vcf: &scratch_path.join("imputed.vcf.gz"),
        empirical_vcf: &scratch_path.join("empiricalDosage.vcf.gz")
    }, config)?;

    score_imputed(&imputed_vcf, layout, &chrom)
}
