
use itertools::Itertools;

use crate::data_types::build::ReferenceBuild;

/// Every domain failure the pipeline can report.
/// I/O problems are carried separately through `anyhow`, usually wrapping one of these.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("unrecognized genotype input: {message}")]
    Format { message: String },
    #[error("genotype {genotype:?} for {rsid} contains characters outside of ACGT")]
    GenotypeValidation { rsid: String, genotype: String },
    #[error("no reference build exceeded the match threshold of {threshold}; ratios: {}", format_ratios(.ratios))]
    BuildDetection { threshold: f64, ratios: Vec<(ReferenceBuild, f64)> },
    #[error("expected exactly one chromosome, found {}: [{}]", .observed.len(), .observed.join(", "))]
    ChromosomeConsistency { observed: Vec<String> },
    #[error("reference lookup failed for {chrom}:{position}: {reason}")]
    ReferenceLookup { chrom: String, position: u64, reason: String },
    #[error("could not parse DS for {variant_id}: {reason}")]
    DosageParse { variant_id: String, reason: String },
    #[error("{context}: expected {expected} values, found {observed}")]
    DimensionMismatch { context: String, expected: usize, observed: usize },
    #[error("{tool} failed: {reason}")]
    Collaborator { tool: String, reason: String }
}

impl CoreError {
    /// Short label used in structured error reports
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Format { .. } => "FormatError",
            CoreError::GenotypeValidation { .. } => "GenotypeValidationError",
            CoreError::BuildDetection { .. } => "BuildDetectionError",
            CoreError::ChromosomeConsistency { .. } => "ChromosomeConsistencyError",
            CoreError::ReferenceLookup { .. } => "ReferenceLookupError",
            CoreError::DosageParse { .. } => "DosageParseError",
            CoreError::DimensionMismatch { .. } => "DimensionMismatchError",
            CoreError::Collaborator { .. } => "CollaboratorError"
        }
    }

    /// Maps the failure onto a process exit code for the CLI
    pub fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            CoreError::Format { .. } |
            CoreError::GenotypeValidation { .. } |
            CoreError::BuildDetection { .. } |
            CoreError::ChromosomeConsistency { .. } |
            CoreError::DosageParse { .. } |
            CoreError::DimensionMismatch { .. } => exitcode::DATAERR,
            CoreError::ReferenceLookup { .. } => exitcode::NOINPUT,
            CoreError::Collaborator { .. } => exitcode::SOFTWARE
        }
    }
}

fn format_ratios(ratios: &[(ReferenceBuild, f64)]) -> String {
    ratios.iter()
        .map(|(build, ratio)| format!("{build}={ratio:.4}"))
        .join(", ")
}

/// The structured failure result written in place of a score
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorReport {
    /// Error category, e.g. "BuildDetectionError"
    pub error: String,
    /// Full message chain
    pub message: String
}

impl ErrorReport {
    /// Builds a report from any error, pulling the category out of a wrapped `CoreError` when present.
    pub fn from_error(error: &anyhow::Error) -> Self {
        let kind = error.chain()
            .find_map(|e| e.downcast_ref::<CoreError>())
            .map(|e| e.kind())
            .unwrap_or("InternalError");
        Self {
            error: kind.to_string(),
            message: format!("{error:#}")
        }
    }
}
