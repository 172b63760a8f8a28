
use serde::{Deserialize, Serialize};

/// The reportable outcome of scoring one chromosome (or the genome-wide model).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Chromosome label, or "0" for the genome-wide model
    #[serde(rename = "chr")]
    pub chromosome: String,
    /// Raw weighted dosage sum
    #[serde(rename = "prs")]
    pub raw_score: f64,
    /// Projection of the standardized dosages onto the population eigenvectors
    pub loadings: Vec<f64>,
    /// Mean imputation R2 across the variants used for calibration
    pub r2mean: Option<f64>,
    /// Median imputation R2 across the variants used for calibration
    pub r2median: Option<f64>,
    /// Number of weighted variants found in the imputed file
    pub variants_scored: usize,
    /// Score after removing the ancestry-predicted mean and variance, if a model was provided
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub adjusted_score: Option<f64>,
    /// Standard-normal percentile of `adjusted_score`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub percentile: Option<f64>
}
