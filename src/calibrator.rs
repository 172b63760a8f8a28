
/*!
Standardizes imputed dosages against a population reference panel and projects them onto its principal components.
*/

use log::{debug, info};
use ndarray::Array1;

use crate::data_types::score_result::ScoreResult;
use crate::dosage_scorer::{join_dosages, RawScore};
use crate::errors::CoreError;
use crate::parsing::imputed_vcf::ImputedVariants;
use crate::parsing::population_model::PopulationReferenceModel;

/// Maximum dosage of a biallelic site, used to flip the counted allele
pub const MAX_DOSAGE: f64 = 2.0;

/// Summary of the imputation R2 values across the calibrated variants
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct R2Summary {
    pub mean: Option<f64>,
    pub median: Option<f64>
}

impl R2Summary {
    /// Computes mean and median; both are None when there are no values
    pub fn from_values(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.sort_by(|a, b| a.total_cmp(b));
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        Self {
            mean: Some(mean),
            median: Some(median)
        }
    }
}

/// Builds the final result for one chromosome (or the genome-wide model).
/// # Arguments
/// * `raw_score` - output of the dosage scorer
/// * `imputed` - the same imputed rows that were scored
/// * `model` - population reference statistics
/// * `chromosome` - label to report, "0" for genome-wide
/// # Errors
/// * `CoreError::DosageParse` if a matched row has no usable DS value
/// * `CoreError::DimensionMismatch` if the joined dosages, center, scale, and eigenvectors do not line up
/// * if the percentile model cannot be applied to the loadings
pub fn calibrate(raw_score: RawScore, imputed: &ImputedVariants, model: &PopulationReferenceModel, chromosome: &str) -> anyhow::Result<ScoreResult> {
    let joined = join_dosages(imputed, model.expected_ids().iter().map(|s| s.as_str()))?;
    debug!("Matched {} of {} population model variants", joined.len(), model.expected_ids().len());

    let checks = [
        ("center vector", model.center().len()),
        ("scale vector", model.scale().len()),
        ("eigenvector rows", model.eigenvectors().nrows())
    ];
    for (context, expected) in checks.into_iter() {
        if expected != joined.len() {
            return Err(CoreError::DimensionMismatch {
                context: format!("dosages vs. {context}"),
                expected,
                observed: joined.len()
            }.into());
        }
    }

    let r2_summary = R2Summary::from_values(
        joined.iter()
            .filter_map(|j| j.row.imputation_r2())
            .collect()
    );

    // the reference panel counts the other allele
    let flipped: Array1<f64> = joined.iter()
        .map(|j| MAX_DOSAGE - j.dosage)
        .collect();
    let standardized = (flipped - model.center()) / model.scale();
    let loadings = standardized.dot(model.eigenvectors()).to_vec();

    let mut result = ScoreResult {
        chromosome: chromosome.to_string(),
        raw_score: raw_score.score,
        loadings,
        r2mean: r2_summary.mean,
        r2median: r2_summary.median,
        variants_scored: raw_score.variants_scored,
        adjusted_score: None,
        percentile: None
    };

    if let Some(percentile_model) = model.percentile_model() {
        let (adjusted_score, percentile) = percentile_model.adjust(result.raw_score, &result.loadings)?;
        info!("Adjusted score: {adjusted_score:.4}, percentile: {percentile:.4}");
        result.adjusted_score = Some(adjusted_score);
        result.percentile = Some(percentile);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;
    use ndarray::{array, Array2};

    use crate::parsing::population_model::PercentileModel;

    fn mock_imputed(rows: &[(&str, &str)]) -> ImputedVariants {
        let text: String = rows.iter()
            .map(|(id, info)| format!("1\t100\t{id}\tA\tG\t.\tPASS\t{info}\tGT:DS\t0|1:2\n"))
            .collect();
        ImputedVariants::from_reader(text.as_bytes()).unwrap()
    }

    fn raw(score: f64) -> RawScore {
        RawScore { score, variants_scored: 1 }
    }

    #[test]
    fn test_r2_summary() {
        assert_eq!(R2Summary::from_values(vec![]), R2Summary::default());
        let summary = R2Summary::from_values(vec![0.9, 0.1, 0.5]);
        assert_approx_eq!(summary.mean.unwrap(), 0.5);
        assert_approx_eq!(summary.median.unwrap(), 0.5);
        let summary = R2Summary::from_values(vec![0.9, 0.1, 0.5, 0.7]);
        assert_approx_eq!(summary.median.unwrap(), 0.6);
    }

    #[test]
    fn test_standardization() {
        // dosage 2 flips to 0, then (0 - 1) / 0.5
        let imputed = mock_imputed(&[("rs1", "R2=0.8")]);
        let model = PopulationReferenceModel::new(
            vec!["rs1:A:G".to_string()],
            array![1.0],
            array![0.5],
            Array2::from_shape_vec((1, 2), vec![1.0, 3.0]).unwrap(),
            None
        );
        let result = calibrate(raw(0.25), &imputed, &model, "1").unwrap();
        assert_eq!(result.chromosome, "1");
        assert_eq!(result.raw_score, 0.25);
        assert_eq!(result.loadings.len(), 2);
        assert_approx_eq!(result.loadings[0], -2.0);
        assert_approx_eq!(result.loadings[1], -6.0);
        assert_eq!(result.r2mean, Some(0.8));
        assert_eq!(result.adjusted_score, None);
    }

    #[test]
    fn test_missing_r2() {
        let imputed = mock_imputed(&[("rs1", "TYPED"), ("rs2", "R2=0.4")]);
        let model = PopulationReferenceModel::new(
            vec!["rs1:A:G".to_string(), "rs2:A:G".to_string()],
            array![0.0, 0.0],
            array![1.0, 1.0],
            Array2::zeros((2, 1)),
            None
        );
        let result = calibrate(raw(0.0), &imputed, &model, "1").unwrap();
        assert_eq!(result.r2mean, Some(0.4));
        assert_eq!(result.r2median, Some(0.4));

        let imputed = mock_imputed(&[("rs1", "TYPED"), ("rs2", ".")]);
        let result = calibrate(raw(0.0), &imputed, &model, "1").unwrap();
        assert_eq!(result.r2mean, None);
        assert_eq!(result.r2median, None);
    }

    #[test]
    fn test_dimension_mismatch() {
        // the model expects two variants but only one was imputed
        let imputed = mock_imputed(&[("rs1", "R2=0.8")]);
        let model = PopulationReferenceModel::new(
            vec!["rs1:A:G".to_string(), "rs2:A:G".to_string()],
            array![1.0, 1.0],
            array![0.5, 0.5],
            Array2::zeros((2, 4)),
            None
        );
        let error = calibrate(raw(0.0), &imputed, &model, "1").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CoreError>(),
            Some(CoreError::DimensionMismatch { expected: 2, observed: 1, .. })
        ));

        // eigenvectors have the wrong number of rows
        let imputed = mock_imputed(&[("rs1", "R2=0.8"), ("rs2", "R2=0.8")]);
        let model = PopulationReferenceModel::new(
            vec!["rs1:A:G".to_string(), "rs2:A:G".to_string()],
            array![1.0, 1.0],
            array![0.5, 0.5],
            Array2::zeros((3, 4)),
            None
        );
        let error = calibrate(raw(0.0), &imputed, &model, "1").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CoreError>(),
            Some(CoreError::DimensionMismatch { expected: 3, observed: 2, .. })
        ));
    }

    #[test]
    fn test_percentile_applied() {
        let imputed = mock_imputed(&[("rs1", "R2=0.8")]);
        let model = PopulationReferenceModel::new(
            vec!["rs1:A:G".to_string()],
            array![1.0],
            array![0.5],
            Array2::from_shape_vec((1, 4), vec![1.0, 0.0, 0.0, 0.0]).unwrap(),
            Some(PercentileModel {
                mean_coefficients: vec![0.0, 1.0, 0.0, 0.0, 0.0],
                variance_coefficients: vec![1.0, 0.0, 0.0, 0.0, 0.0]
            })
        );
        // predicted mean is PC1 = -2.0, so a raw score of -2.0 is the median
        let result = calibrate(raw(-2.0), &imputed, &model, "1").unwrap();
        assert_approx_eq!(result.adjusted_score.unwrap() + 1.0, 1.0);
        assert_approx_eq!(result.percentile.unwrap(), 0.5);
    }
}
