
use anyhow::{anyhow, ensure, Context};
use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::path::{Path, PathBuf};

use crate::parsing::Table;
use crate::util::json_io::load_json;

/// Column holding the `ID:REF:ALT` keys in the population map
pub const MAP_ID_COLUMN: &str = "ID";
/// Number of principal components the percentile model regresses on
pub const PERCENTILE_COMPONENTS: usize = 4;

/// Locations of the tables that make up one population reference model
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopulationModelFiles {
    /// Ordered list of expected variant ids
    pub map_fn: PathBuf,
    /// Per-variant centering values
    pub center_fn: PathBuf,
    /// Label of the value column in `center_fn`
    pub center_column: String,
    /// Per-variant scaling values
    pub scale_fn: PathBuf,
    /// Label of the value column in `scale_fn`
    pub scale_column: String,
    /// Eigenvector matrix, one row per variant and one column per component
    pub eigenvector_fn: PathBuf,
    /// Optional percentile calibration coefficients (JSON)
    pub percentile_fn: Option<PathBuf>
}

/// Regression of the raw score on the first principal components of the reference panel.
/// Both coefficient vectors are ordered as (intercept, PC1, PC2, PC3, PC4).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PercentileModel {
    /// Predicts the expected score for a given ancestry
    pub mean_coefficients: Vec<f64>,
    /// Predicts the expected squared residual for a given ancestry
    pub variance_coefficients: Vec<f64>
}

impl PercentileModel {
    /// Checks that both coefficient vectors are the expected length
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.mean_coefficients.len() == PERCENTILE_COMPONENTS + 1,
            "mean_coefficients must have {} values, found {}", PERCENTILE_COMPONENTS + 1, self.mean_coefficients.len()
        );
        ensure!(
            self.variance_coefficients.len() == PERCENTILE_COMPONENTS + 1,
            "variance_coefficients must have {} values, found {}", PERCENTILE_COMPONENTS + 1, self.variance_coefficients.len()
        );
        Ok(())
    }

    /// Removes the ancestry-predicted mean and variance from a raw score.
    /// Returns the adjusted score and its standard-normal percentile.
    /// # Arguments
    /// * `raw_score` - the weighted dosage sum
    /// * `loadings` - the sample's projection onto the reference panel PCs
    /// # Errors
    /// * if there are fewer than 4 loadings
    /// * if the predicted variance is not positive
    pub fn adjust(&self, raw_score: f64, loadings: &[f64]) -> anyhow::Result<(f64, f64)> {
        ensure!(
            loadings.len() >= PERCENTILE_COMPONENTS,
            "Percentile calibration requires {PERCENTILE_COMPONENTS} loadings, found {}", loadings.len()
        );

        // add the constant term up front
        let design: Vec<f64> = std::iter::once(1.0)
            .chain(loadings[..PERCENTILE_COMPONENTS].iter().copied())
            .collect();
        let dot = |coefficients: &[f64]| -> f64 {
            coefficients.iter().zip(design.iter()).map(|(c, x)| c * x).sum()
        };

        let predicted_mean = dot(&self.mean_coefficients);
        let predicted_variance = dot(&self.variance_coefficients);
        ensure!(predicted_variance > 0.0, "Predicted score variance must be positive, found {predicted_variance}");

        let adjusted_score = (raw_score - predicted_mean) / predicted_variance.sqrt();
        let standard_normal = Normal::new(0.0, 1.0)
            .map_err(|e| anyhow!("Error while building normal distribution: {e}"))?;
        Ok((adjusted_score, standard_normal.cdf(adjusted_score)))
    }
}

/// Population reference statistics used to standardize and project dosages
#[derive(Clone, Debug)]
pub struct PopulationReferenceModel {
    /// Expected `ID:REF:ALT` keys, in the order of the other vectors
    expected_ids: Vec<String>,
    /// Per-variant centering values
    center: Array1<f64>,
    /// Per-variant scaling values
    scale: Array1<f64>,
    /// Eigenvectors, variants x components
    eigenvectors: Array2<f64>,
    /// Optional percentile calibration
    percentile_model: Option<PercentileModel>
}

impl PopulationReferenceModel {
    /// Constructor; vector lengths are intentionally not checked here, calibration does that.
    pub fn new(
        expected_ids: Vec<String>,
        center: Array1<f64>,
        scale: Array1<f64>,
        eigenvectors: Array2<f64>,
        percentile_model: Option<PercentileModel>
    ) -> Self {
        Self {
            expected_ids, center, scale, eigenvectors, percentile_model
        }
    }

    /// Loads all of the model tables from disk.
    /// # Arguments
    /// * `files` - locations and column labels of the tables
    pub fn from_files(files: &PopulationModelFiles) -> anyhow::Result<Self> {
        let map_table = Table::from_path(&files.map_fn)?;
        let expected_ids: Vec<String> = map_table.column(MAP_ID_COLUMN)
            .with_context(|| format!("Error while loading {:?}:", files.map_fn))?
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let center = Table::from_path(&files.center_fn)?
            .float_column(&files.center_column)
            .with_context(|| format!("Error while loading {:?}:", files.center_fn))?;
        let scale = Table::from_path(&files.scale_fn)?
            .float_column(&files.scale_column)
            .with_context(|| format!("Error while loading {:?}:", files.scale_fn))?;
        let eigenvectors = load_matrix(&files.eigenvector_fn)?;

        let percentile_model = match files.percentile_fn.as_deref() {
            Some(filename) => {
                let model: PercentileModel = load_json(filename)?;
                model.validate()
                    .with_context(|| format!("Error while validating {filename:?}:"))?;
                Some(model)
            },
            None => None
        };

        debug!(
            "Loaded population model with {} variants and {} components",
            expected_ids.len(), eigenvectors.ncols()
        );
        Ok(Self::new(
            expected_ids,
            Array1::from(center),
            Array1::from(scale),
            eigenvectors,
            percentile_model
        ))
    }

    // getters
    pub fn expected_ids(&self) -> &[String] {
        &self.expected_ids
    }

    pub fn center(&self) -> &Array1<f64> {
        &self.center
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn eigenvectors(&self) -> &Array2<f64> {
        &self.eigenvectors
    }

    pub fn percentile_model(&self) -> Option<&PercentileModel> {
        self.percentile_model.as_ref()
    }
}

/// Loads a fully numeric table (with a header row) into a matrix
fn load_matrix(filename: &Path) -> anyhow::Result<Array2<f64>> {
    let table = Table::from_path(filename)?;
    let num_cols = table.headers().len();
    let values: Vec<f64> = table.rows().iter()
        .flatten()
        .map(|v| {
            v.trim().parse::<f64>()
                .with_context(|| format!("Non-numeric value {v:?} in {filename:?}"))
        })
        .collect::<anyhow::Result<_>>()?;

    Array2::from_shape_vec((table.rows().len(), num_cols), values)
        .with_context(|| format!("Error while shaping matrix from {filename:?}:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_percentile_adjustment() {
        let model = PercentileModel {
            mean_coefficients: vec![0.0, 0.1, 0.0, 0.0, 0.0],
            variance_coefficients: vec![4.0, 0.0, 0.0, 0.0, 0.0]
        };
        model.validate().unwrap();

        // mean = 0.1 * -2.0, sd = 2
        let (adjusted, percentile) = model.adjust(-1.7, &[-2.0, 5.6, 0.0, 1.8]).unwrap();
        assert_approx_eq!(adjusted, -0.75);
        assert_approx_eq!(percentile, 0.226627352376868, 1e-9);

        // a zero score right on the mean is the median
        let (adjusted, percentile) = model.adjust(-0.2, &[-2.0, 0.0, 0.0, 0.0]).unwrap();
        assert_approx_eq!(adjusted + 1.0, 1.0);
        assert_approx_eq!(percentile, 0.5);
    }

    #[test]
    fn test_percentile_errors() {
        let model = PercentileModel {
            mean_coefficients: vec![0.0; 5],
            variance_coefficients: vec![-1.0, 0.0, 0.0, 0.0, 0.0]
        };
        assert!(model.adjust(1.0, &[0.0; 4]).is_err());
        assert!(model.adjust(1.0, &[0.0; 3]).is_err());

        let bad_model = PercentileModel {
            mean_coefficients: vec![0.0; 3],
            variance_coefficients: vec![1.0; 5]
        };
        assert!(bad_model.validate().is_err());
    }

    #[test]
    fn test_load_model() {
        let files = PopulationModelFiles {
            map_fn: PathBuf::from("test_data/scoring/1000G_map_chr1.txt"),
            center_fn: PathBuf::from("test_data/scoring/1000G_center_chr1.txt"),
            center_column: "x".to_string(),
            scale_fn: PathBuf::from("test_data/scoring/1000G_scale_chr1.txt"),
            scale_column: "x".to_string(),
            eigenvector_fn: PathBuf::from("test_data/scoring/1000G_PC1_chr1.txt"),
            percentile_fn: Some(PathBuf::from("test_data/scoring/1000G_percentile_model.json"))
        };
        let model = PopulationReferenceModel::from_files(&files).unwrap();
        assert_eq!(model.expected_ids(), &["rs30:G:T".to_string(), "rs10:A:G".to_string()]);
        assert_eq!(model.center().to_vec(), vec![1.0, 0.5]);
        assert_eq!(model.scale().to_vec(), vec![0.5, 0.25]);
        assert_eq!(model.eigenvectors().dim(), (2, 4));
        assert_eq!(model.eigenvectors()[[1, 3]], 0.5);
        assert!(model.percentile_model().is_some());
    }
}
