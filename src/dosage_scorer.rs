
/*!
Computes the raw polygenic score from imputed dosages and a SNP weight table.
*/

use log::{debug, warn};
use ndarray::Array1;

use crate::errors::CoreError;
use crate::parsing::imputed_vcf::{ImputedRow, ImputedVariants};
use crate::parsing::weights::SnpWeightTable;

/// An imputed row that matched a requested key, with its parsed dosage
#[derive(Clone, Debug)]
pub struct JoinedDosage<'a> {
    /// The matched row
    pub row: &'a ImputedRow,
    /// DS value for the row
    pub dosage: f64
}

/// Inner-joins the imputed rows against an ordered list of `ID:REF:ALT` keys.
/// The output follows the order of `keys`; keys without an imputed row are skipped.
/// # Arguments
/// * `imputed` - the deduplicated imputed rows
/// * `keys` - the keys to look up, in the order the caller needs
/// # Errors
/// * `CoreError::DosageParse` if a matched row has a missing or non-numeric DS
pub fn join_dosages<'a, 'k, I>(imputed: &'a ImputedVariants, keys: I) -> Result<Vec<JoinedDosage<'a>>, CoreError>
where
    I: IntoIterator<Item = &'k str>
{
    keys.into_iter()
        .filter_map(|key| imputed.get(key))
        .map(|row| {
            Ok(JoinedDosage {
                row,
                dosage: row.dosage()?
            })
        })
        .collect()
}

/// Result of the weighted dosage sum
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawScore {
    /// dot(dosage, weight)
    pub score: f64,
    /// Number of weighted variants that were found in the imputed rows
    pub variants_scored: usize
}

/// Computes the raw score as the dot product of joined dosages and weights.
/// # Arguments
/// * `imputed` - the deduplicated imputed rows for one chromosome
/// * `weights` - the effect sizes, which define the join order
/// # Errors
/// * `CoreError::DosageParse` if a joined row has no usable DS value
/// * `CoreError::DimensionMismatch` if the aligned vectors differ in length
pub fn score_dosages(imputed: &ImputedVariants, weights: &SnpWeightTable) -> Result<RawScore, CoreError> {
    let joined = join_dosages(imputed, weights.iter().map(|(key, _w)| key))?;
    let matched_weights: Vec<f64> = weights.iter()
        .filter(|(key, _w)| imputed.get(key).is_some())
        .map(|(_key, w)| w)
        .collect();

    if joined.len() != matched_weights.len() {
        return Err(CoreError::DimensionMismatch {
            context: "dosage and weight vectors".to_string(),
            expected: matched_weights.len(),
            observed: joined.len()
        });
    }

    let dosages: Array1<f64> = joined.iter().map(|j| j.dosage).collect();
    let weight_vector = Array1::from(matched_weights);
    let score = dosages.dot(&weight_vector);

    if joined.is_empty() {
        warn!("None of the {} weighted variants were found in the imputed file", weights.len());
    } else {
        debug!("Scored {} of {} weighted variants, raw score = {score}", joined.len(), weights.len());
    }
    Ok(RawScore {
        score,
        variants_scored: joined.len()
    })
}
