
use anyhow::Context;
use log::{debug, warn};
use rustc_hash::FxHashSet as HashSet;
use std::path::Path;

use crate::parsing::Table;

/// Column holding the `id:ref:alt` key in the weight tables
pub const WEIGHT_ID_COLUMN: &str = "newid";
/// Default column holding the effect size
pub const DEFAULT_WEIGHT_COLUMN: &str = "beta_grid4";

/// SNP effect sizes keyed by `id:ref:alt`, kept in table row order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnpWeightTable {
    entries: Vec<(String, f64)>
}

impl SnpWeightTable {
    /// Loads a weight table from a tab-delimited file with a header.
    /// # Arguments
    /// * `filename` - path to the table
    /// * `weight_column` - label of the effect-size column
    pub fn from_path(filename: &Path, weight_column: &str) -> anyhow::Result<Self> {
        let table = Table::from_path(filename)?;
        let ids = table.column(WEIGHT_ID_COLUMN)
            .with_context(|| format!("Error while loading weights from {filename:?}:"))?;
        let weights = table.float_column(weight_column)
            .with_context(|| format!("Error while loading weights from {filename:?}:"))?;

        let entries: Vec<(String, f64)> = ids.into_iter()
            .map(|id| id.to_string())
            .zip(weights)
            .collect();
        let weight_table = Self::new(entries);
        debug!("Loaded {} SNP weights from {filename:?}", weight_table.len());
        Ok(weight_table)
    }

    /// Creates a table from ordered (key, weight) pairs.
    /// Repeated keys are kept, each one contributes to the score.
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        let unique: HashSet<&str> = entries.iter().map(|(k, _w)| k.as_str()).collect();
        if unique.len() != entries.len() {
            warn!("Weight table contains {} repeated keys", entries.len() - unique.len());
        }
        Self { entries }
    }

    /// Iterates over (key, weight) in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_weights() {
        let weights = SnpWeightTable::from_path(Path::new("test_data/scoring/1.trans_prs_snps.txt"), DEFAULT_WEIGHT_COLUMN).unwrap();
        let entries: Vec<(&str, f64)> = weights.iter().collect();
        assert_eq!(entries, vec![
            ("rs20:C:T", -1.0),
            ("rs10:A:G", 2.0),
            ("rs99:G:A", 5.0)
        ]);

        assert!(SnpWeightTable::from_path(Path::new("test_data/scoring/1.trans_prs_snps.txt"), "missing_column").is_err());
    }
}
