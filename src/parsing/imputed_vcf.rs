
use anyhow::{ensure, Context};
use indexmap::IndexMap;
use indexmap::map::Entry;
use log::debug;
use std::io::Read;
use std::path::Path;

use crate::errors::CoreError;
use crate::parsing::open_text_file;

/// FORMAT key holding the imputed dosage
pub const DOSAGE_KEY: &str = "DS";
/// INFO key holding the imputation quality
pub const R2_KEY: &str = "R2";

/// The columns of an imputed VCF row that scoring needs
#[derive(Clone, Debug, PartialEq)]
pub struct ImputedRow {
    id: String,
    ref_allele: String,
    alt_allele: String,
    info: String,
    format: String,
    sample: String
}

impl ImputedRow {
    /// Constructor
    pub fn new(id: String, ref_allele: String, alt_allele: String, info: String, format: String, sample: String) -> Self {
        Self {
            id, ref_allele, alt_allele, info, format, sample
        }
    }

    /// The `ID:REF:ALT` key used to join against weights and population tables
    pub fn combined_id(&self) -> String {
        format!("{}:{}:{}", self.id, self.ref_allele, self.alt_allele)
    }

    /// Pulls the DS value out of the FORMAT/SAMPLE columns.
    /// # Errors
    /// * if there is no DS key, or its value is not a number
    pub fn dosage(&self) -> Result<f64, CoreError> {
        let value = self.format.split(':')
            .zip(self.sample.split(':'))
            .find_map(|(k, v)| if k == DOSAGE_KEY { Some(v) } else { None })
            .ok_or_else(|| CoreError::DosageParse {
                variant_id: self.combined_id(),
                reason: format!("no {DOSAGE_KEY} field in {:?} / {:?}", self.format, self.sample)
            })?;

        value.parse::<f64>()
            .map_err(|_e| CoreError::DosageParse {
                variant_id: self.combined_id(),
                reason: format!("non-numeric value {value:?}")
            })
    }

    /// Pulls the R2 value out of the INFO column, if present and numeric
    pub fn imputation_r2(&self) -> Option<f64> {
        self.info.split(';')
            .filter_map(|item| item.split_once('='))
            .find(|(k, _v)| *k == R2_KEY)
            .and_then(|(_k, v)| v.parse::<f64>().ok())
    }

    // getters
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// All rows of an imputed VCF, keyed by `ID:REF:ALT` and kept in file order.
/// Duplicate keys keep the first row.
#[derive(Clone, Debug, Default)]
pub struct ImputedVariants {
    rows: IndexMap<String, ImputedRow>
}

impl ImputedVariants {
    /// Loads an imputed VCF, gzipped or plain.
    /// # Arguments
    /// * `vcf_fn` - path to the imputation output
    pub fn from_path(vcf_fn: &Path) -> anyhow::Result<Self> {
        let reader = open_text_file(vcf_fn)?;
        let variants = Self::from_reader(reader)
            .with_context(|| format!("Error while parsing {vcf_fn:?}:"))?;
        debug!("Loaded {} unique imputed variants from {vcf_fn:?}", variants.len());
        Ok(variants)
    }

    /// Parses VCF text from any reader
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut rows: IndexMap<String, ImputedRow> = Default::default();
        let mut duplicates = 0;
        for result in csv_reader.records() {
            let record = result?;
            ensure!(record.len() >= 10, "Expected at least 10 columns, found {}: {record:?}", record.len());

            let row = ImputedRow::new(
                record[2].to_string(),
                record[3].to_string(),
                record[4].to_string(),
                record[7].to_string(),
                record[8].to_string(),
                record[9].to_string()
            );
            match rows.entry(row.combined_id()) {
                Entry::Occupied(_) => duplicates += 1,
                Entry::Vacant(entry) => { entry.insert(row); }
            }
        }

        if duplicates > 0 {
            debug!("Dropped {duplicates} duplicate ID:REF:ALT rows");
        }
        Ok(Self {
            rows
        })
    }

    /// Looks up a row by its `ID:REF:ALT` key
    pub fn get(&self, combined_id: &str) -> Option<&ImputedRow> {
        self.rows.get(combined_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    fn mock_row(info: &str, format: &str, sample: &str) -> ImputedRow {
        ImputedRow::new("rs1".to_string(), "A".to_string(), "G".to_string(), info.to_string(), format.to_string(), sample.to_string())
    }

    #[test]
    fn test_dosage_extraction() {
        let row = mock_row("R2=0.9", "GT:DS:GP", "0|1:1.05:0.1,0.8,0.1");
        assert_approx_eq!(row.dosage().unwrap(), 1.05);
        assert_eq!(row.combined_id(), "rs1:A:G");

        let row = mock_row(".", "GT", "0|1");
        assert!(matches!(row.dosage(), Err(CoreError::DosageParse { .. })));

        let row = mock_row(".", "GT:DS", "0|1:.");
        assert!(matches!(row.dosage(), Err(CoreError::DosageParse { .. })));
    }

    #[test]
    fn test_r2_extraction() {
        assert_eq!(mock_row("AF=0.1;MAF=0.1;R2=0.75;IMPUTED", "GT", "0").imputation_r2(), Some(0.75));
        assert_eq!(mock_row("TYPED", "GT", "0").imputation_r2(), None);
        assert_eq!(mock_row("R2=abc", "GT", "0").imputation_r2(), None);
    }

    #[test]
    fn test_dedup_keeps_first() {
        let text = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n\
            1\t10\trs1\tA\tG\t.\tPASS\tR2=0.9\tGT:DS\t0|1:1\n\
            1\t10\trs1\tA\tG\t.\tPASS\tR2=0.5\tGT:DS\t1|1:2\n\
            1\t20\trs2\tC\tT\t.\tPASS\tR2=0.8\tGT:DS\t0|0:0.1\n";
        let variants = ImputedVariants::from_reader(text.as_bytes()).unwrap();
        assert_eq!(variants.len(), 2);
        assert_approx_eq!(variants.get("rs1:A:G").unwrap().dosage().unwrap(), 1.0);
        assert!(variants.get("rs2:C:T").is_some());
        assert!(variants.get("rs2:T:C").is_none());
    }

    #[test]
    fn test_short_rows() {
        let text = "1\t10\trs1\tA\tG\n";
        assert!(ImputedVariants::from_reader(text.as_bytes()).is_err());
    }
}
