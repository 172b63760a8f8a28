
use crate::errors::CoreError;

/// The two-character sentinel vendors use for a no-call
pub const MISSING_CALL: &str = "--";

/// A single normalized genotype call from an array export.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenotypeRecord {
    /// The record identifier, usually an rsID
    rsid: String,
    /// Chromosome label, with "MT" rewritten to "M"
    chrom: String,
    /// The coordinate of the call, 0-based
    position: u64,
    /// One (hemizygous) or two (diploid) bases from ACGT
    genotype: String
}

impl GenotypeRecord {
    /// Creates a new record, validating the genotype.
    /// # Arguments
    /// * `rsid` - the record identifier
    /// * `chrom` - the chromosome as written in the source; this will get normalized
    /// * `position` - the 0-based coordinate
    /// * `genotype` - the called bases
    /// # Errors
    /// * if the genotype is empty, longer than 2, or contains characters outside of ACGT
    pub fn new(rsid: String, chrom: &str, position: u64, genotype: String) -> Result<Self, CoreError> {
        if genotype.is_empty() || genotype.len() > 2 || !genotype.bytes().all(is_acgt) {
            return Err(CoreError::GenotypeValidation { rsid, genotype });
        }

        Ok(Self {
            rsid,
            chrom: normalize_chrom(chrom),
            position,
            genotype
        })
    }

    /// Returns true if this is a single-allele call, e.g. chrX in males or chrM
    pub fn is_hemizygous(&self) -> bool {
        self.genotype.len() == 1
    }

    // getters
    pub fn rsid(&self) -> &str {
        &self.rsid
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn genotype(&self) -> &[u8] {
        self.genotype.as_bytes()
    }
}

/// Returns true for the four canonical (upper-case) bases
pub fn is_acgt(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

/// Mitochondria show up as "MT" in vendor files but "M" in our references.
pub fn normalize_chrom(chrom: &str) -> String {
    if chrom == "MT" {
        "M".to_string()
    } else {
        chrom.to_string()
    }
}
