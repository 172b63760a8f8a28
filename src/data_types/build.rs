
use serde::Serialize;
use std::path::PathBuf;
use strum_macros::EnumString;

/// The reference assemblies we know how to detect and resolve against
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display, EnumString, Serialize, clap::ValueEnum)]
pub enum ReferenceBuild {
    /// NCBI36 / hg18
    #[strum(ascii_case_insensitive, serialize = "GRCh36")]
    #[clap(name = "GRCh36")]
    #[serde(rename = "GRCh36")]
    Grch36,
    /// GRCh37 / hg19; the coordinate system of the imputation panel
    #[strum(ascii_case_insensitive, serialize = "GRCh37")]
    #[clap(name = "GRCh37")]
    #[serde(rename = "GRCh37")]
    Grch37,
    /// GRCh38 / hg38
    #[strum(ascii_case_insensitive, serialize = "GRCh38")]
    #[clap(name = "GRCh38")]
    #[serde(rename = "GRCh38")]
    Grch38
}

impl ReferenceBuild {
    /// The build the downstream phasing and imputation panels are in
    pub const TARGET: ReferenceBuild = ReferenceBuild::Grch37;

    /// The order in which builds are tried during detection; the first one over threshold wins.
    pub const DETECTION_PRIORITY: [ReferenceBuild; 3] = [
        ReferenceBuild::Grch37,
        ReferenceBuild::Grch36,
        ReferenceBuild::Grch38
    ];

    /// UCSC-style label used in the dbSNP locus whitelist names
    pub fn ucsc_label(&self) -> &'static str {
        match self {
            ReferenceBuild::Grch36 => "hg18",
            ReferenceBuild::Grch37 => "hg19",
            ReferenceBuild::Grch38 => "hg38"
        }
    }

    /// Returns true if data in this build must be lifted over before phasing
    pub fn requires_liftover(&self) -> bool {
        *self != Self::TARGET
    }
}

/// A single build to try during detection, paired with its whitelist of valid loci
#[derive(Clone, Debug, PartialEq)]
pub struct BuildCandidate {
    /// The build this whitelist represents
    pub build: ReferenceBuild,
    /// Path to the newline-delimited `rsid:chrom:pos` whitelist
    pub whitelist_path: PathBuf
}

impl BuildCandidate {
    /// Constructor
    pub fn new(build: ReferenceBuild, whitelist_path: PathBuf) -> Self {
        Self { build, whitelist_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_build_parsing() {
        assert_eq!(ReferenceBuild::from_str("GRCh37").unwrap(), ReferenceBuild::Grch37);
        assert_eq!(ReferenceBuild::from_str("grch38").unwrap(), ReferenceBuild::Grch38);
        assert!(ReferenceBuild::from_str("NA").is_err());
        assert_eq!(ReferenceBuild::Grch36.to_string(), "GRCh36");
    }

    #[test]
    fn test_liftover_requirement() {
        assert!(ReferenceBuild::Grch36.requires_liftover());
        assert!(!ReferenceBuild::Grch37.requires_liftover());
        assert!(ReferenceBuild::Grch38.requires_liftover());
        assert_eq!(ReferenceBuild::DETECTION_PRIORITY[0], ReferenceBuild::TARGET);
    }
}
