
/*!
Maps a reference bundle folder onto the individual files each pipeline step needs.
*/

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::data_types::build::{BuildCandidate, ReferenceBuild};
use crate::parsing::population_model::PopulationModelFiles;
use crate::parsing::weights::DEFAULT_WEIGHT_COLUMN;

/// Chromosome label that selects the genome-wide weights and population model
pub const GENOME_WIDE: &str = "0";

/// Suffix of the per-chromosome imputation panels
pub const IMPUTATION_PANEL_SUFFIX: &str = "1000g.Phase3.v5.With.Parameter.Estimates.msav";

/// File locations inside a reference bundle
#[derive(Clone, Debug, Serialize)]
pub struct ReferenceLayout {
    /// Root folder of the bundle
    root: PathBuf,
    /// Label of the effect-size column in the weight tables
    weight_column: String
}

impl ReferenceLayout {
    /// Constructor
    /// # Arguments
    /// * `root` - the bundle folder
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            weight_column: DEFAULT_WEIGHT_COLUMN.to_string()
        }
    }

    /// Overrides the effect-size column label
    pub fn with_weight_column(mut self, weight_column: &str) -> Self {
        self.weight_column = weight_column.to_string();
        self
    }

    /// Uncompressed FASTA for a build; the .fai sits next to it
    pub fn fasta(&self, build: ReferenceBuild) -> PathBuf {
        let filename = match build {
            ReferenceBuild::Grch36 => "human_genome_v36.fa",
            ReferenceBuild::Grch37 => "human_g1k_v37.fasta",
            ReferenceBuild::Grch38 => "human_genome_v38.fa"
        };
        self.root.join(filename)
    }

    /// Chain file that lifts a build over to the target build, None for the target build itself
    pub fn chain_to_target(&self, build: ReferenceBuild) -> Option<PathBuf> {
        match build {
            ReferenceBuild::Grch36 => Some(self.root.join("hg18ToHg19.over.chain.gz")),
            ReferenceBuild::Grch37 => None,
            ReferenceBuild::Grch38 => Some(self.root.join("hg38ToHg19.over.chain.gz"))
        }
    }

    /// dbSNP locus whitelist for one build and chromosome
    pub fn locus_whitelist(&self, build: ReferenceBuild, chrom: &str) -> PathBuf {
        self.root.join(format!("dbSNP_151_idlocus_{}_chr{chrom}.txt", build.ucsc_label()))
    }

    /// Build candidates for a chromosome, in detection priority order
    pub fn build_candidates(&self, chrom: &str) -> Vec<BuildCandidate> {
        ReferenceBuild::DETECTION_PRIORITY.iter()
            .map(|&build| BuildCandidate::new(build, self.locus_whitelist(build, chrom)))
            .collect()
    }

    /// Reference haplotypes used for phasing
    pub fn phasing_panel(&self) -> PathBuf {
        self.root.join("1kgreference.bcf")
    }

    /// Genetic map used for phasing
    pub fn genetic_map(&self) -> PathBuf {
        self.root.join("genetic_map_hg19_withX.txt.gz")
    }

    /// Imputation panel for one chromosome
    pub fn imputation_panel(&self, chrom: &str) -> PathBuf {
        self.root.join(format!("{chrom}.{IMPUTATION_PANEL_SUFFIX}"))
    }

    /// SNP weight table; genome-wide for the "0" chromosome
    pub fn weights(&self, chrom: &str) -> PathBuf {
        if chrom == GENOME_WIDE {
            self.root.join("trans_prs_Nov_19.txt")
        } else {
            self.root.join(format!("{chrom}.trans_prs_snps.txt"))
        }
    }

    pub fn weight_column(&self) -> &str {
        &self.weight_column
    }

    /// Population model tables; genome-wide for the "0" chromosome.
    /// The percentile model is only included when the file exists.
    pub fn population_model(&self, chrom: &str) -> PopulationModelFiles {
        let (suffix, center_column, scale_column) = if chrom == GENOME_WIDE {
            (String::new(), "out.center", "out.scale")
        } else {
            (format!("_chr{chrom}"), "x", "x")
        };

        let percentile_fn = self.root.join("1000G_percentile_model.json");
        PopulationModelFiles {
            map_fn: self.root.join(format!("1000G_map{suffix}.txt")),
            center_fn: self.root.join(format!("1000G_center{suffix}.txt")),
            center_column: center_column.to_string(),
            scale_fn: self.root.join(format!("1000G_scale{suffix}.txt")),
            scale_column: scale_column.to_string(),
            eigenvector_fn: self.root.join(format!("1000G_PC1{suffix}.txt")),
            percentile_fn: percentile_fn.exists().then_some(percentile_fn)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_files() {
        let layout = ReferenceLayout::new(Path::new("/mnt/ref"));
        assert_eq!(layout.fasta(ReferenceBuild::Grch37), PathBuf::from("/mnt/ref/human_g1k_v37.fasta"));
        assert_eq!(layout.fasta(ReferenceBuild::Grch36), PathBuf::from("/mnt/ref/human_genome_v36.fa"));
        assert_eq!(layout.chain_to_target(ReferenceBuild::Grch37), None);
        assert_eq!(layout.chain_to_target(ReferenceBuild::Grch38), Some(PathBuf::from("/mnt/ref/hg38ToHg19.over.chain.gz")));

        let candidates = layout.build_candidates("22");
        let builds: Vec<ReferenceBuild> = candidates.iter().map(|c| c.build).collect();
        assert_eq!(builds, ReferenceBuild::DETECTION_PRIORITY.to_vec());
        assert_eq!(candidates[0].whitelist_path, PathBuf::from("/mnt/ref/dbSNP_151_idlocus_hg19_chr22.txt"));
        assert_eq!(candidates[1].whitelist_path, PathBuf::from("/mnt/ref/dbSNP_151_idlocus_hg18_chr22.txt"));
    }

    #[test]
    fn test_scoring_files() {
        let layout = ReferenceLayout::new(Path::new("/mnt/ref"));
        assert_eq!(layout.weights("0"), PathBuf::from("/mnt/ref/trans_prs_Nov_19.txt"));
        assert_eq!(layout.weights("7"), PathBuf::from("/mnt/ref/7.trans_prs_snps.txt"));
        assert_eq!(layout.imputation_panel("7"), PathBuf::from("/mnt/ref/7.1000g.Phase3.v5.With.Parameter.Estimates.msav"));

        let genome_wide = layout.population_model("0");
        assert_eq!(genome_wide.map_fn, PathBuf::from("/mnt/ref/1000G_map.txt"));
        assert_eq!(genome_wide.center_column, "out.center");
        assert_eq!(genome_wide.scale_column, "out.scale");
        assert_eq!(genome_wide.percentile_fn, None);

        let per_chrom = layout.population_model("7");
        assert_eq!(per_chrom.eigenvector_fn, PathBuf::from("/mnt/ref/1000G_PC1_chr7.txt"));
        assert_eq!(per_chrom.center_column, "x");
    }

    #[test]
    fn test_fixture_bundle() {
        let layout = ReferenceLayout::new(Path::new("test_data/scoring"));
        let files = layout.population_model("1");
        assert_eq!(files.percentile_fn, Some(PathBuf::from("test_data/scoring/1000G_percentile_model.json")));
        assert!(files.map_fn.exists());
    }
}
