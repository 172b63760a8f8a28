
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::collaborators::{run_tool, CollaboratorConfig, ToolInvocation};
use crate::writers::noodles_idx::append_extension;

/// Inputs for one phasing run
#[derive(Clone, Debug)]
pub struct PhasingRequest<'a> {
    /// Bgzipped and indexed target VCF
    pub target_vcf: &'a Path,
    /// Reference haplotype panel (BCF)
    pub reference_panel: &'a Path,
    /// Genetic map for the target build
    pub genetic_map: &'a Path,
    /// The single chromosome in the target
    pub chrom: &'a str,
    /// Output prefix; eagle appends `.vcf.gz`
    pub out_prefix: &'a Path
}

impl PhasingRequest<'_> {
    /// The phased VCF eagle writes for this request
    pub fn phased_vcf(&self) -> PathBuf {
        append_extension(self.out_prefix, "vcf.gz")
    }

    /// Builds the eagle invocation
    pub fn invocation(&self, config: &CollaboratorConfig) -> ToolInvocation {
        let args: Vec<OsString> = vec![
            "--vcfRef".into(), self.reference_panel.into(),
            "--vcfTarget".into(), self.target_vcf.into(),
            "--geneticMapFile".into(), self.genetic_map.into(),
            "--outPrefix".into(), self.out_prefix.into(),
            "--allowRefAltSwap".into(),
            "--vcfOutFormat".into(), "z".into(),
            "--numThreads".into(), config.threads().to_string().into(),
            "--chrom".into(), self.chrom.into()
        ];
        ToolInvocation {
            tool: "eagle".to_string(),
            program: config.eagle_exe().to_path_buf(),
            args,
            outputs: vec![self.phased_vcf()],
            log_fn: append_extension(self.out_prefix, "eagle.log")
        }
    }
}

/// Phases the target VCF against the reference panel and returns the phased VCF path.
/// # Errors
/// * `CoreError::Collaborator` if eagle fails or times out
pub fn phase(request: &PhasingRequest, config: &CollaboratorConfig) -> anyhow::Result<PathBuf> {
    run_tool(&request.invocation(config), config)?;
    Ok(request.phased_vcf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorConfigBuilder;

    #[test]
    fn test_eagle_command() {
        let config = CollaboratorConfigBuilder::default()
            .threads(10)
            .build().unwrap();
        let request = PhasingRequest {
            target_vcf: Path::new("/tmp/req/input.vcf.gz"),
            reference_panel: Path::new("/ref/1kgreference.bcf"),
            genetic_map: Path::new("/ref/genetic_map_hg19_withX.txt.gz"),
            chrom: "22",
            out_prefix: Path::new("/tmp/req/phased")
        };
        let invocation = request.invocation(&config);
        assert_eq!(
            invocation.command_line(),
            "eagle --vcfRef /ref/1kgreference.bcf --vcfTarget /tmp/req/input.vcf.gz \
            --geneticMapFile /ref/genetic_map_hg19_withX.txt.gz --outPrefix /tmp/req/phased \
            --allowRefAltSwap --vcfOutFormat z --numThreads 10 --chrom 22"
        );
        assert_eq!(invocation.outputs, vec![PathBuf::from("/tmp/req/phased.vcf.gz")]);
        assert_eq!(request.phased_vcf(), PathBuf::from("/tmp/req/phased.vcf.gz"));
    }
}
