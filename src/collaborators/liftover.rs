
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::collaborators::{run_tool, CollaboratorConfig, ToolInvocation};
use crate::writers::noodles_idx::append_extension;

/// Inputs for one liftover run
#[derive(Clone, Debug)]
pub struct LiftoverRequest<'a> {
    /// Chain file from the source build to the target build
    pub chain: &'a Path,
    /// VCF in the source build
    pub in_vcf: &'a Path,
    /// FASTA of the target build
    pub target_fasta: &'a Path,
    /// VCF in target coordinates; not sorted
    pub out_vcf: &'a Path
}

impl LiftoverRequest<'_> {
    /// Records that could not be mapped land here
    pub fn unmapped_vcf(&self) -> PathBuf {
        append_extension(self.out_vcf, "unmap")
    }

    /// Builds the CrossMap invocation
    pub fn invocation(&self, config: &CollaboratorConfig) -> ToolInvocation {
        let args: Vec<OsString> = vec![
            "vcf".into(),
            self.chain.into(),
            self.in_vcf.into(),
            self.target_fasta.into(),
            self.out_vcf.into()
        ];
        ToolInvocation {
            tool: "CrossMap".to_string(),
            program: config.crossmap_exe().to_path_buf(),
            args,
            outputs: vec![self.out_vcf.to_path_buf(), self.unmapped_vcf()],
            log_fn: append_extension(self.out_vcf, "crossmap.log")
        }
    }
}

/// Lifts a VCF over to the target build and returns the (unsorted) output path.
/// # Errors
/// * `CoreError::Collaborator` if CrossMap fails or times out
pub fn liftover(request: &LiftoverRequest, config: &CollaboratorConfig) -> anyhow::Result<PathBuf> {
    run_tool(&request.invocation(config), config)?;
    Ok(request.out_vcf.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossmap_command() {
        let request = LiftoverRequest {
            chain: Path::new("/ref/hg18ToHg19.over.chain.gz"),
            in_vcf: Path::new("/tmp/req/converted.vcf"),
            target_fasta: Path::new("/ref/human_g1k_v37.fasta"),
            out_vcf: Path::new("/tmp/req/lifted.vcf")
        };
        let invocation = request.invocation(&CollaboratorConfig::default());
        assert_eq!(
            invocation.command_line(),
            "CrossMap vcf /ref/hg18ToHg19.over.chain.gz /tmp/req/converted.vcf /ref/human_g1k_v37.fasta /tmp/req/lifted.vcf"
        );
        assert_eq!(invocation.outputs[1], PathBuf::from("/tmp/req/lifted.vcf.unmap"));
    }
}
