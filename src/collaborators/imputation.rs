
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::collaborators::{run_tool, CollaboratorConfig, ToolInvocation};
use crate::writers::noodles_idx::append_extension;

/// FORMAT fields requested from the imputation engine
pub const IMPUTED_FORMATS: &str = "GT,DS,GP";

/// Inputs for one imputation run
#[derive(Clone, Debug)]
pub struct ImputationRequest<'a> {
    /// Phased, indexed VCF
    pub phased_vcf: &'a Path,
    /// Per-chromosome reference panel (MSAV)
    pub reference_panel: &'a Path,
    /// Dosage-annotated output VCF
    pub out_vcf: &'a Path,
    /// Empirical dosages at the typed sites
    pub empirical_vcf: &'a Path
}

impl ImputationRequest<'_> {
    /// Builds the minimac4 invocation
    pub fn invocation(&self, config: &CollaboratorConfig) -> ToolInvocation {
        let args: Vec<OsString> = vec![
            "--output".into(), self.out_vcf.into(),
            "--threads".into(), config.threads().to_string().into(),
            "--format".into(), IMPUTED_FORMATS.into(),
            "--all-typed-sites".into(),
            "--empirical-output".into(), self.empirical_vcf.into(),
            self.reference_panel.into(),
            self.phased_vcf.into()
        ];
        ToolInvocation {
            tool: "minimac4".to_string(),
            program: config.minimac_exe().to_path_buf(),
            args,
            outputs: vec![self.out_vcf.to_path_buf(), self.empirical_vcf.to_path_buf()],
            log_fn: append_extension(self.out_vcf, "minimac4.log")
        }
    }
}

/// Imputes dosages for the phased VCF and returns the imputed VCF path.
/// # Errors
/// * `CoreError::Collaborator` if minimac4 fails or times out
pub fn impute(request: &ImputationRequest, config: &CollaboratorConfig) -> anyhow::Result<PathBuf> {
    run_tool(&request.invocation(config), config)?;
    Ok(request.out_vcf.to_path_buf())
}
