
use anyhow::bail;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, check_required_folder, ToolSettings, AFTER_HELP, FULL_VERSION};
use crate::data_types::build::ReferenceBuild;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ConvertSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    meerkat_version: String,

    /// Raw genotype export from 23andMe or AncestryDNA, plain or gzipped
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub genotype_fn: PathBuf,

    /// Reference bundle folder with FASTAs, chains, and whitelists
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_folder: PathBuf,

    /// Output VCF in GRCh37 coordinates; compressed if it ends in .gz
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_fn: PathBuf,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Build of the input; detected from the dbSNP whitelists if not provided
    #[clap(short = 'b')]
    #[clap(long = "build")]
    #[clap(value_name = "BUILD")]
    #[clap(help_heading = Some("Conversion"))]
    #[clap(value_enum)]
    pub build: Option<ReferenceBuild>,

    #[command(flatten)]
    pub tools: ToolSettings,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

impl ConvertSettings {
    /// Failed conversions write a structured report here when debugging
    pub fn error_report_fn(&self) -> Option<PathBuf> {
        self.debug_folder.as_ref().map(|d| d.join("error_report.json"))
    }

    /// Intermediates are kept under the debug folder, otherwise they go to a temporary folder
    pub fn scratch_folder(&self) -> Option<PathBuf> {
        self.debug_folder.as_ref().map(|d| d.join("scratch"))
    }
}

pub fn check_convert_settings(mut settings: ConvertSettings) -> anyhow::Result<ConvertSettings> {
    // hard code the version in
    settings.meerkat_version = FULL_VERSION.clone();
    info!("Meerkat version: {:?}", &settings.meerkat_version);
    info!("Sub-command: convert");
    info!("Inputs:");

    check_required_filename(&settings.genotype_fn, "Genotype input")?;
    check_required_folder(&settings.reference_folder, "Reference folder")?;

    info!("\tGenotype input: {:?}", &settings.genotype_fn);
    info!("\tReference folder: {:?}", &settings.reference_folder);
    match settings.build {
        Some(build) => info!("\tBuild: {build}"),
        None => info!("\tBuild: auto-detect")
    };

    info!("Outputs:");
    if settings.output_fn.is_dir() {
        bail!("--output-vcf must be a file path, found a folder: {:?}", settings.output_fn);
    }
    info!("\tOutput VCF: {:?}", &settings.output_fn);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    settings.tools.check()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_paths() {
        let mut settings = ConvertSettings {
            genotype_fn: PathBuf::from("test_data/genotypes/mock_23andme.txt"),
            reference_folder: PathBuf::from("test_data/mock_bundle"),
            output_fn: PathBuf::from("converted.vcf"),
            ..Default::default()
        };
        assert_eq!(settings.error_report_fn(), None);
        assert_eq!(settings.scratch_folder(), None);

        settings.debug_folder = Some(PathBuf::from("/tmp/debug"));
        assert_eq!(settings.error_report_fn(), Some(PathBuf::from("/tmp/debug/error_report.json")));
        assert_eq!(settings.scratch_folder(), Some(PathBuf::from("/tmp/debug/scratch")));
    }
}
