
use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::convert::ConvertSettings;
use crate::cli::run::RunSettings;
use crate::cli::score::ScoreSettings;
use crate::collaborators::{CollaboratorConfig, CollaboratorConfigBuilder};

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.2.1-6bb9635-dirty` - while on a dirty branch
    /// * `0.2.1-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string containing the legalese.
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2019-{}     Meerkat developers
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// Meerkat, a tool for scouting polygenic risk from consumer genotyping arrays.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Converts a 23andMe or AncestryDNA export into a GRCh37 VCF
    Convert(Box<ConvertSettings>),
    /// Scores an imputed VCF against the PRS weights and population model
    Score(Box<ScoreSettings>),
    /// Runs conversion, phasing, imputation, and scoring end-to-end
    Run(Box<RunSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// External tool options shared by the sub-commands that launch them
#[derive(Args, Clone, Default, Serialize)]
pub struct ToolSettings {
    /// Phasing executable
    #[clap(long = "eagle")]
    #[clap(value_name = "EXE")]
    #[clap(help_heading = Some("External tools"))]
    #[clap(default_value = "eagle")]
    pub eagle_exe: PathBuf,

    /// Imputation executable
    #[clap(long = "minimac")]
    #[clap(value_name = "EXE")]
    #[clap(help_heading = Some("External tools"))]
    #[clap(default_value = "minimac4")]
    pub minimac_exe: PathBuf,

    /// Liftover executable
    #[clap(long = "crossmap")]
    #[clap(value_name = "EXE")]
    #[clap(help_heading = Some("External tools"))]
    #[clap(default_value = "CrossMap")]
    pub crossmap_exe: PathBuf,

    /// Wall-clock limit for each external tool run
    #[clap(long = "tool-timeout")]
    #[clap(value_name = "MINUTES")]
    #[clap(help_heading = Some("External tools"))]
    #[clap(default_value = "60")]
    pub timeout_minutes: u64,

    /// Number of threads handed to the external tools
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize
}

impl ToolSettings {
    /// Validates the values and logs them
    pub fn check(&mut self) -> anyhow::Result<()> {
        if self.timeout_minutes == 0 {
            bail!("--tool-timeout must be >0");
        }
        if self.threads == 0 {
            self.threads = 1;
        }

        info!("External tools:");
        info!("\tPhasing: {:?}", &self.eagle_exe);
        info!("\tImputation: {:?}", &self.minimac_exe);
        info!("\tLiftover: {:?}", &self.crossmap_exe);
        info!("\tTimeout: {} minutes", self.timeout_minutes);
        info!("\tThreads: {}", self.threads);
        Ok(())
    }

    /// Converts the CLI values into the collaborator configuration
    pub fn collaborator_config(&self) -> anyhow::Result<CollaboratorConfig> {
        let config = CollaboratorConfigBuilder::default()
            .threads(self.threads)
            .timeout(Duration::from_secs(60 * self.timeout_minutes))
            .eagle_exe(self.eagle_exe.clone())
            .minimac_exe(self.minimac_exe.clone())
            .crossmap_exe(self.crossmap_exe.clone())
            .build()?;
        Ok(config)
    }
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }

    // file exists
    Ok(())
}

/// Checks if a folder exists and will otherwise exit
/// # Arguments
/// * `folder` - the folder path to check for
/// * `label` - the label to use for error messages
pub fn check_required_folder(folder: &Path, label: &str) -> anyhow::Result<()> {
    if !folder.is_dir() {
        bail!("{} is not a folder: \"{}\"", label, folder.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_settings() {
        let mut settings = ToolSettings {
            eagle_exe: PathBuf::from("/opt/eagle"),
            minimac_exe: PathBuf::from("minimac4"),
            crossmap_exe: PathBuf::from("CrossMap"),
            timeout_minutes: 2,
            threads: 0
        };
        settings.check().unwrap();
        assert_eq!(settings.threads, 1);

        let config = settings.collaborator_config().unwrap();
        assert_eq!(config.threads(), 1);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.eagle_exe(), Path::new("/opt/eagle"));

        settings.timeout_minutes = 0;
        assert!(settings.check().is_err());
    }

    #[test]
    fn test_filename_checks() {
        assert!(check_required_filename(Path::new("test_data/scoring/1.trans_prs_snps.txt"), "Weights").is_ok());
        assert!(check_required_filename(Path::new("test_data/does_not_exist.txt"), "Weights").is_err());
        assert!(check_required_folder(Path::new("test_data/scoring"), "Reference folder").is_ok());
        assert!(check_required_folder(Path::new("test_data/scoring/1.trans_prs_snps.txt"), "Reference folder").is_err());
    }
}
