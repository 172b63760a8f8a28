
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, check_required_folder, ToolSettings, AFTER_HELP, FULL_VERSION};
use crate::data_types::build::ReferenceBuild;
use crate::parsing::weights::DEFAULT_WEIGHT_COLUMN;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct RunSettings {
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

    /// Reference bundle folder
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_folder: PathBuf,

    /// Output score JSON; an error report is written here on failure
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-json")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_fn: PathBuf,

    /// Optional output debug folder; intermediate files are kept here instead of a temporary folder
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

    /// Effect-size column in the weight tables
    #[clap(long = "weight-column")]
    #[clap(value_name = "COLUMN")]
    #[clap(help_heading = Some("Scoring"))]
    #[clap(default_value = DEFAULT_WEIGHT_COLUMN)]
    pub weight_column: String,

    #[command(flatten)]
    pub tools: ToolSettings,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_run_settings(mut settings: RunSettings) -> anyhow::Result<RunSettings> {
    // hard code the version in
    settings.meerkat_version = FULL_VERSION.clone();
    info!("Meerkat version: {:?}", &settings.meerkat_version);
    info!("Sub-command: run");
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
    info!("\tOutput JSON: {:?}", &settings.output_fn);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    info!("Scoring parameters:");
    info!("\tWeight column: {:?}", &settings.weight_column);

    settings.tools.check()?;
    Ok(settings)
}
