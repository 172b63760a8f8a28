
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, check_required_folder, AFTER_HELP, FULL_VERSION};
use crate::parsing::weights::DEFAULT_WEIGHT_COLUMN;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ScoreSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    meerkat_version: String,

    /// Imputed VCF with DS values and R2 annotations
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "imputed-vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub imputed_fn: PathBuf,

    /// Reference bundle folder with the weight tables and population model
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_folder: PathBuf,

    /// Output score JSON; compressed if it ends in .gz
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-json")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_fn: PathBuf,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Chromosome tables to score with, "0" for genome-wide [default: the chromosome in the VCF]
    #[clap(short = 'c')]
    #[clap(long = "chromosome")]
    #[clap(value_name = "CHROM")]
    #[clap(help_heading = Some("Scoring"))]
    pub chromosome: Option<String>,

    /// Effect-size column in the weight tables
    #[clap(long = "weight-column")]
    #[clap(value_name = "COLUMN")]
    #[clap(help_heading = Some("Scoring"))]
    #[clap(default_value = DEFAULT_WEIGHT_COLUMN)]
    pub weight_column: String,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_score_settings(mut settings: ScoreSettings) -> anyhow::Result<ScoreSettings> {
    // hard code the version in
    settings.meerkat_version = FULL_VERSION.clone();
    info!("Meerkat version: {:?}", &settings.meerkat_version);
    info!("Sub-command: score");
    info!("Inputs:");

    check_required_filename(&settings.imputed_fn, "Imputed VCF")?;
    check_required_folder(&settings.reference_folder, "Reference folder")?;

    info!("\tImputed VCF: {:?}", &settings.imputed_fn);
    info!("\tReference folder: {:?}", &settings.reference_folder);

    info!("Outputs:");
    info!("\tOutput JSON: {:?}", &settings.output_fn);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    info!("Scoring parameters:");
    match settings.chromosome.as_deref() {
        Some(chrom) => info!("\tChromosome: {chrom}"),
        None => info!("\tChromosome: from input")
    };
    info!("\tWeight column: {:?}", &settings.weight_column);

    Ok(settings)
}
