
use log::{LevelFilter, error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use meerkat::cli::convert::{ConvertSettings, check_convert_settings};
use meerkat::cli::core::{Commands, get_cli};
use meerkat::cli::run::{RunSettings, check_run_settings};
use meerkat::cli::score::{ScoreSettings, check_score_settings};
use meerkat::errors::{CoreError, ErrorReport};
use meerkat::parsing::vcf_summary::extract_chromosome;
use meerkat::pipeline::{convert_genotypes, run_pipeline, score_imputed, ScratchSpace};
use meerkat::reference_layout::ReferenceLayout;
use meerkat::util::json_io::save_json;

/// Sets up logging before we check the other settings
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Creates the debug folder if specified and saves the CLI options into it
fn prepare_debug_folder<T: Serialize>(debug_folder: Option<&Path>, settings: &T) {
    if let Some(debug_folder) = debug_folder {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }
}

/// Reports a fatal pipeline error and exits; a structured report is written if we have somewhere to put it
fn exit_with_report(e: anyhow::Error, report_fn: Option<&Path>) -> ! {
    error!("Error while running pipeline: {e:#}");
    if let Some(report_fn) = report_fn {
        let report = ErrorReport::from_error(&e);
        info!("Saving error report to {report_fn:?}...");
        if let Err(save_error) = save_json(&report, report_fn) {
            error!("Error while saving error report: {save_error:#}");
        }
    }

    let code = e.chain()
        .find_map(|inner| inner.downcast_ref::<CoreError>())
        .map(|core_error| core_error.exit_code())
        .unwrap_or(exitcode::IOERR);
    std::process::exit(code)
}

fn run_convert(settings: ConvertSettings) {
    // start the timer
    let start_time = Instant::now();
    init_logging(settings.verbosity);

    let settings = match check_convert_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    prepare_debug_folder(settings.debug_folder.as_deref(), &settings);

    let config = match settings.tools.collaborator_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Error while building collaborator config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // intermediates are only kept when debugging
    let scratch = match ScratchSpace::new(settings.scratch_folder().as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while creating scratch folder: {e:#}");
            std::process::exit(exitcode::CANTCREAT);
        }
    };

    let layout = ReferenceLayout::new(&settings.reference_folder);
    let summary = match convert_genotypes(&settings.genotype_fn, &layout, settings.build, &settings.output_fn, &scratch, &config) {
        Ok(s) => s,
        Err(e) => {
            // exiting skips destructors
            drop(scratch);
            exit_with_report(e, settings.error_report_fn().as_deref())
        }
    };
    drop(scratch);
    info!("Converted {} {} records from {} into {} variants", summary.records_parsed, summary.dialect, summary.source_build, summary.variants_final);

    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        let summary_fn = debug_folder.join("conversion_summary.json");
        info!("Saving conversion summary to {summary_fn:?}...");
        if let Err(e) = save_json(&summary, &summary_fn) {
            error!("Error while saving conversion summary: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    info!("Conversion completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_score(settings: ScoreSettings) {
    // start the timer
    let start_time = Instant::now();
    init_logging(settings.verbosity);

    let settings = match check_score_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    prepare_debug_folder(settings.debug_folder.as_deref(), &settings);

    let chrom = match settings.chromosome.clone() {
        Some(c) => c,
        None => match extract_chromosome(&settings.imputed_fn) {
            Ok(c) => c,
            Err(e) => exit_with_report(e, Some(&settings.output_fn))
        }
    };

    let layout = ReferenceLayout::new(&settings.reference_folder)
        .with_weight_column(&settings.weight_column);
    let result = match score_imputed(&settings.imputed_fn, &layout, &chrom) {
        Ok(r) => r,
        Err(e) => exit_with_report(e, Some(&settings.output_fn))
    };

    info!("Saving score to {:?}...", settings.output_fn);
    if let Err(e) = save_json(&result, &settings.output_fn) {
        error!("Error while saving score: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Scoring completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_full(settings: RunSettings) {
    // start the timer
    let start_time = Instant::now();
    init_logging(settings.verbosity);

    let settings = match check_run_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    prepare_debug_folder(settings.debug_folder.as_deref(), &settings);

    let config = match settings.tools.collaborator_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Error while building collaborator config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // intermediates are only kept when debugging
    let kept_folder: Option<PathBuf> = settings.debug_folder.as_ref().map(|d| d.join("scratch"));
    let scratch = match ScratchSpace::new(kept_folder.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while creating scratch folder: {e:#}");
            std::process::exit(exitcode::CANTCREAT);
        }
    };

    let layout = ReferenceLayout::new(&settings.reference_folder)
        .with_weight_column(&settings.weight_column);
    let result = match run_pipeline(&settings.genotype_fn, &layout, settings.build, &scratch, &config) {
        Ok(r) => r,
        Err(e) => {
            // exiting skips destructors
            drop(scratch);
            exit_with_report(e, Some(&settings.output_fn))
        }
    };
    drop(scratch);

    info!("Saving score to {:?}...", settings.output_fn);
    if let Err(e) = save_json(&result, &settings.output_fn) {
        error!("Error while saving score: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Pipeline completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Convert(settings) => {
            run_convert(*settings);
        },
        Commands::Score(settings) => {
            run_score(*settings);
        },
        Commands::Run(settings) => {
            run_full(*settings);
        }
    }

    info!("Process finished successfully.");
}
