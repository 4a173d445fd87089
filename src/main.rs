//! Mend CLI - automated program repair driver.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mend::cli::Cli;
use mend::config::Config;
use mend::core::{Error, Result};
use mend::mutate::HistoricalFreqs;
use mend::output::write_summary;
use mend::pipeline::Pipeline;
use mend::validate::Validator;
use mend::{Extractor, MutationEngine, Prioritizer, SbflReader};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            warn!("pipeline completed without a validated patch");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the pipeline; Ok(true) means at least one candidate passed both
/// phases.
fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(&cli.repo)?,
    };

    // CLI flags override the config file.
    if let Some(top_k) = cli.top_k {
        config.validation.max_patches_to_validate = top_k;
    }
    if let Some(minutes) = cli.time_budget {
        config.validation.time_budget_minutes = minutes;
    }
    if cli.no_early_exit {
        config.validation.enable_early_exit = false;
    }

    if !cli.sbfl_json.exists() {
        return Err(Error::InvalidArgument(format!(
            "SBFL results not found: {}",
            cli.sbfl_json.display()
        )));
    }
    if !cli.freq_json.exists() {
        return Err(Error::InvalidArgument(format!(
            "frequency table not found: {}",
            cli.freq_json.display()
        )));
    }

    let repo_metadata = cli.repository_metadata();
    if repo_metadata.source_files.is_empty() {
        return Err(Error::InvalidArgument(
            "no source files found; pass --source or create <repo>/src".to_string(),
        ));
    }

    info!(
        repo = %repo_metadata.repo_path.display(),
        sources = repo_metadata.source_files.len(),
        failing_tests = repo_metadata.failing_tests.len(),
        "starting repair pipeline"
    );

    let freqs = HistoricalFreqs::load(&cli.freq_json)?;
    if freqs.is_empty() {
        warn!("frequency table is empty; no mutation rules will fire");
    }

    let pipeline = Pipeline::new()
        .fault_reader(SbflReader::new(config.fault.path_marker.clone()))
        .extractor(Extractor::new())
        .generator(MutationEngine::new(freqs.clone()))
        .ranker(Prioritizer::new(freqs))
        .validator(Validator::new(config.validation.clone()));

    let spinner = progress_spinner();
    let state = pipeline.run(&repo_metadata, &cli.sbfl_json);
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    let state = state?;

    std::fs::create_dir_all(&cli.output_dir)?;
    let output_file = cli.output_dir.join("pipeline_results.json");
    write_summary(&state, &output_file)?;
    info!(output = %output_file.display(), "results saved");

    info!(
        suspicious_locations = state.suspicious_locations.len(),
        patch_candidates = state.patch_candidates.len(),
        validated = state.validation_results.len(),
        fixes = state.validated_fix_count(),
        "pipeline completed"
    );

    Ok(state.validated_fix_count() > 0)
}

/// Show a spinner while the pipeline runs, when stderr is a terminal.
fn progress_spinner() -> Option<ProgressBar> {
    use std::io::IsTerminal;
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("repairing...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}
