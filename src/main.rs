use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use kline_summary::analysis::analyze_series;
use kline_summary::config::{AnalysisConfig, AppConfig};
use kline_summary::data::AnalysisResult;
use kline_summary::loader::{collect_input_files, load_series_from_csv, parse_metadata_from_filename};
use kline_summary::output::{analysis_path, print_summary, write_analysis};

fn main() -> Result<()> {
    let config = AppConfig::parse();
    init_logging(config.verbose);
    run(&config)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(config: &AppConfig) -> Result<()> {
    let tz: Tz = config
        .timezone
        .parse()
        .map_err(|err| anyhow!("invalid --timezone {:?}: {err}", config.timezone))?;
    let analysis_config = config.analysis_config()?;

    let input_files = collect_input_files(
        config.input_dir.as_deref(),
        &config.glob_patterns,
        &config.files,
    )?;
    if input_files.is_empty() {
        bail!("no CSV files found; provide --input-dir/--glob or --files");
    }

    let mut results = Vec::new();
    for csv_path in &input_files {
        let is_csv = csv_path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            debug!(path = %csv_path.display(), "skipping non-CSV file");
            continue;
        }

        let result = match analyze_file(csv_path, &analysis_config, tz) {
            Ok(result) => result,
            Err(err) => {
                error!(path = %csv_path.display(), "failed to analyze: {err:#}");
                continue;
            }
        };

        let output_path = analysis_path(&config.output_dir, csv_path);
        if let Err(err) = write_analysis(&result, &output_path) {
            error!(path = %output_path.display(), "failed to write analysis: {err:#}");
            continue;
        }
        info!(
            input = %csv_path.display(),
            output = %output_path.display(),
            "wrote analysis"
        );
        results.push(result);
    }

    if results.is_empty() {
        warn!("no analysis files were written");
        bail!("no analysis files were written");
    }
    info!(
        count = results.len(),
        dir = %config.output_dir.display(),
        "generated analysis files"
    );

    if config.summary {
        print_summary(&results);
    }
    Ok(())
}

fn analyze_file(path: &Path, config: &AnalysisConfig, tz: Tz) -> Result<AnalysisResult> {
    let meta = parse_metadata_from_filename(path)?;
    let series = load_series_from_csv(path, tz)
        .with_context(|| format!("failed to load input data from {:?}", path))?;
    Ok(analyze_series(
        &series,
        &meta.pair,
        &meta.interval,
        &meta.period,
        config,
        tz,
    ))
}
