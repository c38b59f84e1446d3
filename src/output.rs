use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tabled::{settings::Style, Table, Tabled};

use crate::data::AnalysisResult;

/// `<output_dir>/<stem>_analysis.json` for an input file.
pub fn analysis_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "series".to_string());
    output_dir.join(format!("{stem}_analysis.json"))
}

/// Write the analysis as pretty-printed JSON, creating parent directories.
pub fn write_analysis(result: &AnalysisResult, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {:?}", parent))?;
    }
    let file = File::create(destination)
        .with_context(|| format!("failed to create {:?}", destination))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)
        .with_context(|| format!("failed to serialize analysis to {:?}", destination))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_analysis(path: &Path) -> Result<AnalysisResult> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid analysis document {:?}", path))
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Pair")]
    pair: String,
    #[tabled(rename = "Interval")]
    interval: String,
    #[tabled(rename = "Trend")]
    trend: String,
    #[tabled(rename = "Supports")]
    supports: String,
    #[tabled(rename = "Resistances")]
    resistances: String,
    #[tabled(rename = "RSI")]
    rsi: String,
    #[tabled(rename = "ATR")]
    atr: String,
    #[tabled(rename = "SMA Order")]
    ordering: String,
}

fn join_levels(levels: &[f64]) -> String {
    if levels.is_empty() {
        return "-".to_string();
    }
    levels
        .iter()
        .map(|level| format!("{level:.4}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn optional(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

pub fn render_summary(results: &[AnalysisResult]) -> String {
    let rows: Vec<SummaryRow> = results
        .iter()
        .map(|result| SummaryRow {
            pair: result.pair.clone(),
            interval: result.interval.clone(),
            trend: format!("{:?}", result.trend).to_uppercase(),
            supports: join_levels(&result.support_levels),
            resistances: join_levels(&result.resistance_levels),
            rsi: optional(result.rsi, 2),
            atr: optional(result.atr, 4),
            ordering: result
                .sma
                .ordering
                .map_or_else(|| "-".to_string(), |o| format!("{o:?}").to_lowercase()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn print_summary(results: &[AnalysisResult]) {
    if results.is_empty() {
        println!("No analyses to summarise.");
        return;
    }
    println!("\n=== OHLC Technical Summary ===\n");
    println!("{}\n", render_summary(results));
}
