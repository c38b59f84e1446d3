use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::data::IntervalFamily;

/// Command-line configuration for the OHLC summary tool.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Compute technical summaries from OHLC CSV files and emit JSON reports.", long_about = None)]
pub struct AppConfig {
    /// Directory containing CSV files (used with --glob).
    #[arg(long = "input-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Glob pattern(s) selecting CSV files inside --input-dir.
    #[arg(long = "glob", num_args = 1.., default_values_t = vec![String::from("*.csv")])]
    pub glob_patterns: Vec<String>,

    /// Explicit CSV file paths or glob expressions.
    #[arg(long, num_args = 1..)]
    pub files: Vec<String>,

    /// Directory to write JSON analysis outputs.
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Optional TOML file overriding analysis tunables.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// IANA time zone used for session dates and calendar weeks.
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Number of support and resistance levels per side.
    #[arg(long)]
    pub levels: Option<usize>,

    /// Print a summary table once all files are processed.
    #[arg(long)]
    pub summary: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl AppConfig {
    /// Resolve the analysis tunables: defaults, then the TOML file, then CLI overrides.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_toml_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(levels) = self.levels {
            config.levels.level_count = levels;
        }
        Ok(config)
    }
}

/// Every tunable of the analysis engine, injected into each computation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub trend: TrendConfig,
    pub indicators: IndicatorConfig,
    pub moving_averages: MovingAverageConfig,
    pub levels: LevelConfig,
}

impl AnalysisConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {:?}", path))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub drift_weight: f64,
    pub slope_weight: f64,
    /// Blended score beyond which the series is called UP/DOWN.
    pub threshold: f64,
    pub min_window: usize,
    pub max_window: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            drift_weight: 0.6,
            slope_weight: 0.4,
            threshold: 0.002,
            min_window: 3,
            max_window: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            atr_period: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovingAverageConfig {
    pub sma_periods: Vec<usize>,
    pub slope_lookback: usize,
    pub slope_threshold: f64,
    pub strong_slope_threshold: f64,
    pub ema_periods: Vec<usize>,
    pub reaction_windows: ReactionWindows,
}

impl Default for MovingAverageConfig {
    fn default() -> Self {
        Self {
            sma_periods: vec![5, 13, 21],
            slope_lookback: 10,
            slope_threshold: 0.0005,
            strong_slope_threshold: 0.002,
            ema_periods: vec![25, 75, 90, 200],
            reaction_windows: ReactionWindows::default(),
        }
    }
}

/// Trailing bars scanned for EMA reactions, per interval family.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReactionWindows {
    pub intraday: usize,
    pub swing: usize,
    pub position: usize,
    pub other: usize,
}

impl Default for ReactionWindows {
    fn default() -> Self {
        Self {
            intraday: 24,
            swing: 30,
            position: 20,
            other: 20,
        }
    }
}

impl ReactionWindows {
    pub fn for_family(&self, family: IntervalFamily) -> usize {
        match family {
            IntervalFamily::Intraday => self.intraday,
            IntervalFamily::Swing => self.swing,
            IntervalFamily::Position => self.position,
            IntervalFamily::Other => self.other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Maximum levels reported per side.
    pub level_count: usize,
    pub intraday_lookback: usize,
    pub swing_lookback: usize,
    pub position_lookback: usize,
    /// Bars after a session extreme that must stay strictly inside it.
    pub intraday_reversal_window: usize,
    /// Consecutive follow-through candles confirming a daily reversal.
    pub position_reversal_candles: usize,
    /// Fixed price tolerance merging four-hour fallback extremes.
    pub swing_merge_tolerance: f64,
    /// Position candidates farther than this many ATRs from the last close are dropped.
    pub guardrail_atr_multiplier: f64,
    /// Candidate clustering tolerance in ATR multiples.
    pub cluster_tolerance_atr: f64,
    pub price_decimals: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            level_count: 2,
            intraday_lookback: 240,
            swing_lookback: 84,
            position_lookback: 60,
            intraday_reversal_window: 5,
            position_reversal_candles: 3,
            swing_merge_tolerance: 0.05,
            guardrail_atr_multiplier: 5.0,
            cluster_tolerance_atr: 0.15,
            price_decimals: 4,
        }
    }
}

impl LevelConfig {
    pub fn lookback(&self, family: IntervalFamily) -> Option<usize> {
        match family {
            IntervalFamily::Intraday => Some(self.intraday_lookback),
            IntervalFamily::Swing => Some(self.swing_lookback),
            IntervalFamily::Position => Some(self.position_lookback),
            IntervalFamily::Other => None,
        }
    }
}
