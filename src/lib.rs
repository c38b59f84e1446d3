//! Technical-analysis summaries for cleaned OHLC series: trend, support and
//! resistance levels, RSI/ATR/volatility, and moving-average features.
//!
//! The engine is synchronous and stateless. Every entry point takes a [`data::Series`]
//! and an injected [`config::AnalysisConfig`] and returns plain values.

pub mod analysis;
pub mod config;
pub mod data;
pub mod loader;
pub mod output;

pub use analysis::{analyze_series, analyze_series_at, compute_support_resistance};
pub use config::AnalysisConfig;
pub use data::{AnalysisResult, Bar, Series};
