//! Screens daily OHLC history for growth moves: runs from a low to a later
//! peak that stay within drawdown and duration limits, classified as
//! Growth or Superperformance by magnitude and duration.

pub mod analyzer;
pub mod candidates;
pub mod classify;
pub mod config;
pub mod data;
pub mod output;
pub mod percent;
pub mod telemetry;
pub mod tracker;

pub use analyzer::{Analyzer, ScreenedMove, TickerReport, TickerSeries, filter_valid_moves};
pub use classify::{Classification, ClassificationThresholds, classify};
pub use config::{ConfigError, ScreenerConfig};
pub use data::{Bar, SeriesError};
pub use tracker::{DrawdownEpisode, GrowthMove, ScanEnd, track_move};
