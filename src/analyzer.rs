use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use std::collections::HashMap;

use crate::candidates::find_candidates;
use crate::config::ScreenerConfig;
use crate::data::{Bar, average_volume, sort_series, trim_to_lookback, validate_series};
use crate::tracker::{GrowthMove, track_move};

pub const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y";

/// `2019-06-27` -> `Jun 27, 2019`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// A tracked move plus its human-readable fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenedMove {
    #[serde(flatten)]
    pub growth_move: GrowthMove,
    pub start_date_formatted: String,
    pub end_date_formatted: String,
    pub drawdowns_formatted: Vec<String>,
    pub continuation_formatted: &'static str,
    pub superperformance_formatted: &'static str,
}

impl ScreenedMove {
    pub fn new(growth_move: GrowthMove) -> Self {
        let drawdowns_formatted = growth_move
            .drawdown_episodes
            .iter()
            .map(|e| format_date(e.date))
            .collect();

        Self {
            start_date_formatted: format_date(growth_move.start_date),
            end_date_formatted: format_date(growth_move.end_date),
            drawdowns_formatted,
            continuation_formatted: yes_no(growth_move.continuation_occurred),
            superperformance_formatted: yes_no(growth_move.classification.is_qualifying()),
            growth_move,
        }
    }
}

/// Keep only Growth and Superperformance moves, in their original order.
pub fn filter_valid_moves(moves: Vec<ScreenedMove>) -> Vec<ScreenedMove> {
    moves
        .into_iter()
        .filter(|m| m.growth_move.classification.is_qualifying())
        .collect()
}

/// Identifies one analysis request: the ticker and the span of bars it
/// was given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    ticker: String,
    first: NaiveDate,
    last: NaiveDate,
    len: usize,
}

impl CacheKey {
    fn new(ticker: &str, bars: &[Bar]) -> Option<Self> {
        let first = bars.iter().map(|b| b.date).min()?;
        let last = bars.iter().map(|b| b.date).max()?;
        Some(Self {
            ticker: ticker.to_string(),
            first,
            last,
            len: bars.len(),
        })
    }
}

/// Runs the candidate finder and the move tracker over one series at a
/// time. Each instance owns its cache; share nothing between threads.
#[derive(Debug)]
pub struct Analyzer {
    config: ScreenerConfig,
    cache: HashMap<CacheKey, Vec<ScreenedMove>>,
}

impl Analyzer {
    pub fn new(config: ScreenerConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// All moves found in `bars`, unfiltered.
    ///
    /// Only the last `lookback_years` of the series are scanned. A series
    /// that fails validation, or whose average reported volume over that
    /// window is below `min_daily_volume`, yields no moves. Candidates
    /// closer than `dedup_window` bars to an accepted move's start are
    /// skipped.
    pub fn analyze_stock(&self, ticker: &str, bars: &[Bar]) -> Vec<ScreenedMove> {
        if let Err(err) = validate_series(bars) {
            warn!(ticker, %err, "skipping series");
            return Vec::new();
        }

        let sorted = sort_series(bars);
        let bars = trim_to_lookback(&sorted, self.config.lookback_years);

        if let Some(volume) = average_volume(bars)
            && volume < self.config.min_daily_volume
        {
            info!(
                ticker,
                volume,
                min = self.config.min_daily_volume,
                "skipping illiquid series"
            );
            return Vec::new();
        }

        let candidates = find_candidates(
            bars,
            self.config.short_term_window,
            self.config.min_short_term_growth_pct,
        );
        debug!(ticker, bars = bars.len(), candidates = candidates.len(), "candidates found");

        let mut accepted: Vec<usize> = Vec::new();
        let mut moves = Vec::new();

        for candidate in &candidates {
            if accepted
                .iter()
                .any(|&idx| candidate.index.abs_diff(idx) < self.config.dedup_window)
            {
                continue;
            }

            let Some(growth_move) = track_move(ticker, bars, candidate.index, &self.config)
            else {
                continue;
            };

            debug!(
                ticker,
                start = %growth_move.start_date,
                peak = %growth_move.end_date,
                growth_pct = growth_move.growth_pct,
                classification = %growth_move.classification,
                "move tracked"
            );
            accepted.push(candidate.index);
            moves.push(ScreenedMove::new(growth_move));
        }

        moves
    }

    /// [`Analyzer::analyze_stock`] behind a read-through cache keyed by
    /// ticker and bar span. Entries live as long as the analyzer.
    pub fn analyze_cached(&mut self, ticker: &str, bars: &[Bar]) -> Vec<ScreenedMove> {
        let Some(key) = CacheKey::new(ticker, bars) else {
            return self.analyze_stock(ticker, bars);
        };

        if let Some(moves) = self.cache.get(&key) {
            debug!(ticker, "analysis cache hit");
            return moves.clone();
        }

        let moves = self.analyze_stock(ticker, bars);
        self.cache.insert(key, moves.clone());
        moves
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

/// Bars for one instrument.
#[derive(Debug, Clone)]
pub struct TickerSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub moves: Vec<ScreenedMove>,
}

/// Screen many tickers in parallel, one [`Analyzer`] per worker.
///
/// Reports come back in input order. With `include_unclassified` moves
/// classified as None are kept.
pub fn screen_parallel(
    config: ScreenerConfig,
    inputs: &[TickerSeries],
    include_unclassified: bool,
) -> Vec<TickerReport> {
    inputs
        .par_iter()
        .map_init(
            || Analyzer::new(config),
            |analyzer, input| {
                let moves = analyzer.analyze_cached(&input.ticker, &input.bars);
                let moves = if include_unclassified {
                    moves
                } else {
                    filter_valid_moves(moves)
                };
                info!(ticker = %input.ticker, moves = moves.len(), "ticker screened");
                TickerReport {
                    ticker: input.ticker.clone(),
                    moves,
                }
            },
        )
        .collect()
}
