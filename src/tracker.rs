use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::classify::{Classification, classify};
use crate::config::ScreenerConfig;
use crate::data::Bar;
use crate::percent::{drawdown_pct, percentage_change};

/// A close-to-peak retracement inside the drawdown band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownEpisode {
    pub date: NaiveDate,
    pub drawdown_pct: f64,
    /// Close on the day the episode was recorded
    pub price: f64,
}

/// Why the forward scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanEnd {
    /// Ran out of bars
    Exhausted,
    /// Next bar was past the total duration limit
    DurationLimit,
    /// A low broke below the starting low
    BelowStartLow,
    /// Close retraced past the maximum drawdown
    MaxDrawdown,
    /// Too many bars without a new high
    Stagnation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthMove {
    pub ticker: String,
    pub start_date: NaiveDate,
    /// Peak date
    pub end_date: NaiveDate,
    /// Low of the start bar
    pub start_price: f64,
    pub peak_price: f64,
    pub growth_pct: f64,
    pub duration_days: i64,
    pub drawdown_episodes: Vec<DrawdownEpisode>,
    pub continuation_occurred: bool,
    /// Lowest recorded episode close, captured when continuation fires
    pub lowest_price_during_drawdown: Option<f64>,
    pub classification: Classification,
    pub scan_end: ScanEnd,
}

/// Accumulator for one forward scan.
struct MoveState {
    start_date: NaiveDate,
    start_price: f64,
    peak_price: f64,
    peak_date: NaiveDate,
    days_without_new_high: u32,
    drawdown_episodes: Vec<DrawdownEpisode>,
    /// Peak date when the latest drawdown episode was recorded
    drawdown_peak_date: Option<NaiveDate>,
    continuation_occurred: bool,
    lowest_price_during_drawdown: Option<f64>,
}

impl MoveState {
    fn new(start: &Bar) -> Self {
        Self {
            start_date: start.date,
            start_price: start.low,
            peak_price: start.low,
            peak_date: start.date,
            days_without_new_high: 0,
            drawdown_episodes: Vec::new(),
            drawdown_peak_date: None,
            continuation_occurred: false,
            lowest_price_during_drawdown: None,
        }
    }

    /// Process one bar. Returns the stop reason if the bar ends the scan,
    /// in which case the bar leaves the state untouched.
    fn step(&mut self, bar: &Bar, cfg: &ScreenerConfig) -> Option<ScanEnd> {
        let days_since_start = (bar.date - self.start_date).num_days();
        if days_since_start > cfg.max_total_days {
            return Some(ScanEnd::DurationLimit);
        }

        let new_high = bar.high > self.peak_price;
        let (peak_price, peak_date, days_without_new_high) = if new_high {
            (bar.high, bar.date, 0)
        } else {
            (
                self.peak_price,
                self.peak_date,
                self.days_without_new_high + 1,
            )
        };

        let current_drawdown = drawdown_pct(peak_price, bar.close);

        if bar.low < self.start_price {
            return Some(ScanEnd::BelowStartLow);
        }
        if current_drawdown >= cfg.max_drawdown_pct {
            return Some(ScanEnd::MaxDrawdown);
        }
        if days_without_new_high >= cfg.max_days_without_high {
            return Some(ScanEnd::Stagnation);
        }

        self.peak_price = peak_price;
        self.peak_date = peak_date;
        self.days_without_new_high = days_without_new_high;

        // a new high only continues a drawdown recorded on an earlier bar
        let drawdown_peak_date = self.drawdown_peak_date;
        if (cfg.min_drawdown_pct..cfg.max_drawdown_pct).contains(&current_drawdown) {
            self.record_drawdown(bar, current_drawdown);
        }

        let within_window = drawdown_peak_date.is_some_and(|peak_date| {
            (bar.date - peak_date).num_days() <= cfg.continuation_window_days
        });
        if new_high && !self.continuation_occurred && within_window {
            self.continuation_occurred = true;
            self.lowest_price_during_drawdown = self
                .drawdown_episodes
                .iter()
                .map(|e| e.price)
                .reduce(f64::min);
        }

        None
    }

    /// Only the last recorded episode is compared: an observation one
    /// calendar day after it is the same episode, any larger gap starts a
    /// new one even if the drawdown never left the band.
    fn record_drawdown(&mut self, bar: &Bar, current_drawdown: f64) {
        let starts_new_episode = self
            .drawdown_episodes
            .last()
            .is_none_or(|last| (bar.date - last.date).num_days() > 1);

        if starts_new_episode {
            self.drawdown_peak_date = Some(self.peak_date);
            self.drawdown_episodes.push(DrawdownEpisode {
                date: bar.date,
                drawdown_pct: current_drawdown,
                price: bar.close,
            });
        }
    }

    fn into_move(
        self,
        ticker: &str,
        cfg: &ScreenerConfig,
        scan_end: ScanEnd,
    ) -> Option<GrowthMove> {
        if self.peak_price <= self.start_price {
            return None;
        }

        let growth_pct = percentage_change(self.start_price, self.peak_price);
        let duration_days = (self.peak_date - self.start_date).num_days();
        let classification = classify(growth_pct, duration_days, &cfg.thresholds());

        Some(GrowthMove {
            ticker: ticker.to_string(),
            start_date: self.start_date,
            end_date: self.peak_date,
            start_price: self.start_price,
            peak_price: self.peak_price,
            growth_pct,
            duration_days,
            drawdown_episodes: self.drawdown_episodes,
            continuation_occurred: self.continuation_occurred,
            lowest_price_during_drawdown: self.lowest_price_during_drawdown,
            classification,
            scan_end,
        })
    }
}

/// Track a move starting at the low of `bars[start]`.
///
/// Scans forward one bar at a time until a stop condition or the end of
/// the series, then evaluates the accumulated peak. Returns `None` when no
/// later high ever exceeded the starting low.
///
/// Expects `bars` sorted by date.
pub fn track_move(
    ticker: &str,
    bars: &[Bar],
    start: usize,
    cfg: &ScreenerConfig,
) -> Option<GrowthMove> {
    let start_bar = bars.get(start)?;
    let mut state = MoveState::new(start_bar);

    let mut scan_end = ScanEnd::Exhausted;
    for bar in &bars[start + 1..] {
        if let Some(end) = state.step(bar, cfg) {
            debug!(ticker, start = %start_bar.date, stopped = %bar.date, reason = ?end, "scan stopped");
            scan_end = end;
            break;
        }
    }

    state.into_move(ticker, cfg, scan_end)
}
