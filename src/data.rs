use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One row of an end-of-day price file.
///
/// Matches both the plain CSV layout (`date,open,high,low,close[,volume]`)
/// and the EODHD JSON array shape. Extra columns such as `adjusted_close`
/// are ignored.
#[derive(Debug, Deserialize)]
pub struct PriceRow {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// One trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl TryFrom<PriceRow> for Bar {
    type Error = anyhow::Error;

    fn try_from(row: PriceRow) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .with_context(|| format!("failed to parse date: {}", row.date))?;
        Ok(Self {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,

    #[error("non-finite {field} price at index {index}")]
    NonFinite { index: usize, field: &'static str },
}

/// Reject series the scanner cannot reason about.
///
/// Ordering is not checked here: callers sort with [`sort_series`].
pub fn validate_series(bars: &[Bar]) -> Result<(), SeriesError> {
    if bars.is_empty() {
        return Err(SeriesError::Empty);
    }

    for (index, bar) in bars.iter().enumerate() {
        let fields = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ];
        if let Some((field, _)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(SeriesError::NonFinite { index, field });
        }
    }

    Ok(())
}

/// Ascending by date. The sort is stable, so duplicate dates keep their
/// input order.
pub fn sort_series(bars: &[Bar]) -> Vec<Bar> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|b| b.date);
    sorted
}

/// The tail of a sorted series dated within `years` (of 365 days) before
/// its last bar. `years == 0` keeps everything.
pub fn trim_to_lookback(bars: &[Bar], years: u32) -> &[Bar] {
    let Some(last) = bars.last() else {
        return bars;
    };
    if years == 0 {
        return bars;
    }
    let Some(cutoff) = last.date.checked_sub_days(Days::new(u64::from(years) * 365)) else {
        return bars;
    };

    let first = bars.partition_point(|b| b.date < cutoff);
    &bars[first..]
}

/// Mean volume over the bars that report one.
pub fn average_volume(bars: &[Bar]) -> Option<f64> {
    let (sum, count) = bars
        .iter()
        .filter_map(|b| b.volume)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    (count > 0).then(|| sum / count as f64)
}

pub fn get_bars_from_csv(input: &Path) -> Result<Vec<Bar>> {
    let file =
        File::open(input).with_context(|| format!("failed to open input file: {:?}", input))?;

    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut bars: Vec<Bar> = Vec::new();

    for result in rdr.deserialize::<PriceRow>() {
        let row: PriceRow = result.with_context(|| "failed to deserialize CSV row")?;
        bars.push(Bar::try_from(row)?);
    }
    Ok(bars)
}

pub fn get_bars_from_json(input: &Path) -> Result<Vec<Bar>> {
    let file =
        File::open(input).with_context(|| format!("failed to open input file: {:?}", input))?;

    let rows: Vec<PriceRow> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to deserialize JSON bars from {:?}", input))?;

    rows.into_iter().map(Bar::try_from).collect()
}

/// Load bars from `input`, choosing the parser by file extension
/// (`.json` for EODHD-style arrays, anything else as CSV).
pub fn get_bars_from_input_file(input: &Path) -> Result<Vec<Bar>> {
    let is_json = input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        get_bars_from_json(input)
    } else {
        get_bars_from_csv(input)
    }
}

/// `data/aapl.csv` -> `AAPL`
pub fn ticker_from_path(input: &Path) -> Option<String> {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_uppercase())
}
