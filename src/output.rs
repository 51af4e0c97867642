use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;

use std::io::Write;
use std::path::Path;

use crate::analyzer::{ScreenedMove, TickerReport};

pub const SHEET_HEADERS: [&str; 6] = [
    "Ticker",
    "Start Date",
    "End Date",
    "Superperformance",
    "Drawdowns",
    "Continuation",
];

/// One spreadsheet row per move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date")]
    pub end_date: String,
    #[serde(rename = "Superperformance")]
    pub superperformance: String,
    #[serde(rename = "Drawdowns")]
    pub drawdowns: String,
    #[serde(rename = "Continuation")]
    pub continuation: String,
}

pub fn format_output_row(m: &ScreenedMove) -> SheetRow {
    let drawdowns = if m.drawdowns_formatted.is_empty() {
        "none".to_string()
    } else {
        m.drawdowns_formatted.join(", ")
    };

    SheetRow {
        ticker: m.growth_move.ticker.clone(),
        start_date: m.start_date_formatted.clone(),
        end_date: m.end_date_formatted.clone(),
        superperformance: m.superperformance_formatted.to_string(),
        drawdowns,
        continuation: m.continuation_formatted.to_string(),
    }
}

pub fn print_moves(reports: &[TickerReport]) {
    let moves: Vec<&ScreenedMove> = reports.iter().flat_map(|r| r.moves.iter()).collect();

    println!("{}", "=".repeat(80));
    println!("GROWTH SCREENER RESULTS - {} MOVES FOUND", moves.len());
    println!("{}", "=".repeat(80));

    for (i, m) in moves.iter().enumerate() {
        let gm = &m.growth_move;
        println!();
        println!("{}. {} - {}", i + 1, gm.ticker, gm.classification);
        println!(
            "   Period:       {} to {} ({} days)",
            m.start_date_formatted, m.end_date_formatted, gm.duration_days
        );
        println!(
            "   Move:         {:.2} -> {:.2} ({:.2}%)",
            gm.start_price, gm.peak_price, gm.growth_pct
        );
        if !m.drawdowns_formatted.is_empty() {
            println!("   Drawdowns:    {}", m.drawdowns_formatted.join(", "));
        }
        println!("   Continuation: {}", m.continuation_formatted);
        if let Some(low) = gm.lowest_price_during_drawdown {
            println!("   Drawdown low: {:.2}", low);
        }
    }

    println!();
    println!("{}", "=".repeat(80));
}

/// Write all moves as sheet rows. Headers are written even when there
/// are no moves.
pub fn write_sheet<W: Write>(writer: W, reports: &[TickerReport]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(SHEET_HEADERS)
        .context("failed to write sheet headers")?;

    for m in reports.iter().flat_map(|r| r.moves.iter()) {
        wtr.serialize(format_output_row(m))
            .with_context(|| format!("failed to write row for {}", m.growth_move.ticker))?;
    }

    wtr.flush().context("failed to flush sheet")?;
    Ok(())
}

pub fn write_sheet_file(path: &Path, reports: &[TickerReport]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create output file: {:?}", path))?;
    write_sheet(file, reports)
}

pub fn print_json(reports: &[TickerReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(reports).context("failed to serialize reports")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::tracker::{DrawdownEpisode, GrowthMove, ScanEnd};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn screened(drawdowns: &[NaiveDate], classification: Classification) -> ScreenedMove {
        ScreenedMove::new(GrowthMove {
            ticker: "TEST".to_string(),
            start_date: date(2019, 1, 1),
            end_date: date(2019, 6, 1),
            start_price: 10.0,
            peak_price: 25.0,
            growth_pct: 150.0,
            duration_days: 151,
            drawdown_episodes: drawdowns
                .iter()
                .map(|&d| DrawdownEpisode {
                    date: d,
                    drawdown_pct: 20.0,
                    price: 18.0,
                })
                .collect(),
            continuation_occurred: false,
            lowest_price_during_drawdown: None,
            classification,
            scan_end: ScanEnd::Exhausted,
        })
    }

    #[test]
    fn test_format_output_row() {
        let m = screened(
            &[date(2019, 3, 15), date(2019, 4, 20)],
            Classification::Growth,
        );

        let row = format_output_row(&m);

        assert_eq!(row.ticker, "TEST");
        assert_eq!(row.start_date, "Jan 01, 2019");
        assert_eq!(row.end_date, "Jun 01, 2019");
        assert_eq!(row.superperformance, "Yes");
        assert_eq!(row.drawdowns, "Mar 15, 2019, Apr 20, 2019");
        assert_eq!(row.continuation, "No");
    }

    #[test]
    fn test_format_output_row_without_drawdowns_says_none() {
        let row = format_output_row(&screened(&[], Classification::Superperformance));
        assert_eq!(row.drawdowns, "none");
    }

    #[test]
    fn test_write_sheet_emits_headers_and_rows() {
        let reports = vec![TickerReport {
            ticker: "TEST".to_string(),
            moves: vec![screened(&[], Classification::Growth)],
        }];

        let mut buf = Vec::new();
        write_sheet(&mut buf, &reports).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Ticker,Start Date,End Date,Superperformance,Drawdowns,Continuation"
        );
        assert_eq!(lines[1], "TEST,\"Jan 01, 2019\",\"Jun 01, 2019\",Yes,none,No");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_write_sheet_with_no_moves_has_only_headers() {
        let mut buf = Vec::new();
        write_sheet(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }
}
