use chrono::NaiveDate;
use serde::Serialize;

use crate::data::Bar;
use crate::percent::percentage_change;

/// A possible move start: a bar whose low is followed by a quick upswing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub date: NaiveDate,
    pub low_price: f64,
    pub short_term_growth_pct: f64,
    pub index: usize,
}

/// Find candidate move starts.
///
/// Index `i` qualifies when the best high of the next `window` bars is at
/// least `min_growth_pct` above `low[i]`. Only `i < n - window` is tested.
/// No local-minimum check is made on `low[i]` itself.
///
/// Expects `bars` sorted by date.
pub fn find_candidates(bars: &[Bar], window: usize, min_growth_pct: f64) -> Vec<Candidate> {
    if window == 0 || bars.len() <= window {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    for i in 0..bars.len() - window {
        let current_low = bars[i].low;
        let max_future_high = bars[i + 1..=i + window]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);

        let growth = percentage_change(current_low, max_future_high);
        if growth >= min_growth_pct {
            candidates.push(Candidate {
                date: bars[i].date,
                low_price: current_low,
                short_term_growth_pct: growth,
                index: i,
            });
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_series(n: usize, price: f64) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n)
            .map(|i| Bar {
                date: start + chrono::Days::new(i as u64),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: None,
            })
            .collect()
    }

    #[test]
    fn test_find_candidates_short_series_is_empty() {
        // need at least window + 1 bars
        let bars = flat_series(5, 100.0);
        assert!(find_candidates(&bars, 5, 5.0).is_empty());
    }

    #[test]
    fn test_find_candidates_flat_series_has_none() {
        let bars = flat_series(30, 100.0);
        assert!(find_candidates(&bars, 5, 5.0).is_empty());
    }

    #[test]
    fn test_find_candidates_detects_low_followed_by_upswing() {
        let mut bars = flat_series(12, 100.0);
        bars[5].low = 95.0;
        for b in &mut bars[6..=10] {
            b.high = 110.0;
        }

        let candidates = find_candidates(&bars, 5, 5.0);
        let at_five = candidates
            .iter()
            .find(|c| c.index == 5)
            .expect("candidate at index 5");

        assert_eq!(at_five.low_price, 95.0);
        assert_eq!(at_five.date, bars[5].date);
        assert!(at_five.short_term_growth_pct >= 5.0);
    }

    #[test]
    fn test_find_candidates_does_not_require_local_minimum() {
        // bar 1's low (100) is above bar 0's low (90), still a candidate
        let mut bars = flat_series(10, 100.0);
        bars[0].low = 90.0;
        bars[3].high = 106.0;

        let indices: Vec<usize> = find_candidates(&bars, 5, 5.0)
            .iter()
            .map(|c| c.index)
            .collect();

        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_find_candidates_threshold_is_inclusive() {
        let mut bars = flat_series(7, 100.0);
        bars[5].high = 105.0;

        let indices: Vec<usize> = find_candidates(&bars, 5, 5.0)
            .iter()
            .map(|c| c.index)
            .collect();

        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_find_candidates_upswing_outside_window_is_ignored() {
        let mut bars = flat_series(10, 100.0);
        // six bars after index 0, outside a 5-bar window
        bars[6].high = 200.0;

        let indices: Vec<usize> = find_candidates(&bars, 5, 5.0)
            .iter()
            .map(|c| c.index)
            .collect();

        assert!(!indices.contains(&0));
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_find_candidates_zero_low_never_qualifies() {
        let mut bars = flat_series(8, 100.0);
        bars[0].low = 0.0;
        assert!(find_candidates(&bars, 5, 5.0).is_empty());
    }
}
