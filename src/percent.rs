/// Percentage change from `start` to `end`.
///
/// A non-positive `start` yields 0.0 instead of dividing by it.
pub fn percentage_change(start: f64, end: f64) -> f64 {
    if start <= 0.0 {
        return 0.0;
    }
    (end - start) / start * 100.0
}

/// Retracement of `price` below `peak`, in percent. Positive when
/// `price < peak`; 0.0 for a non-positive peak.
pub fn drawdown_pct(peak: f64, price: f64) -> f64 {
    if peak <= 0.0 {
        return 0.0;
    }
    (peak - price) / peak * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() <= eps,
            "expected {b}, got {a} (diff = {})",
            (a - b).abs()
        );
    }

    #[test]
    fn test_percentage_change_up_and_down() {
        approx_eq(percentage_change(100.0, 110.0), 10.0, 1e-9);
        approx_eq(percentage_change(100.0, 90.0), -10.0, 1e-9);
    }

    #[test]
    fn test_percentage_change_same_price_is_zero() {
        for p in [0.01, 1.0, 95.0, 12_345.678] {
            assert_eq!(percentage_change(p, p), 0.0);
        }
    }

    #[test]
    fn test_percentage_change_zero_or_negative_start_is_zero() {
        assert_eq!(percentage_change(0.0, 100.0), 0.0);
        assert_eq!(percentage_change(-5.0, 100.0), 0.0);
    }

    #[test]
    fn test_drawdown_pct_is_positive_below_peak() {
        approx_eq(drawdown_pct(200.0, 136.0), 32.0, 1e-9);
        approx_eq(drawdown_pct(200.0, 200.0), 0.0, 1e-9);
    }

    #[test]
    fn test_drawdown_pct_zero_peak_is_zero() {
        assert_eq!(drawdown_pct(0.0, 10.0), 0.0);
    }
}
