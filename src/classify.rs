use serde::Serialize;

use std::fmt;

/// Short duration bucket, inclusive
pub const SHORT_BUCKET_DAYS: (i64, i64) = (64, 252);
/// Long duration bucket, inclusive
pub const LONG_BUCKET_DAYS: (i64, i64) = (253, 504);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    None,
    Growth,
    Superperformance,
}

impl Classification {
    /// Growth or Superperformance
    pub fn is_qualifying(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::Growth => "Growth",
            Self::Superperformance => "Superperformance",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    pub growth_short_pct: f64,
    pub superperformance_short_pct: f64,
    pub growth_long_pct: f64,
    pub superperformance_long_pct: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            growth_short_pct: 100.0,
            superperformance_short_pct: 300.0,
            growth_long_pct: 150.0,
            superperformance_long_pct: 500.0,
        }
    }
}

/// Classify a move by magnitude within its duration bucket.
///
/// Durations outside both buckets are always `None`, however large the
/// growth. Superperformance is checked first.
pub fn classify(
    growth_pct: f64,
    duration_days: i64,
    thresholds: &ClassificationThresholds,
) -> Classification {
    let (growth, superperformance) = if (SHORT_BUCKET_DAYS.0..=SHORT_BUCKET_DAYS.1)
        .contains(&duration_days)
    {
        (
            thresholds.growth_short_pct,
            thresholds.superperformance_short_pct,
        )
    } else if (LONG_BUCKET_DAYS.0..=LONG_BUCKET_DAYS.1).contains(&duration_days) {
        (
            thresholds.growth_long_pct,
            thresholds.superperformance_long_pct,
        )
    } else {
        return Classification::None;
    };

    if growth_pct >= superperformance {
        Classification::Superperformance
    } else if growth_pct >= growth {
        Classification::Growth
    } else {
        Classification::None
    }
}
