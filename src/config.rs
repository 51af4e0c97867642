use serde::Deserialize;

use std::path::PathBuf;

use crate::classify::ClassificationThresholds;

const ENV_PREFIX: &str = "SCREENER";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file path is not valid UTF-8")]
    FilePathIntoString,

    #[error("failed to build settings: {0}")]
    SettingsInit(String),

    #[error("failed to deserialize settings: {0}")]
    Deserialize(String),

    #[error("invalid parameter {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Screening parameters. Every key is optional; missing keys take the
/// defaults from [`ScreenerConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Minimum growth (%) from a bar's low to the best high of the
    /// following `short_term_window` bars for the bar to be a candidate.
    pub min_short_term_growth_pct: f64,

    /// Lookahead window in trading days (bars)
    pub short_term_window: usize,

    /// Close-to-peak retracement (%) at which a drawdown episode is recorded
    pub min_drawdown_pct: f64,

    /// Close-to-peak retracement (%) that ends a move
    pub max_drawdown_pct: f64,

    /// Bars without a new high that end a move
    pub max_days_without_high: u32,

    /// Calendar days after the start beyond which the scan stops
    pub max_total_days: i64,

    /// Calendar days after the peak at the latest drawdown in which a new high counts as continuation
    pub continuation_window_days: i64,

    /// Growth threshold (%) for 64-252 day moves
    pub growth_short_pct: f64,

    /// Superperformance threshold (%) for 64-252 day moves
    pub superperformance_short_pct: f64,

    /// Growth threshold (%) for 253-504 day moves
    pub growth_long_pct: f64,

    /// Superperformance threshold (%) for 253-504 day moves
    pub superperformance_long_pct: f64,

    /// Candidates closer than this many bars to an accepted move's start are skipped
    pub dedup_window: usize,

    /// Years of history, counted back from the latest bar, to scan (0 = all)
    pub lookback_years: u32,

    /// Minimum average daily volume; series without volume are not filtered (0 = off)
    pub min_daily_volume: f64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            min_short_term_growth_pct: 5.0,
            short_term_window: 5,
            min_drawdown_pct: 15.0,
            max_drawdown_pct: 30.0,
            max_days_without_high: 30,
            max_total_days: 504,
            continuation_window_days: 90,
            growth_short_pct: 100.0,
            superperformance_short_pct: 300.0,
            growth_long_pct: 150.0,
            superperformance_long_pct: 500.0,
            dedup_window: 5,
            lookback_years: 5,
            min_daily_volume: 200_000.0,
        }
    }
}

impl ScreenerConfig {
    /// Layer an optional config file under `SCREENER_*` environment
    /// variables and validate the result.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            let filename = path
                .into_os_string()
                .into_string()
                .map_err(|_| ConfigError::FilePathIntoString)?;
            builder = builder.add_source(config::File::with_name(&filename));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|err| ConfigError::SettingsInit(err.to_string()))?
            .try_deserialize()
            .map_err(|err| ConfigError::Deserialize(err.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_term_window == 0 {
            return Err(ConfigError::Invalid {
                field: "short_term_window",
                reason: "must be at least 1",
            });
        }

        let percentages = [
            ("min_short_term_growth_pct", self.min_short_term_growth_pct),
            ("min_drawdown_pct", self.min_drawdown_pct),
            ("max_drawdown_pct", self.max_drawdown_pct),
            ("growth_short_pct", self.growth_short_pct),
            ("superperformance_short_pct", self.superperformance_short_pct),
            ("growth_long_pct", self.growth_long_pct),
            ("superperformance_long_pct", self.superperformance_long_pct),
        ];
        for (field, value) in percentages {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                });
            }
        }

        if !self.min_daily_volume.is_finite() || self.min_daily_volume < 0.0 {
            return Err(ConfigError::Invalid {
                field: "min_daily_volume",
                reason: "must be a non-negative number",
            });
        }

        if self.min_drawdown_pct >= self.max_drawdown_pct {
            return Err(ConfigError::Invalid {
                field: "min_drawdown_pct",
                reason: "must be below max_drawdown_pct",
            });
        }

        if self.growth_short_pct > self.superperformance_short_pct {
            return Err(ConfigError::Invalid {
                field: "growth_short_pct",
                reason: "must not exceed superperformance_short_pct",
            });
        }

        if self.growth_long_pct > self.superperformance_long_pct {
            return Err(ConfigError::Invalid {
                field: "growth_long_pct",
                reason: "must not exceed superperformance_long_pct",
            });
        }

        if self.max_total_days < 0 || self.continuation_window_days < 0 {
            return Err(ConfigError::Invalid {
                field: "max_total_days",
                reason: "day counts must not be negative",
            });
        }

        Ok(())
    }

    pub fn thresholds(&self) -> ClassificationThresholds {
        ClassificationThresholds {
            growth_short_pct: self.growth_short_pct,
            superperformance_short_pct: self.superperformance_short_pct,
            growth_long_pct: self.growth_long_pct,
            superperformance_long_pct: self.superperformance_long_pct,
        }
    }

    pub fn describe_config(&self) -> String {
        format!(
            "lod(growth>={}% in {} bars) drawdown[{}%, {}%) stale<{} total<={}d continuation<={}d growth {}/{}% super {}/{}% lookback={}y min_volume={}",
            self.min_short_term_growth_pct,
            self.short_term_window,
            self.min_drawdown_pct,
            self.max_drawdown_pct,
            self.max_days_without_high,
            self.max_total_days,
            self.continuation_window_days,
            self.growth_short_pct,
            self.growth_long_pct,
            self.superperformance_short_pct,
            self.superperformance_long_pct,
            self.lookback_years,
            self.min_daily_volume,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScreenerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_drawdown_band() {
        let cfg = ScreenerConfig {
            min_drawdown_pct: 30.0,
            max_drawdown_pct: 15.0,
            ..ScreenerConfig::default()
        };

        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "min_drawdown_pct",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let cfg = ScreenerConfig {
            short_term_window: 0,
            ..ScreenerConfig::default()
        };

        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_growth_above_superperformance() {
        let cfg = ScreenerConfig {
            growth_long_pct: 600.0,
            ..ScreenerConfig::default()
        };

        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_volume() {
        let cfg = ScreenerConfig {
            min_daily_volume: -1.0,
            ..ScreenerConfig::default()
        };

        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "min_daily_volume",
                ..
            })
        ));
    }

    #[test]
    fn test_default_history_and_liquidity_filters() {
        let cfg = ScreenerConfig::default();
        assert_eq!(cfg.lookback_years, 5);
        assert_eq!(cfg.min_daily_volume, 200_000.0);
    }

    fn write_config(dir: &tempfile::TempDir, lines: &[&str]) -> PathBuf {
        let path = dir.path().join("screener.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn test_load_partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &["max_total_days = 400", "min_drawdown_pct = 12.5", "lookback_years = 10"],
        );

        let cfg = temp_env::with_var_unset("SCREENER_MAX_TOTAL_DAYS", || {
            ScreenerConfig::load(Some(path)).unwrap()
        });

        assert_eq!(cfg.max_total_days, 400);
        assert_eq!(cfg.min_drawdown_pct, 12.5);
        assert_eq!(cfg.lookback_years, 10);
        assert_eq!(cfg.short_term_window, 5);
        assert_eq!(cfg.superperformance_long_pct, 500.0);
        assert_eq!(cfg.min_daily_volume, 200_000.0);
    }

    #[test]
    fn test_load_env_overrides_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &["max_total_days = 300", "min_drawdown_pct = 12.5"]);

        let cfg = temp_env::with_var("SCREENER_MAX_TOTAL_DAYS", Some("400"), || {
            ScreenerConfig::load(Some(path)).unwrap()
        });

        assert_eq!(cfg.max_total_days, 400);
        assert_eq!(cfg.min_drawdown_pct, 12.5);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &["short_term_window = 0"]);

        let result = temp_env::with_var_unset("SCREENER_MAX_TOTAL_DAYS", || {
            ScreenerConfig::load(Some(path))
        });

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_thresholds_mirror_config() {
        let t = ScreenerConfig::default().thresholds();
        assert_eq!(t, ClassificationThresholds::default());
    }
}
