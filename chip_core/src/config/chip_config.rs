use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::common::chip_exception::ChipError;

pub const DEFAULT_BIN_COUNT: usize = 150;
pub const DEFAULT_CALC_DAYS: usize = 90;
pub const DEFAULT_FETCH_DAYS: usize = 210;
pub const DEFAULT_MIN_BARS: usize = 10;

/// Chip distribution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChipConfig {
    /// Number of price levels in the grid.
    pub bin_count: usize,
    /// Bars up to the target that feed the grid; None means every bar from the start.
    pub range: Option<usize>,
    /// Most recent bars kept out of a fetched window.
    pub calc_days: usize,
    /// Bars requested from the data fetcher.
    pub fetch_days: usize,
    pub min_bars: usize,
    /// Repair bars whose high/low do not bound open/close instead of dropping them.
    pub autofix: bool,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            bin_count: DEFAULT_BIN_COUNT,
            range: None,
            calc_days: DEFAULT_CALC_DAYS,
            fetch_days: DEFAULT_FETCH_DAYS,
            min_bars: DEFAULT_MIN_BARS,
            autofix: true,
        }
    }
}

impl ChipConfig {
    pub fn new(conf: Option<HashMap<String, serde_json::Value>>) -> Result<Self, ChipError> {
        let mut conf = ConfigWithCheck::new(conf.unwrap_or_default());
        let default = Self::default();

        let range: Option<usize> = conf.get("range")?.unwrap_or(default.range);
        let config = Self {
            bin_count: conf.get("bin_count")?.unwrap_or(default.bin_count),
            // 0 is accepted as "no limit"
            range: range.filter(|r| *r > 0),
            calc_days: conf.get("calc_days")?.unwrap_or(default.calc_days),
            fetch_days: conf.get("fetch_days")?.unwrap_or(default.fetch_days),
            min_bars: conf.get("min_bars")?.unwrap_or(default.min_bars),
            autofix: conf.get("autofix")?.unwrap_or(default.autofix),
        };

        conf.check()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ChipError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ChipError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ChipError> {
        if self.bin_count < 2 {
            return Err(ChipError::config(format!(
                "bin_count must be >= 2, got {}",
                self.bin_count
            )));
        }
        if self.min_bars == 0 {
            return Err(ChipError::config("min_bars must be >= 1"));
        }
        if self.calc_days < self.min_bars {
            return Err(ChipError::config(format!(
                "calc_days ({}) must be >= min_bars ({})",
                self.calc_days, self.min_bars
            )));
        }
        if self.fetch_days < self.calc_days {
            return Err(ChipError::config(format!(
                "fetch_days ({}) must be >= calc_days ({})",
                self.fetch_days, self.calc_days
            )));
        }
        if self.range == Some(0) {
            return Err(ChipError::config("range must be >= 1 when set"));
        }
        Ok(())
    }
}

/// Key/value overrides that must all be consumed.
struct ConfigWithCheck {
    conf: HashMap<String, serde_json::Value>,
}

impl ConfigWithCheck {
    fn new(conf: HashMap<String, serde_json::Value>) -> Self {
        Self { conf }
    }

    fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, ChipError> {
        match self.conf.remove(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|e| ChipError::config(format!("invalid value for {}: {}", key, e))),
        }
    }

    fn check(&self) -> Result<(), ChipError> {
        let mut unknown: Vec<&String> = self.conf.keys().collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort();
        Err(ChipError::config(format!("unknown para = {:?}", unknown)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conf(pairs: &[(&str, serde_json::Value)]) -> Option<HashMap<String, serde_json::Value>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = ChipConfig::new(None).unwrap();
        assert_eq!(config, ChipConfig::default());
        assert_eq!(config.bin_count, 150);
        assert_eq!(config.calc_days, 90);
        assert_eq!(config.fetch_days, 210);
        assert_eq!(config.min_bars, 10);
        assert_eq!(config.range, None);
    }

    #[test]
    fn test_overrides() {
        let config = ChipConfig::new(conf(&[
            ("bin_count", json!(200)),
            ("range", json!(60)),
            ("calc_days", json!(120)),
            ("fetch_days", json!(250)),
        ]))
        .unwrap();
        assert_eq!(config.bin_count, 200);
        assert_eq!(config.range, Some(60));
        assert_eq!(config.calc_days, 120);
        assert_eq!(config.fetch_days, 250);
    }

    #[test]
    fn test_zero_range_means_unbounded() {
        let config = ChipConfig::new(conf(&[("range", json!(0))])).unwrap();
        assert_eq!(config.range, None);
        let config = ChipConfig::new(conf(&[("range", serde_json::Value::Null)])).unwrap();
        assert_eq!(config.range, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ChipConfig::new(conf(&[("factor", json!(150))])).unwrap_err();
        assert!(matches!(err, ChipError::Config(_)));
        assert!(err.to_string().contains("unknown para"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = ChipConfig::new(conf(&[("bin_count", json!("many"))])).unwrap_err();
        assert!(err.to_string().contains("bin_count"));
    }

    #[test]
    fn test_validate() {
        let err = ChipConfig::new(conf(&[("bin_count", json!(1))])).unwrap_err();
        assert!(err.to_string().contains("bin_count"));

        let err = ChipConfig::new(conf(&[("calc_days", json!(5))])).unwrap_err();
        assert!(err.to_string().contains("calc_days"));

        let err = ChipConfig::new(conf(&[("fetch_days", json!(30))])).unwrap_err();
        assert!(err.to_string().contains("fetch_days"));
    }

    #[test]
    fn test_from_json_str() {
        let config = ChipConfig::from_json_str(r#"{"bin_count": 120, "calc_days": 60}"#).unwrap();
        assert_eq!(config.bin_count, 120);
        assert_eq!(config.calc_days, 60);
        assert_eq!(config.fetch_days, DEFAULT_FETCH_DAYS);

        assert!(ChipConfig::from_json_str(r#"{"bins": 120}"#).is_err());
        assert!(ChipConfig::from_json_str(r#"{"bin_count": 0}"#).is_err());
    }
}
