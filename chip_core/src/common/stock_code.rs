use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum Market {
    #[strum(serialize = "sh")]
    ShA,
    #[strum(serialize = "sz")]
    SzA,
    #[strum(serialize = "bj")]
    BjA,
    #[strum(serialize = "hk")]
    Hk,
    #[strum(serialize = "us")]
    Us,
    #[strum(serialize = "unknown")]
    Unknown,
}

const PREFIXES: &[&str] = &["SH", "SZ", "BJ", "HK", "US"];
const SUFFIXES: &[&str] = &[".SS", ".SZ", ".SH", ".BJ", ".HK"];

/// Instrument code as typed by a user or returned by a data source.
///
/// Equality and hashing use the normalized form, so "sh600519",
/// "600519.SS" and "600519" are the same instrument.
#[derive(Debug, Clone)]
pub struct StockCode {
    normalized: String,
}

impl StockCode {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self {
            normalized: normalize(raw.as_ref()),
        }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn market(&self) -> Market {
        let code = self.normalized.as_str();
        let all_digits = !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit());

        if all_digits && code.len() == 6 {
            return match code.as_bytes()[0] {
                b'6' => Market::ShA,
                b'0' | b'3' => Market::SzA,
                b'4' | b'8' => Market::BjA,
                _ => Market::Unknown,
            };
        }
        if all_digits && code.len() == 5 {
            return Market::Hk;
        }
        if !code.is_empty() && code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Market::Us;
        }
        Market::Unknown
    }

    /// Code with its market prefix, e.g. "sh600519". US and unknown codes are returned bare.
    pub fn with_prefix(&self) -> String {
        match self.market() {
            Market::ShA | Market::SzA | Market::BjA | Market::Hk => {
                format!("{}{}", self.market(), self.normalized)
            }
            Market::Us | Market::Unknown => self.normalized.clone(),
        }
    }
}

fn normalize(raw: &str) -> String {
    let mut code = raw.trim().to_uppercase();
    for suffix in SUFFIXES {
        if let Some(stripped) = code.strip_suffix(suffix) {
            code = stripped.to_string();
            break;
        }
    }
    for prefix in PREFIXES {
        // "US" stays a ticker when nothing follows it
        if code.len() > prefix.len() {
            if let Some(stripped) = code.strip_prefix(prefix) {
                if stripped.bytes().all(|b| b.is_ascii_digit()) {
                    code = stripped.to_string();
                    break;
                }
            }
        }
    }
    code
}

impl PartialEq for StockCode {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for StockCode {}

impl Hash for StockCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

impl From<&str> for StockCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(StockCode::new("sh600519").normalized(), "600519");
        assert_eq!(StockCode::new(" 600519.SS ").normalized(), "600519");
        assert_eq!(StockCode::new("sz000001").normalized(), "000001");
        assert_eq!(StockCode::new("hk00700").normalized(), "00700");
        assert_eq!(StockCode::new("aapl").normalized(), "AAPL");
        // letters after a market prefix are a ticker, not a prefixed code
        assert_eq!(StockCode::new("SHOP").normalized(), "SHOP");
    }

    #[test]
    fn test_market() {
        assert_eq!(StockCode::new("600519").market(), Market::ShA);
        assert_eq!(StockCode::new("000001").market(), Market::SzA);
        assert_eq!(StockCode::new("300750").market(), Market::SzA);
        assert_eq!(StockCode::new("830799").market(), Market::BjA);
        assert_eq!(StockCode::new("00700").market(), Market::Hk);
        assert_eq!(StockCode::new("AAPL").market(), Market::Us);
        assert_eq!(StockCode::new("12-34").market(), Market::Unknown);
    }

    #[test]
    fn test_with_prefix() {
        assert_eq!(StockCode::new("600519").with_prefix(), "sh600519");
        assert_eq!(StockCode::new("000001").with_prefix(), "sz000001");
        assert_eq!(StockCode::new("00700").with_prefix(), "hk00700");
        assert_eq!(StockCode::new("AAPL").with_prefix(), "AAPL");
    }

    #[test]
    fn test_equality_uses_normalized_form() {
        assert_eq!(StockCode::new("sh600519"), StockCode::new("600519.SS"));
        assert_ne!(StockCode::new("600519"), StockCode::new("000001"));
        assert_eq!(StockCode::new("600519").to_string(), "600519");
    }
}
