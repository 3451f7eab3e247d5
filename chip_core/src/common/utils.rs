/// Round to 2 decimals, the precision of every reported cost.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Coerce a raw cell to a number.
///
/// Accepts thousands separators and a trailing percent sign ("5.2%").
/// Empty cells, placeholders ("-", "--", "nan") and non-finite values are None.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_end_matches('%').trim();
    if s.is_empty() || s.chars().all(|c| c == '-') {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Clamp into [lo, hi], mapping NaN to lo.
pub fn clamp_or_low(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        lo
    } else {
        v.max(lo).min(hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(-1.239), -1.24);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1.23"), Some(1.23));
        assert_eq!(parse_number(" 5.2% "), Some(5.2));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("-0.5"), Some(-0.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("--"), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_clamp_or_low() {
        assert_eq!(clamp_or_low(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp_or_low(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp_or_low(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp_or_low(f64::NAN, 0.0, 1.0), 0.0);
    }
}
