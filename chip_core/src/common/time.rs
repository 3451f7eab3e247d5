use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Parse a bar date cell.
///
/// Supports "YYYY-MM-DD", "YYYYMMDD", "YYYY/MM/DD" and the same with a
/// trailing time of day, which is discarded (daily bars only).
pub fn parse_bar_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // "2024-01-02 00:00:00.000" and similar: fall back to the date part
    let head = s.split(|c: char| c == ' ' || c == 'T').next()?;
    if head.len() < s.len() {
        return parse_bar_date(head);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bar_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_bar_date("2024-03-05"), Some(d));
        assert_eq!(parse_bar_date("20240305"), Some(d));
        assert_eq!(parse_bar_date("2024/03/05"), Some(d));
        assert_eq!(parse_bar_date(" 2024-03-05 15:00:00 "), Some(d));
        assert_eq!(parse_bar_date("2024-03-05 00:00:00.000"), Some(d));
        assert_eq!(parse_bar_date(""), None);
        assert_eq!(parse_bar_date("not a date"), None);
        assert_eq!(parse_bar_date("2024-13-40"), None);
    }
}
