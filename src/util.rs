// Utility helpers for parsing, ratios and calendar months.
//
// This module centralizes the "dirty" CSV/number/date handling and the
// zero-denominator rules so the report functions can stay declarative.
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_format::{Locale, ToFormattedString};

/// Parse a monetary cell while being forgiving about formatting issues that
/// are common in CSV exports (thousands separators, surrounding spaces).
///
/// Returns `None` for empty or unparsable cells and for negative or
/// non-finite amounts.
pub fn parse_amount_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => None,
    }
}

/// Parse a timestamp cell into UTC.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DD HH:MM:SS` (or `T`-separated)
/// datetime and a bare `YYYY-MM-DD` date. Naive values are taken as UTC.
pub fn parse_timestamp_safe(s: Option<&str>) -> Option<DateTime<Utc>> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Trimmed cell text, with empty cells mapped to `None`.
pub fn non_empty(s: Option<String>) -> Option<String> {
    let s = s?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `part / whole`, or 0 when `whole` is zero. Never NaN or infinite.
pub fn safe_ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let r = part / whole;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

/// `part / whole * 100`, unrounded.
pub fn rate_pct(part: f64, whole: f64) -> f64 {
    safe_ratio(part, whole) * 100.0
}

/// Share of a non-negative part in its whole, rounded to a whole percent.
pub fn share_pct(part: f64, whole: f64) -> u32 {
    rate_pct(part, whole).round().clamp(0.0, 100.0) as u32
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month `back` months before the month of `now`.
pub fn month_start_back(now: DateTime<Utc>, back: u32) -> NaiveDate {
    let start = month_start(now.date_naive());
    start.checked_sub_months(Months::new(back)).unwrap_or(start)
}

/// Exclusive upper bound of the month starting at `start`: midnight UTC on
/// the first day of the following month.
///
/// `created_at < next_month_boundary(start)` is the same test as
/// `created_at <= end of month` at any timestamp precision.
pub fn next_month_boundary(start: NaiveDate) -> DateTime<Utc> {
    let next = start.checked_add_months(Months::new(1)).unwrap_or(start);
    midnight_utc(next)
}

pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Short month/year label such as `Mar/24`.
pub fn month_label(start: NaiveDate) -> String {
    start.format("%b/%y").to_string()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_reject_garbage_and_negatives() {
        assert_eq!(parse_amount_safe(Some(" 1,250.50 ")), Some(1250.5));
        assert_eq!(parse_amount_safe(Some("")), None);
        assert_eq!(parse_amount_safe(Some("n/a")), None);
        assert_eq!(parse_amount_safe(Some("-10")), None);
        assert_eq!(parse_amount_safe(None), None);
    }

    #[test]
    fn timestamps_accept_three_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp_safe(Some("2024-03-05T10:00:00Z")), Some(expected));
        assert_eq!(parse_timestamp_safe(Some("2024-03-05T07:00:00-03:00")), Some(expected));
        assert_eq!(parse_timestamp_safe(Some("2024-03-05 10:00:00")), Some(expected));
        assert_eq!(
            parse_timestamp_safe(Some("2024-03-05")),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp_safe(Some("05/03/2024")), None);
    }

    #[test]
    fn zero_denominators_yield_zero() {
        assert_eq!(safe_ratio(5.0, 0.0), 0.0);
        assert_eq!(rate_pct(0.0, 0.0), 0.0);
        assert_eq!(share_pct(3.0, 0.0), 0);
        assert_eq!(share_pct(1.0, 3.0), 33);
        assert_eq!(share_pct(1.0, 2.0), 50);
        assert_eq!(share_pct(1.0, 8.0), 13);
    }

    #[test]
    fn month_arithmetic_crosses_year_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap();
        assert_eq!(month_start_back(now, 0), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(month_start_back(now, 5), NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());
        let dec = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert_eq!(
            next_month_boundary(dec),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(month_label(dec), "Dec/23");
    }

    #[test]
    fn numbers_get_thousands_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 1), "-42.0");
        assert_eq!(format_int(9855), "9,855");
    }
}
