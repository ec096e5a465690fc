// Parsing and formatting helpers shared by the loaders and reports.
//
// Spreadsheet exports mix text, numbers and dates in the same columns, so
// everything that turns a cell into a typed value lives here.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a cell into `f64`, treating anything unparseable as missing.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (`"n/a"`, `"NaN"`, `"1e3"`).
/// - Strips thousands separators like `","` before parsing.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a date cell. Workbook dates arrive as `YYYY-MM-DD`, hand-typed CSVs
/// often use `DD/MM/YYYY`; datetimes are truncated to their date.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Key used when two sources spell the same category differently.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round() / factor
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    if !n.is_finite() {
        return n.to_string();
    }
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
    // Avoid rendering "-0.00" for values that round to zero.
    let rounds_to_zero = s.chars().all(|c| c == '0' || c == '.');
    if n.is_sign_negative() && !rounds_to_zero {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals)).unwrap_or_default()
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
    fn numeric_cells_with_text_are_missing() {
        assert_eq!(parse_f64_safe(Some("  1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
        assert_eq!(parse_f64_safe(Some("-12")), Some(-12.0));
    }

    #[test]
    fn dates_accept_common_export_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14);
        assert_eq!(parse_date_safe(Some("2025-03-14")), expected);
        assert_eq!(parse_date_safe(Some("14/03/2025")), expected);
        assert_eq!(parse_date_safe(Some("2025-03-14 08:30:00")), expected);
        assert_eq!(parse_date_safe(Some("yesterday")), None);
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-2280.0, 2), "-2,280.00");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(42.0, 0), "42");
    }

    #[test]
    fn ratio_guards_non_positive_denominator() {
        assert_eq!(ratio_or_zero(10.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(10.0, -1.0), 0.0);
        assert_eq!(ratio_or_zero(10.0, 4.0), 2.5);
    }

    #[test]
    fn round_to_one_decimal() {
        assert_eq!(round_to(66.666, 1), 66.7);
    }
}
