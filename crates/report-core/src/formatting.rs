use chrono::{Datelike, NaiveDate};

/// Format an integer count with thousands separators.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234), "1,234");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Long-form date used in the report greeting, e.g. `"Saturday 18 December 2021"`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use report_core::formatting::format_long_date;
///
/// let d = NaiveDate::from_ymd_opt(2021, 12, 18).unwrap();
/// assert_eq!(format_long_date(d), "Saturday 18 December 2021");
/// ```
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{} {:02} {} {}",
        date.format("%A"),
        date.day(),
        date.format("%B"),
        date.year()
    )
}

/// Turn a department name into something safe to use as a file stem.
///
/// Path separators, control characters and characters rejected by common
/// filesystems become `_`; surrounding whitespace is trimmed. An empty result
/// is replaced by `"report"`.
///
/// # Examples
///
/// ```
/// use report_core::formatting::sanitize_file_stem;
///
/// assert_eq!(sanitize_file_stem("Paris"), "Paris");
/// assert_eq!(sanitize_file_stem("../etc"), ".._etc");
/// assert_eq!(sanitize_file_stem("  "), "report");
/// ```
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
