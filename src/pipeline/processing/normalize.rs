//! Field normalizers: total functions from one raw cell to its canonical form.
//!
//! None of these fail. A value that cannot be interpreted comes back as the
//! absent sentinel (`None` / `FieldValue::Null`), and date failures are logged
//! and counted so they stay observable.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::constants::{DATE_FORMATS, PHONE_COUNTRY_PREFIX, PHONE_SIGNIFICANT_DIGITS, UNCATEGORIZED};
use crate::observability::metrics;
use crate::types::FieldValue;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("static regex"));

/// `+91-XXXXXXXXXX` from the last ten digits of `raw`, or `None` when fewer
/// than ten digits remain after stripping everything else.
pub fn normalize_phone(raw: &FieldValue) -> Option<String> {
    let text = raw.to_text()?;
    let digits = NON_DIGIT.replace_all(text.trim(), "");
    if digits.len() < PHONE_SIGNIFICANT_DIGITS {
        return None;
    }
    Some(format!("{}{}", PHONE_COUNTRY_PREFIX, &digits[digits.len() - PHONE_SIGNIFICANT_DIGITS..]))
}

/// Trimmed, title-cased category. Absent or blank input maps to `Uncategorized`.
pub fn normalize_category(raw: &FieldValue) -> String {
    match raw.to_text() {
        Some(text) if !text.trim().is_empty() => title_case(text.trim()),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// Upper-case the first letter of every run of letters and lower-case the rest.
/// Any non-letter starts a new word, so `home & KITCHEN` becomes `Home & Kitchen`
/// and `o'neil` becomes `O'Neil`. A first letter that upper-cases to several
/// characters keeps only the first one upper-case (`ßa` becomes `Ssa`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                let mut upper = c.to_uppercase();
                out.extend(upper.next());
                out.extend(upper.flat_map(char::to_lowercase));
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Parse a calendar date by trying each format in order; the first match wins.
/// The year must be written with exactly four digits. Already-parsed dates
/// pass through. Returns `None` (and logs) when every format fails.
pub fn parse_date(raw: &FieldValue) -> Option<NaiveDate> {
    if let FieldValue::Date(d) = raw {
        return Some(*d);
    }
    let text = raw.to_text()?;
    let trimmed = text.trim();
    let parsed = DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(trimmed, fmt)
            .ok()
            .filter(|_| year_is_four_digits(trimmed, fmt))
    });
    if parsed.is_none() {
        warn!(value = %trimmed, "Could not parse date");
        metrics::transform::unparseable_value("date");
    }
    parsed
}

/// The digit run that `%Y` consumed in `text` has exactly four digits
fn year_is_four_digits(text: &str, fmt: &str) -> bool {
    let Some(year_index) = fmt.split('%').skip(1).position(|spec| spec.starts_with('Y')) else {
        return true;
    };
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .nth(year_index)
        .map_or(false, |run| run.len() == 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_phone_keeps_last_ten_digits() {
        assert_eq!(normalize_phone(&"98765-43210".into()).as_deref(), Some("+91-9876543210"));
        assert_eq!(normalize_phone(&"+91 98765 43210".into()).as_deref(), Some("+91-9876543210"));
        assert_eq!(normalize_phone(&"0091-9876543210".into()).as_deref(), Some("+91-9876543210"));
        assert_eq!(normalize_phone(&FieldValue::Integer(9876543210)).as_deref(), Some("+91-9876543210"));
        assert_eq!(normalize_phone(&FieldValue::Float(9876543210.0)).as_deref(), Some("+91-9876543210"));
    }

    #[test]
    fn test_phone_with_too_few_digits_is_absent() {
        assert_eq!(normalize_phone(&"12345".into()), None);
        assert_eq!(normalize_phone(&"987-654-321".into()), None);
        assert_eq!(normalize_phone(&FieldValue::Null), None);
    }

    #[test]
    fn test_category_title_cases_and_defaults() {
        assert_eq!(normalize_category(&"  electronics ".into()), "Electronics");
        assert_eq!(normalize_category(&"HOME & kitchen".into()), "Home & Kitchen");
        assert_eq!(normalize_category(&FieldValue::Null), "Uncategorized");
        assert_eq!(normalize_category(&"   ".into()), "Uncategorized");
    }

    #[test]
    fn test_category_is_idempotent() {
        for input in [
            "electronics",
            "FASHION",
            "home & kitchen",
            "o'neil's",
            "",
            "3d printers",
            "Ünïcode wörds",
            "ßa",
            "ﬁsh",
        ] {
            let once = normalize_category(&input.into());
            let twice = normalize_category(&once.clone().into());
            assert_eq!(once, twice, "input {:?}", input);
        }
    }

    #[test]
    fn test_expanding_first_letter_is_titlecased() {
        assert_eq!(normalize_category(&"ßa".into()), "Ssa");
        assert_eq!(normalize_category(&"ﬁsh".into()), "Fish");
        assert_eq!(title_case("straße ßig"), "Straße Ssig");
    }

    #[test]
    fn test_date_formats_in_order() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(parse_date(&"2024-01-15".into()), Some(d(2024, 1, 15)));
        assert_eq!(parse_date(&"15/01/2024".into()), Some(d(2024, 1, 15)));
        assert_eq!(parse_date(&"01-15-2024".into()), Some(d(2024, 1, 15)));
        assert_eq!(parse_date(&"15-01-2024".into()), Some(d(2024, 1, 15)));
        assert_eq!(parse_date(&"01/15/2024".into()), Some(d(2024, 1, 15)));
        assert_eq!(parse_date(&" 2024-03-05 ".into()), Some(d(2024, 3, 5)));
    }

    #[test]
    fn test_ambiguous_date_is_day_first() {
        let parsed = parse_date(&"01/02/2024".into()).unwrap();
        assert_eq!((parsed.day(), parsed.month(), parsed.year()), (1, 2, 2024));
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        assert_eq!(parse_date(&"not a date".into()), None);
        assert_eq!(parse_date(&"2024/13/45".into()), None);
        assert_eq!(parse_date(&"24-01-15".into()), None);
        assert_eq!(parse_date(&FieldValue::Null), None);
    }

    #[test]
    fn test_year_needs_exactly_four_digits() {
        assert_eq!(parse_date(&"01/02/12024".into()), None);
        assert_eq!(parse_date(&"12024-01-02".into()), None);
        assert_eq!(parse_date(&"01/02/999".into()), None);
        assert_eq!(parse_date(&"0999-01-02".into()), NaiveDate::from_ymd_opt(999, 1, 2));
    }
}
