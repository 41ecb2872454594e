//! Invoice date parsing.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATE_DMY: Regex = Regex::new(r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4})$").unwrap();
    static ref DATE_YMD: Regex = Regex::new(r"^(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})$").unwrap();
    static ref DATE_RUSSIAN_LONG: Regex = Regex::new(
        r"(?i)^(\d{1,2})\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\s+(\d{4})$"
    )
    .unwrap();
}

/// Parse a raw matched date string into a real calendar date.
///
/// Accepted forms: `ДД.ММ.ГГГГ` (also `/` and `-`), `ГГГГ-ММ-ДД`, and the
/// long Russian form «15 января 2024». Impossible dates (32.01, 30.02)
/// are rejected, not clamped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Some(caps) = DATE_DMY.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_YMD.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_RUSSIAN_LONG.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month = russian_month_to_number(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn russian_month_to_number(month: &str) -> Option<u32> {
    match month.to_lowercase().as_str() {
        "января" => Some(1),
        "февраля" => Some(2),
        "марта" => Some(3),
        "апреля" => Some(4),
        "мая" => Some(5),
        "июня" => Some(6),
        "июля" => Some(7),
        "августа" => Some(8),
        "сентября" => Some(9),
        "октября" => Some(10),
        "ноября" => Some(11),
        "декабря" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dotted_dmy() {
        assert_eq!(parse_date("15.05.2023"), Some(ymd(2023, 5, 15)));
        assert_eq!(parse_date("1.2.2024"), Some(ymd(2024, 2, 1)));
    }

    #[test]
    fn slash_and_dash_dmy() {
        assert_eq!(parse_date("15/05/2023"), Some(ymd(2023, 5, 15)));
        assert_eq!(parse_date("15-05-2023"), Some(ymd(2023, 5, 15)));
    }

    #[test]
    fn iso_ymd() {
        assert_eq!(parse_date("2024-02-01"), Some(ymd(2024, 2, 1)));
    }

    #[test]
    fn russian_long_form() {
        assert_eq!(parse_date("15 января 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("3 Мая 2023"), Some(ymd(2023, 5, 3)));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert_eq!(parse_date("32.01.2024"), None);
        assert_eq!(parse_date("30.02.2024"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn non_dates_are_rejected() {
        assert_eq!(parse_date("сегодня"), None);
        assert_eq!(parse_date(""), None);
    }
}
