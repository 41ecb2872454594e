//! Monetary amount parsing with separator normalization.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse an amount as it appears on Russian invoices: "186 000.00",
/// "45 600,00", "1.234.567,89" or plain "45600.00". Thousands separators
/// (space, NBSP, dot or comma) are collapsed; the last separator before a
/// two-digit tail is the decimal point.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    // Stray separators from surrounding text ("руб.") must not survive.
    let cleaned = cleaned.trim_matches(|c| c == ',' || c == '.').to_string();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Both present: the later one is the decimal separator.
        (Some(comma), Some(dot)) if comma > dot => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => {
            if cleaned.matches(',').count() == 1 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(_)) => {
            if cleaned.matches('.').count() == 1 {
                cleaned
            } else {
                keep_last_dot(&cleaned)
            }
        }
        (None, None) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Drop every dot except the last (thousands dots plus a decimal dot).
fn keep_last_dot(s: &str) -> String {
    let last = match s.rfind('.') {
        Some(pos) => pos,
        None => return s.to_string(),
    };
    s.char_indices()
        .filter(|(i, c)| *c != '.' || *i == last)
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn space_thousands_dot_decimal() {
        assert_eq!(parse_amount("186 000.00"), Some(dec("186000.00")));
    }

    #[test]
    fn space_thousands_comma_decimal() {
        assert_eq!(parse_amount("45 600,00"), Some(dec("45600.00")));
    }

    #[test]
    fn plain_forms() {
        assert_eq!(parse_amount("45600.00"), Some(dec("45600.00")));
        assert_eq!(parse_amount("45600,00"), Some(dec("45600.00")));
        assert_eq!(parse_amount("100"), Some(dec("100")));
    }

    #[test]
    fn dot_thousands_comma_decimal() {
        assert_eq!(parse_amount("1.234.567,89"), Some(dec("1234567.89")));
    }

    #[test]
    fn comma_thousands_dot_decimal() {
        assert_eq!(parse_amount("1,234,567.89"), Some(dec("1234567.89")));
    }

    #[test]
    fn dot_thousands_dot_decimal() {
        assert_eq!(parse_amount("186.000.00"), Some(dec("186000.00")));
    }

    #[test]
    fn nbsp_and_currency_are_ignored() {
        assert_eq!(parse_amount("186\u{00a0}000.00 руб."), Some(dec("186000.00")));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_amount("не сумма"), None);
        assert_eq!(parse_amount(""), None);
    }
}
