// Display formatting for amounts and timestamps.

use chrono::DateTime;

use crate::storage::Currency;

/// `1234567.891` -> `1,234,567.89` (with `decimals = 2`). Anything that isn't
/// a plain decimal number is returned as-is. Decimals are cut, not rounded.
pub fn to_number_format(value: &str, decimals: usize) -> String {
    let s = value.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (int_part, dec_part) = match digits.split_once('.') {
        Some((i, d)) => (i, d),
        None => (digits, ""),
    };
    let valid = !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && (digits.contains('.') == !dec_part.is_empty())
        && dec_part.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return s.to_string();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 1);
    if negative {
        grouped.push('-');
    }
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let dec: String = dec_part.chars().take(decimals).collect();
    if dec.is_empty() {
        grouped
    } else {
        format!("{grouped}.{dec}")
    }
}

/// Money amount with exactly `decimals` places: `12.5` -> `€12.50`.
pub fn to_value_format(value: f64, currency: Currency, decimals: usize) -> String {
    let mut number = to_number_format(&value.to_string(), decimals);
    if value.is_finite() && decimals > 0 {
        let have = match number.find('.') {
            Some(dot) => number.len() - dot - 1,
            None => {
                number.push('.');
                0
            }
        };
        number.extend(std::iter::repeat('0').take(decimals.saturating_sub(have)));
    }
    format!("{}{}", currency.symbol(), number)
}

/// Currency and rate to display earnings in. Without a usable rate the
/// amounts stay in USD.
pub fn display_rate(currency: Currency, rate: f64) -> (Currency, f64) {
    if rate.is_finite() && rate > 0.0 {
        (currency, rate)
    } else {
        (Currency::Usd, 1.0)
    }
}

/// `2025-03-01T10:20:00+02:00` -> `2025-03-01 10:20 UTC+02:00`. Unparseable
/// input is returned unchanged.
pub fn format_date_with_timezone(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(d) => format!("{} UTC{}", d.format("%Y-%m-%d %H:%M"), d.format("%:z")),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_and_cuts_decimals() {
        assert_eq!(to_number_format("1234567.891", 2), "1,234,567.89");
        assert_eq!(to_number_format("999", 2), "999");
        assert_eq!(to_number_format("-1000.5", 20), "-1,000.5");
        assert_eq!(to_number_format("12.000", 0), "12");
    }

    #[test]
    fn leaves_non_numbers_alone() {
        assert_eq!(to_number_format("abc", 2), "abc");
        assert_eq!(to_number_format("1.", 2), "1.");
        assert_eq!(to_number_format("1e5", 2), "1e5");
    }

    #[test]
    fn prefixes_currency_symbol() {
        assert_eq!(to_value_format(1500.256, Currency::Usd, 2), "$1,500.25");
        assert_eq!(to_value_format(3.0, Currency::Eur, 2), "€3.00");
    }

    #[test]
    fn money_keeps_trailing_zeros() {
        assert_eq!(to_value_format(0.0, Currency::Eur, 2), "€0.00");
        assert_eq!(to_value_format(12.5, Currency::Usd, 2), "$12.50");
        assert_eq!(to_value_format(1234.0, Currency::Gbp, 0), "£1,234");
    }

    #[test]
    fn missing_rate_falls_back_to_usd() {
        assert_eq!(display_rate(Currency::Eur, 0.92), (Currency::Eur, 0.92));
        assert_eq!(display_rate(Currency::Eur, 0.0), (Currency::Usd, 1.0));
        assert_eq!(display_rate(Currency::Jpy, f64::NAN), (Currency::Usd, 1.0));
        assert_eq!(
            to_value_format(1234.5 * display_rate(Currency::Eur, 0.0).1, Currency::Usd, 2),
            "$1,234.50"
        );
    }

    #[test]
    fn dates_keep_their_offset() {
        assert_eq!(
            format_date_with_timezone("2025-03-01T10:20:00+02:00"),
            "2025-03-01 10:20 UTC+02:00"
        );
        assert_eq!(format_date_with_timezone("soon"), "soon");
    }
}
