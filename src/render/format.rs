//! Locale-aware value labels for legends, tooltips and search results.

use crate::config::ValueFormat;
use num_format::{Locale, ToFormattedString};

/// Map a locale tag to a `num_format::Locale` and its decimal separator.
///
/// Recognised tags (case-insensitive): `en`, `de`, `fr`, `es`, `it`, `pt`, `nl`, with
/// or without a region suffix. Anything else falls back to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    let lang = tag
        .split(['_', '-'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match lang.as_str() {
        "de" | "german" => (&Locale::de, ','),
        "fr" => (&Locale::fr, ','),
        "es" => (&Locale::es, ','),
        "it" => (&Locale::it, ','),
        "pt" => (&Locale::pt, ','),
        "nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// `prefix + grouped integer part + decimals + suffix`, e.g. `£1,234.50` or `-3.2%`.
/// The sign goes before the prefix. Non-finite values print as `n/a`.
pub fn format_value(value: f64, fmt: &ValueFormat) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let (locale, dec_sep) = map_locale(&fmt.locale);
    let decimals = fmt.decimals.min(12);
    let rounded = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };
    let grouped = int_part
        .parse::<u64>()
        .map(|n| n.to_formatted_string(locale))
        .unwrap_or_else(|_| int_part.to_string());

    // "-0.00" would be misleading after rounding.
    let is_zero = rounded.chars().all(|c| c == '0' || c == '.');
    let mut out = String::new();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&fmt.prefix);
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(dec_sep);
        out.push_str(frac);
    }
    out.push_str(&fmt.suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(prefix: &str, suffix: &str, decimals: usize, locale: &str) -> ValueFormat {
        ValueFormat {
            prefix: prefix.into(),
            suffix: suffix.into(),
            decimals,
            locale: locale.into(),
        }
    }

    #[test]
    fn groups_thousands_per_locale() {
        assert_eq!(format_value(1234567.891, &fmt("£", "", 2, "en")), "£1,234,567.89");
        assert_eq!(format_value(1234567.891, &fmt("", " €", 1, "de_DE")), "1.234.567,9 €");
    }

    #[test]
    fn sign_precedes_prefix() {
        assert_eq!(format_value(-12.7, &fmt("£", "", 0, "en")), "-£13");
        assert_eq!(format_value(-0.001, &fmt("", "%", 2, "en")), "0.00%");
        assert_eq!(format_value(f64::NAN, &ValueFormat::default()), "n/a");
    }
}
