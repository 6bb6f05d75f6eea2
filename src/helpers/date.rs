//! Date helper functions

use chrono::{DateTime, FixedOffset, Locale, TimeZone, Utc};

/// Listing and byline format, e.g. "15 mar 2021"
pub const DISPLAY_DATE_FORMAT: &str = "dd MMM yyyy";

/// "Edited" annotation format, e.g. "15 mar 2021, às 10:00"
pub const EDITED_DATE_FORMAT: &str = "dd MMM yyyy', às' HH:mm";

/// Parse a content API timestamp
///
/// Accepts RFC 3339 (`2021-03-15T10:00:00Z`) as well as the API's own
/// `2021-03-15T10:00:00+0000` form.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Format a date using a date-fns style pattern (`dd MMM yyyy`)
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, pattern: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = pattern_to_chrono_format(pattern);
    date.format(&chrono_format).to_string()
}

/// Format a date with month and weekday names taken from `locale`
pub fn format_date_localized<Tz: TimeZone>(
    date: &DateTime<Tz>,
    pattern: &str,
    locale: Locale,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = pattern_to_chrono_format(pattern);
    date.format_localized(&chrono_format, locale).to_string()
}

/// Locale-invariant, lower-cased display date ("15 mar 2021")
pub fn display_date<Tz: TimeZone>(date: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_date(&date.with_timezone(tz), DISPLAY_DATE_FORMAT).to_lowercase()
}

/// Locale-aware "edited" timestamp ("15 mar 2021, às 10:00")
pub fn edited_date<Tz: TimeZone>(date: &DateTime<Utc>, tz: &Tz, locale: Locale) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_date_localized(&date.with_timezone(tz), EDITED_DATE_FORMAT, locale)
}

/// Convert a date-fns pattern to a chrono format string
///
/// Letters repeat to select width (`d`/`dd`, `MMM`/`MMMM`); text inside
/// single quotes is copied literally and `''` is an escaped quote.
fn pattern_to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut result = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                result.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut result, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut result, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let token: String = std::iter::repeat(c).take(run).collect();
        let spec = match token.as_str() {
            "yyyy" => "%Y",
            "yy" => "%y",
            "MMMM" => "%B",
            "MMM" => "%b",
            "MM" => "%m",
            "M" => "%-m",
            "dd" => "%d",
            "d" => "%-d",
            "EEEE" => "%A",
            "EEE" | "E" => "%a",
            "HH" => "%H",
            "H" => "%-H",
            "hh" => "%I",
            "h" => "%-I",
            "mm" => "%M",
            "m" => "%-M",
            "ss" => "%S",
            "s" => "%-S",
            "a" => "%p",
            _ => "",
        };

        if spec.is_empty() {
            for c in token.chars() {
                push_literal(&mut result, c);
            }
        } else {
            result.push_str(spec);
        }
        i += run;
    }

    result
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
