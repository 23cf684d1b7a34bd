//! Date parsing, date pattern sources and blurred-date rendering
//!
//! Covers the renderings seen in clinical free text: ISO (`1990-01-12`,
//! `19900112`), numeric day-first (`12/01/1990`, `12.1.90`) and textual
//! months in either order (`12th Jan 1990`, `Friday, January 12, 1990`),
//! each with an optional trailing time.

use crate::domain::errors::AnonymiserError;
use crate::domain::result::Result;
use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

const MONTHS: [(&str, &str); 12] = [
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const ORDINAL_SUFFIX: &str = "(?:st|nd|rd|th)?";

/// Separator run between a day and a textual month
const DATE_SEP: &str = r"[\s\-/.,']*";

/// Separator run between numeric fields and before the year; required so
/// "May 2020" and "11/1990" are not taken for dates
const DATE_SEP_REQUIRED: &str = r"[\s\-/.,']+";

/// Optional trailing time of day, with optional seconds and zone
const TIME_SUFFIX: &str = r"(?:(?:T|\s+)[0-9]{1,2}:[0-9]{2}(?::[0-9]{2}(?:\.[0-9]+)?)?(?:\s*(?:Z|[+\-][0-9]{2}:?[0-9]{2}))?)?";

/// Two-digit years below this are 20xx, the rest 19xx
const TWO_DIGIT_YEAR_PIVOT: u32 = 69;

/// Pattern source matching renderings of one specific date
pub fn specific_date_source(date: NaiveDate, at_word_boundaries_only: bool) -> String {
    let (y, m, d) = (date.year(), date.month(), date.day());
    let yy = y.rem_euclid(100);

    let iso = format!("{y:04}[-/.]0?{m}[-/.]0?{d}|{y:04}{m:02}{d:02}");
    let day = format!("0?{d}{ORDINAL_SUFFIX}");
    let textual_month = month_names_source(m);
    let year = format!("(?:{y:04}|'?{yy:02})");

    // A numeric day and month need a separator unless both are zero-padded
    let day_month = format!(
        "(?:{day}{DATE_SEP_REQUIRED}0?{m}|{day}{DATE_SEP}{textual_month})"
    );
    let dmy = format!("{day_month}{DATE_SEP_REQUIRED}{year}");
    let compact_dmy = format!("{d:02}{m:02}{y:04}");
    let mdy = format!("{textual_month}{DATE_SEP}{day}{DATE_SEP_REQUIRED}{year}");

    wrap_date(
        &format!("(?:{iso}|{dmy}|{compact_dmy}|{mdy})"),
        at_word_boundaries_only,
    )
}

/// Pattern source matching any date-shaped substring
pub fn generic_date_source(at_word_boundaries_only: bool) -> String {
    let day = "(?:3[01]|[12][0-9]|0?[1-9])";
    let month = "(?:1[0-2]|0?[1-9])";
    let textual_month = all_month_names_source();

    let iso = format!(
        "[0-9]{{4}}[-/.]{month}[-/.]{day}|(?:19|20)[0-9]{{2}}(?:0[1-9]|1[0-2])(?:0[1-9]|[12][0-9]|3[01])"
    );
    let dmy_numeric = format!("{day}[-/.]{month}[-/.](?:[0-9]{{4}}|[0-9]{{2}})");
    let year = "(?:[0-9]{4}|'?[0-9]{2})";
    let dmy_textual =
        format!("{day}{ORDINAL_SUFFIX}{DATE_SEP}{textual_month}{DATE_SEP_REQUIRED}{year}");
    let mdy_textual =
        format!("{textual_month}{DATE_SEP}{day}{ORDINAL_SUFFIX}{DATE_SEP_REQUIRED}{year}");

    wrap_date(
        &format!("(?:{iso}|{dmy_numeric}|{dmy_textual}|{mdy_textual})"),
        at_word_boundaries_only,
    )
}

fn wrap_date(core: &str, at_word_boundaries_only: bool) -> String {
    let weekday = format!(r"(?:{}\.?,?\s+)?", weekday_names_source());
    let body = format!("{weekday}{core}{TIME_SUFFIX}");
    if at_word_boundaries_only {
        format!(r"\b{body}\b")
    } else {
        format!("(?:{body})")
    }
}

fn month_names_source(month: u32) -> String {
    let idx = month.saturating_sub(1) as usize;
    let (full, abbrev) = MONTHS[idx.min(11)];
    if month == 9 {
        format!("(?:{full}|sept|{abbrev})")
    } else if full == abbrev {
        format!("(?:{full})")
    } else {
        format!("(?:{full}|{abbrev})")
    }
}

fn all_month_names_source() -> String {
    let full = MONTHS.iter().map(|(f, _)| *f);
    let short = MONTHS
        .iter()
        .filter(|(f, a)| f != a)
        .flat_map(|(f, a)| {
            if *f == "september" {
                vec!["sept", *a]
            } else {
                vec![*a]
            }
        });
    let names: Vec<&str> = full.chain(short).collect();
    format!("(?:{})", names.join("|"))
}

fn weekday_names_source() -> String {
    let names: Vec<String> = WEEKDAYS
        .iter()
        .flat_map(|w| [w.to_string(), w[..3].to_string()])
        .collect();
    format!("(?:{})", names.join("|"))
}

#[derive(Debug, PartialEq, Eq)]
enum Component {
    Number(String),
    Month(u32),
}

/// Parse free-text date renderings to a calendar date
///
/// Accepts the forms listed in the module docs. Returns `None` for anything
/// else, including impossible dates such as 31 February.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let components = date_components(strip_time(text))?;

    match components.as_slice() {
        [Component::Number(n)] if n.len() == 8 => {
            let year = n[..4].parse().ok()?;
            let month = n[4..6].parse().ok()?;
            let day = n[6..].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        [Component::Number(y), month, Component::Number(d)] if y.len() == 4 => {
            NaiveDate::from_ymd_opt(year_of(y)?, month_of(month)?, d.parse().ok()?)
        }
        [Component::Month(m), Component::Number(d), Component::Number(y)] => {
            NaiveDate::from_ymd_opt(year_of(y)?, *m, d.parse().ok()?)
        }
        [Component::Number(d), month, Component::Number(y)] => {
            NaiveDate::from_ymd_opt(year_of(y)?, month_of(month)?, d.parse().ok()?)
        }
        _ => None,
    }
}

fn strip_time(text: &str) -> &str {
    let Some(colon) = text.find(':') else {
        return text.trim();
    };
    text[..colon]
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .trim_end()
        .trim_end_matches(|c: char| c == 'T' || c == 't')
        .trim()
}

fn date_components(text: &str) -> Option<Vec<Component>> {
    let mut components = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_ascii_digit() {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            components.push(Component::Number(text[start..end].to_string()));
        } else if c.is_alphabetic() {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !c.is_alphabetic() {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            let word = text[start..end].to_lowercase();
            let after_number = matches!(components.last(), Some(Component::Number(_)));

            if after_number && matches!(word.as_str(), "st" | "nd" | "rd" | "th") {
                continue;
            }
            if let Some(month) = month_number(&word) {
                components.push(Component::Month(month));
            } else if !is_weekday(&word) {
                return None;
            }
        } else {
            chars.next();
        }
    }

    Some(components)
}

fn month_number(word: &str) -> Option<u32> {
    if word == "sept" {
        return Some(9);
    }
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|(full, _)| full.starts_with(word))
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn is_weekday(word: &str) -> bool {
    word.len() >= 3 && WEEKDAYS.iter().any(|w| w.starts_with(word))
}

fn month_of(component: &Component) -> Option<u32> {
    match component {
        Component::Month(m) => Some(*m),
        Component::Number(n) => n.parse().ok(),
    }
}

fn year_of(digits: &str) -> Option<i32> {
    let value: u32 = digits.parse().ok()?;
    let year = match digits.len() {
        4 => value,
        2 if value < TWO_DIGIT_YEAR_PIVOT => 2000 + value,
        2 => 1900 + value,
        _ => return None,
    };
    i32::try_from(year).ok()
}

/// Render `date` through a strftime-style template (e.g. `%b '%y`)
///
/// # Errors
///
/// Returns `TemplateFormat` when the template has an unknown directive or
/// asks for a field a calendar date does not have (such as `%H`).
pub fn render_date(template: &str, date: NaiveDate) -> Result<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(AnonymiserError::TemplateFormat(format!(
            "invalid directive in date template {template:?}"
        )));
    }

    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.iter())).map_err(|_| {
        AnonymiserError::TemplateFormat(format!(
            "date template {template:?} cannot be rendered from a calendar date"
        ))
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fancy_regex::Regex;
    use test_case::test_case;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test_case("1990-01-12" => Some(ymd(1990, 1, 12)); "iso")]
    #[test_case("19900112" => Some(ymd(1990, 1, 12)); "compact iso")]
    #[test_case("12/01/1990" => Some(ymd(1990, 1, 12)); "day first numeric")]
    #[test_case("12.1.90" => Some(ymd(1990, 1, 12)); "two digit year")]
    #[test_case("1/2/05" => Some(ymd(2005, 2, 1)); "pivot to 2000s")]
    #[test_case("12 Jan 1990" => Some(ymd(1990, 1, 12)); "textual")]
    #[test_case("12th January, 1990" => Some(ymd(1990, 1, 12)); "ordinal")]
    #[test_case("Friday, January 12, 1990" => Some(ymd(1990, 1, 12)); "weekday month first")]
    #[test_case("3 Sept 2001" => Some(ymd(2001, 9, 3)); "sept")]
    #[test_case("1990-01-12T08:30:00Z" => Some(ymd(1990, 1, 12)); "iso with time")]
    #[test_case("12 Jan 1990 14:05" => Some(ymd(1990, 1, 12)); "textual with time")]
    #[test_case("31/02/1990" => None; "impossible date")]
    #[test_case("12 Foo 1990" => None; "unknown word")]
    #[test_case("May 2020" => None; "no day")]
    fn test_parse_date_text(text: &str) -> Option<NaiveDate> {
        parse_date_text(text)
    }

    #[test]
    fn test_specific_date_source_matches_renderings() {
        let re = Regex::new(&format!("(?i){}", specific_date_source(ymd(1990, 1, 2), true)))
            .unwrap();
        for text in [
            "1990-01-02",
            "1990/1/2",
            "19900102",
            "02/01/1990",
            "2 Jan 1990",
            "2nd January '90",
            "Tuesday 2 January 1990",
            "January 2, 1990",
            "1990-01-02T10:15:00",
        ] {
            let m = re.find(text).unwrap().unwrap();
            assert_eq!(m.as_str(), text, "should fully match {text}");
        }
        assert!(!re.is_match("03 Jan 1990").unwrap());
        assert!(!re.is_match("2 Feb 1990").unwrap());
        assert!(re.is_match("DOB 02011990").unwrap());
    }

    #[test]
    fn test_specific_date_needs_separated_numeric_fields() {
        let re = Regex::new(&format!("(?i){}", specific_date_source(ymd(1990, 1, 1), true)))
            .unwrap();
        for text in ["in 11/1990", "in 11 1990", "in 2011 1990", "in 111990"] {
            assert!(!re.is_match(text).unwrap(), "{text}");
        }
        for text in ["1/1/1990", "01.01.90", "1st Jan 1990", "1Jan 1990", "01011990"] {
            assert!(re.is_match(text).unwrap(), "{text}");
        }
    }

    #[test]
    fn test_generic_date_source() {
        let re = Regex::new(&format!("(?i){}", generic_date_source(true))).unwrap();
        assert!(re.is_match("seen on 12 Jan 1990 at clinic").unwrap());
        assert!(re.is_match("DOB 2001-09-03").unwrap());
        assert!(re.is_match("on 3/9/01").unwrap());
        assert!(!re.is_match("in May 2020").unwrap());
        assert!(!re.is_match("ratio 13/13/2000").unwrap());
    }

    #[test]
    fn test_render_date_template() {
        assert_eq!(render_date("%b '%y", ymd(1990, 1, 12)).unwrap(), "Jan '90");
        assert_eq!(render_date("%Y", ymd(1990, 1, 12)).unwrap(), "1990");
    }

    #[test]
    fn test_render_date_rejects_bad_templates() {
        assert!(matches!(
            render_date("%Q", ymd(1990, 1, 12)),
            Err(AnonymiserError::TemplateFormat(_))
        ));
        assert!(matches!(
            render_date("%H:%M", ymd(1990, 1, 12)),
            Err(AnonymiserError::TemplateFormat(_))
        ));
    }
}
