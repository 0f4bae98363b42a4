//! Calendar helpers for due dates.
//!
//! Due dates are stored as `YYYY-MM-DD` strings. Everything here is
//! parameterised on a reference date so the agenda cutoffs and the input
//! parser can be tested without touching the wall clock.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Weekday};

pub static DATE_FORMAT: Lazy<&'static [FormatItem<'static>]> =
    Lazy::new(|| format_description!("[year]-[month]-[day]"));

pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn to_str(date: Date) -> String {
    date.format(&DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn parse_str(value: &str) -> Result<Date> {
    Date::parse(value, &DATE_FORMAT).map_err(|err| anyhow!("invalid date '{value}': {err}"))
}

/// End of the rolling week window: seven days past the reference.
pub fn week_end(reference: Date) -> Date {
    reference + Duration::days(7)
}

pub fn plus_days(reference: Date, days: i64) -> Date {
    reference + Duration::days(days)
}

pub fn is_overdue(due: &str, reference: Date) -> bool {
    matches!(parse_str(due), Ok(date) if date < reference)
}

/// Shift a stored date string by whole days, used by the date field's
/// arrow keys. An unparsable value resets to the reference date.
pub fn shift_date_str(value: &str, days: i64, reference: Date) -> String {
    match parse_str(value) {
        Ok(date) => to_str(date + Duration::days(days)),
        Err(_) => to_str(reference),
    }
}

/// Parse user-typed due date input.
///
/// Accepts `today`, `tomorrow`, weekday names (next occurrence, never the
/// reference day itself), `+Nd` offsets, and ISO `YYYY-MM-DD`. Empty input
/// clears the due date.
pub fn parse_input(raw: &str, reference: Date) -> Result<Option<Date>> {
    let input = raw.trim().to_lowercase();
    if input.is_empty() || input == "none" {
        return Ok(None);
    }
    match input.as_str() {
        "today" => return Ok(Some(reference)),
        "tomorrow" => return Ok(Some(reference + Duration::days(1))),
        _ => {}
    }
    if let Some(weekday) = parse_weekday(&input) {
        let mut days = (weekday.number_days_from_monday() as i64
            - reference.weekday().number_days_from_monday() as i64)
            .rem_euclid(7);
        if days == 0 {
            days = 7;
        }
        return Ok(Some(reference + Duration::days(days)));
    }
    if let Some(offset) = input.strip_prefix('+').and_then(|rest| {
        rest.strip_suffix('d')
            .unwrap_or(rest)
            .parse::<i64>()
            .ok()
    }) {
        return Ok(Some(reference + Duration::days(offset)));
    }
    parse_str(&input).map(Some)
}

fn parse_weekday(input: &str) -> Option<Weekday> {
    let weekday = match input {
        "monday" | "mon" => Weekday::Monday,
        "tuesday" | "tue" => Weekday::Tuesday,
        "wednesday" | "wed" => Weekday::Wednesday,
        "thursday" | "thu" => Weekday::Thursday,
        "friday" | "fri" => Weekday::Friday,
        "saturday" | "sat" => Weekday::Saturday,
        "sunday" | "sun" => Weekday::Sunday,
        _ => return None,
    };
    Some(weekday)
}

/// Compact label for list rows: `Today`, `Tomorrow`, a weekday name inside
/// the coming week, otherwise the ISO date. Past dates keep the ISO form so
/// overdue rows stay unambiguous.
pub fn display_label(due: &str, reference: Date) -> String {
    let Ok(date) = parse_str(due) else {
        return due.to_string();
    };
    let delta = (date - reference).whole_days();
    match delta {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        2..=6 => format!("{}", date.weekday()),
        _ => due.to_string(),
    }
}
