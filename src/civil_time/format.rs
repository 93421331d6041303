use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

use super::clock::CivilClock;
use super::wire::WireTime;

/// Shown in place of a value that is missing or unparseable.
pub const PLACEHOLDER: &str = "-";

/// Clock style for time-of-day output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeStyle {
    /// `10:00 a.m.`
    #[default]
    TwelveHour,
    /// `10:00`
    TwentyFourHour,
}

/// Calendar portion of a wire value as `DD/MM/YYYY`.
///
/// The `YYYY-MM-DD` prefix is read verbatim: date-only values are stored at
/// UTC midnight, and shifting them into UTC−05:00 would show the previous day.
pub fn format_civil_date(raw: &str) -> String {
    raw.trim()
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .map(format_date)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Time of day of a wire value.
///
/// Epoch-anchored values are civil readings and keep their hour and minute;
/// any other timestamp is converted into the clock's zone first.
pub fn format_civil_time(raw: &str, style: TimeStyle, clock: &CivilClock) -> String {
    WireTime::parse(raw)
        .map(|t| format_wire_time(&t, style, clock))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Time of day of an already classified value.
pub fn format_wire_time(value: &WireTime, style: TimeStyle, clock: &CivilClock) -> String {
    format_time(value.civil_time(clock), style)
}

/// An absolute instant in the civil zone: `DD/MM/YYYY[, hh:mm a.m.]`.
///
/// Time-only values carry no date and render as the placeholder.
pub fn format_instant(raw: &str, include_time: bool, clock: &CivilClock) -> String {
    WireTime::parse(raw)
        .and_then(|t| t.as_instant())
        .map(|instant| format_utc_instant(instant, include_time, clock))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_utc_instant(instant: DateTime<Utc>, include_time: bool, clock: &CivilClock) -> String {
    let civil = clock.to_civil(instant);
    let date = format_date(civil.date_naive());
    if include_time {
        format!("{date}, {}", format_time(civil.time(), TimeStyle::TwelveHour))
    } else {
        date
    }
}

/// Civil date and wall-clock inputs (`YYYY-MM-DD`, `HH:MM[:SS]`) to the
/// absolute instant sent over the wire.
pub fn local_inputs_to_utc_instant(
    date: &str,
    time: &str,
    clock: &CivilClock,
) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time.trim(), fmt).ok())?;
    clock.to_utc(date, time)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_time(time: NaiveTime, style: TimeStyle) -> String {
    match style {
        TimeStyle::TwentyFourHour => time.format("%H:%M").to_string(),
        TimeStyle::TwelveHour => {
            let (pm, hour) = time.hour12();
            let suffix = if pm { "p.m." } else { "a.m." };
            format!("{hour:02}:{:02} {suffix}", time.minute())
        }
    }
}
