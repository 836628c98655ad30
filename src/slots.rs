//! Bookable appointment slots.
//!
//! A slot is stored on the booking request as its display string, e.g.
//! `"Montag, 3. Juni um 09:00 Uhr"`.

use chrono::{Datelike, NaiveDate, Weekday};

/// Times offered on every bookable day.
pub static SLOT_TIMES: [&str; 5] = ["09:00", "11:00", "13:00", "15:00", "17:00"];

/// Number of weekdays offered ahead.
pub const BOOKABLE_DAYS: usize = 5;

const MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Montag",
        Weekday::Tue => "Dienstag",
        Weekday::Wed => "Mittwoch",
        Weekday::Thu => "Donnerstag",
        Weekday::Fri => "Freitag",
        Weekday::Sat => "Samstag",
        Weekday::Sun => "Sonntag",
    }
}

/// The next `count` Monday-to-Friday dates, starting at `from` inclusive.
pub fn upcoming_weekdays(from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    from.iter_days()
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

/// German long form without year, e.g. `"Freitag, 7. März"`.
pub fn format_day(date: NaiveDate) -> String {
    format!(
        "{}, {}. {}",
        weekday_name(date.weekday()),
        date.day(),
        MONTHS[date.month0() as usize]
    )
}

pub fn slot_label(date: NaiveDate, time: &str) -> String {
    format!("{} um {time} Uhr", format_day(date))
}

/// Every slot offered when booking on `today`.
pub fn available_slots(today: NaiveDate) -> Vec<String> {
    upcoming_weekdays(today, BOOKABLE_DAYS)
        .into_iter()
        .flat_map(|date| SLOT_TIMES.iter().map(move |time| slot_label(date, time)))
        .collect()
}
