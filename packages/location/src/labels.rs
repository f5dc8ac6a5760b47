//! Hour labels of the form `9am`, `12pm`, `5pm`.
//!
//! Historical data is labelled on the hour; predictions continue the same
//! progression, so the next label after `5pm` is `6pm` and after `11pm`
//! is `12am`.

use std::sync::LazyLock;

use regex::Regex;

static HOUR_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::00)?\s*([ap])\.?m\.?\s*$").expect("valid hour label regex")
});

/// Parses an hour label into a 24-hour clock hour (`0..24`).
///
/// Accepts `5pm`, `5 PM`, `05:00pm` and `5 p.m.`. Returns `None` for
/// anything else, including `0am` and `13pm`.
#[must_use]
pub fn parse_hour(label: &str) -> Option<u32> {
    let caps = HOUR_LABEL.captures(label)?;
    let hour: u32 = caps[1].parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = caps[2].eq_ignore_ascii_case("p");
    Some(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    })
}

/// Formats a 24-hour clock hour as a label, e.g. `17` → `5pm`.
#[must_use]
pub fn format_hour(hour: u32) -> String {
    let hour = hour % 24;
    let suffix = if hour < 12 { "am" } else { "pm" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display}{suffix}")
}

/// The `count` labels following `last`, or `None` if `last` is not an hour
/// label.
#[must_use]
pub fn following_hours(last: &str, count: usize) -> Option<Vec<String>> {
    let start = parse_hour(last)?;
    Some(
        (1..=count)
            .map(|offset| {
                #[allow(clippy::cast_possible_truncation)]
                let offset = (offset % 24) as u32;
                format_hour(start + offset)
            })
            .collect(),
    )
}

/// Labels for every hour from `start` to `end` inclusive (24-hour clock).
#[must_use]
pub fn hour_range(start: u32, end: u32) -> Vec<String> {
    (start..=end).map(format_hour).collect()
}
