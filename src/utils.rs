use chrono::Timelike;

use crate::config::constant::END_OF_DAY_MINUTES;
use crate::error::IngestError;

/// Convert a deadline string ("HH:MM AM/PM" or "EOD") into minutes since
/// midnight.
pub fn parse_deadline(raw: &str) -> Result<u32, IngestError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("EOD") {
        return Ok(END_OF_DAY_MINUTES);
    }

    let normalized = trimmed.to_ascii_uppercase();
    let parsed = chrono::NaiveTime::parse_from_str(&normalized, "%I:%M %p")
        .map_err(|_| IngestError::Deadline(raw.to_string()))?;
    Ok(parsed.hour() * 60 + parsed.minute())
}

pub fn minutes_to_clock(minutes: f64) -> String {
    let total = minutes.round() as i64;
    let hour24 = (total / 60).rem_euclid(24);
    let minute = total.rem_euclid(60);
    let suffix = if hour24 < 12 { "AM" } else { "PM" };
    let hour = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour, minute, suffix)
}

/// Collapse runs of whitespace so addresses from different sources compare
/// equal.
pub fn clean_address(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The canonical graph key for a delivery destination.
pub fn destination_key(street: &str, postal_code: &str) -> String {
    format!("{} ({})", clean_address(street), postal_code.trim())
}
