// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Timestamp parsing and display.
//!
//! The backend stores naive UTC timestamps. Everything user-facing renders in
//! WITA (UTC+8) with Indonesian month abbreviations, for example
//! `01 Jan 2025, 08.00.00 WITA`.

use anyhow::{Context, Result, bail};
use time::macros::{format_description, offset, time};
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const DISPLAY_OFFSET: UtcOffset = offset!(+8);
pub const DISPLAY_ZONE_LABEL: &str = "WITA";

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// Parses a backend timestamp. Accepts `T` or space as the date/time
/// separator, optional fractional seconds and an optional trailing `Z`.
pub fn parse_backend_timestamp(raw: &str) -> Result<OffsetDateTime> {
    let trimmed = raw.trim();
    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    let normalized = naive.replacen(' ', "T", 1);
    let (whole, fraction) = match normalized.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (normalized.as_str(), None),
    };

    let parsed = PrimitiveDateTime::parse(
        whole,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .with_context(|| format!("invalid timestamp {raw:?}; expected YYYY-MM-DDTHH:MM:SS"))?;

    let parsed = match fraction {
        Some(digits) => parsed
            .replace_nanosecond(parse_fraction_nanos(digits, raw)?)
            .with_context(|| format!("invalid fractional seconds in {raw:?}"))?,
        None => parsed,
    };
    Ok(parsed.assume_utc())
}

fn parse_fraction_nanos(digits: &str, raw: &str) -> Result<u32> {
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        bail!("invalid fractional seconds in {raw:?}");
    }
    let mut padded: String = digits.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded
        .parse()
        .with_context(|| format!("invalid fractional seconds in {raw:?}"))
}

/// Renders an instant in the display zone.
pub fn format_display(instant: OffsetDateTime) -> String {
    let local = instant.to_offset(DISPLAY_OFFSET);
    let month = MONTH_ABBREVIATIONS[usize::from(u8::from(local.month())) - 1];
    format!(
        "{:02} {} {}, {:02}.{:02}.{:02} {}",
        local.day(),
        month,
        local.year(),
        local.hour(),
        local.minute(),
        local.second(),
        DISPLAY_ZONE_LABEL,
    )
}

/// UTC calendar date as `YYYY-MM-DD`, used in export file names.
pub fn format_file_date(instant: OffsetDateTime) -> String {
    let utc = instant.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}",
        utc.year(),
        u8::from(utc.month()),
        utc.day()
    )
}

pub fn parse_filter_date(raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).with_context(|| {
        format!("invalid date {raw:?}; use YYYY-MM-DD (for example 2025-01-31)")
    })
}

pub fn format_filter_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// First instant of `date` in the display zone.
pub fn start_of_day(date: Date) -> OffsetDateTime {
    date.midnight().assume_offset(DISPLAY_OFFSET)
}

/// `23:59:59` of `date` in the display zone. Sub-second instants after that
/// fall outside the day.
pub fn end_of_day(date: Date) -> OffsetDateTime {
    PrimitiveDateTime::new(date, time!(23:59:59)).assume_offset(DISPLAY_OFFSET)
}

pub mod naive_utc {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::macros::format_description;
    use time::{OffsetDateTime, UtcOffset};

    pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rendered = value
            .to_offset(UtcOffset::UTC)
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second]"
            ))
            .map_err(S::Error::custom)?;
        serializer.serialize_str(&rendered)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_backend_timestamp(&raw).map_err(|error| D::Error::custom(format!("{error:#}")))
    }
}
