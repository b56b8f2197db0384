//! Timestamps are stored as 100 ns ticks since 1601-01-01T00:00:00Z.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

const TICKS_PER_SECOND: u64 = 10_000_000;

const FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Parses `yyyy-mm-ddThh:mm:ss[.zzz]`, read as UTC, into ticks.
pub fn parse_ticks(value: &str) -> Result<u64> {
    let invalid = || Error::InvalidTimestamp {
        value: value.to_string(),
    };

    let datetime = FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(invalid)?;
    ticks(datetime).ok_or_else(invalid)
}

pub fn ticks(datetime: NaiveDateTime) -> Option<u64> {
    let epoch = NaiveDate::from_ymd_opt(1601, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let seconds = datetime.signed_duration_since(epoch).num_seconds();
    if seconds < 0 {
        return None;
    }
    // leap second representations carry nanos >= 1e9
    let sub = (datetime.nanosecond() % 1_000_000_000) as u64 / 100;
    (seconds as u64)
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(sub)
}
