//! Time utilities: the clock seam, local calendar days and deadline parsing.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of "now". Everything that compares against the current moment takes one of these
/// (or an explicit `now`) so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Calendar day of `instant` as seen in `tz`.
pub fn local_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Parse a deadline like "2026-02-20 23:59" (or "2026-02-20T23:59") in an IANA tz,
/// returning UTC. RFC3339 input with an explicit offset is accepted as-is.
pub fn parse_local_deadline_to_utc(local: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let local = local.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(local) {
        return Ok(dt.with_timezone(&Utc));
    }

    let ndt = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok())
        .ok_or_else(|| anyhow::anyhow!("invalid local datetime '{local}' (expected YYYY-MM-DD HH:MM)"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// ISO-8601 shapes that carry an offset but are not RFC3339 (`+0200`, `+02`, basic format).
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y%m%dT%H%M%S%.f%#z"];

/// Shapes without an offset; read as UTC.
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%dT%H%M%S%.fZ",
    "%Y%m%dT%H%M%S",
];

/// Parse an ISO-8601 instant as sent over the reminder API.
///
/// Accepts RFC3339 (`2026-03-02T08:45:00.000Z`, `...+02:00`), offsets without a colon or
/// without minutes (`+0200`, `+02`), basic format (`20260302T084500Z`) and a bare date
/// (midnight). Timestamps without an offset are read as UTC. Returns `None` for anything
/// else.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(ndt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(ndt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Helper: format a UTC time into RFC3339 with millisecond precision and a `Z` suffix.
pub fn to_rfc3339_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
