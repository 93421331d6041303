use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::clock::CivilClock;

/// A timestamp as it crosses the wire, classified once at the boundary.
///
/// The backend stores TIME columns as civil wall-clock readings anchored to
/// 1970-01-01 UTC. Those must never be shifted into the civil zone; every
/// other timestamp is an absolute instant that must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireTime {
    /// Absolute instant.
    Instant(DateTime<Utc>),
    /// Civil wall-clock time of day, no zone attached.
    CivilTime(NaiveTime),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized wire timestamp: {0:?}")]
pub struct WireTimeError(pub String);

impl WireTime {
    /// Classify a UTC timestamp: the Unix epoch date marks a time-only value.
    pub fn from_utc(value: DateTime<Utc>) -> Self {
        if is_epoch_date(&value) {
            Self::CivilTime(value.time())
        } else {
            Self::Instant(value)
        }
    }

    /// Parse an RFC 3339 timestamp, or a bare `HH:MM[:SS]` time of day.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::from_utc(dt.with_timezone(&Utc)));
        }
        ["%H:%M:%S%.f", "%H:%M"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
            .map(Self::CivilTime)
    }

    /// Canonical wire shape, e.g. `2026-01-24T15:00:00.000Z` or
    /// `1970-01-01T10:00:00.000Z`.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Instant(instant) => instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::CivilTime(time) => format!("1970-01-01T{}Z", time.format("%H:%M:%S%.3f")),
        }
    }

    /// Wall-clock time of day in the civil zone.
    pub fn civil_time(&self, clock: &CivilClock) -> NaiveTime {
        match self {
            Self::Instant(instant) => clock.to_civil(*instant).time(),
            Self::CivilTime(time) => *time,
        }
    }

    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Instant(instant) => Some(*instant),
            Self::CivilTime(_) => None,
        }
    }
}

fn is_epoch_date(value: &DateTime<Utc>) -> bool {
    value.year() == 1970 && value.month() == 1 && value.day() == 1
}

impl fmt::Display for WireTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl FromStr for WireTime {
    type Err = WireTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| WireTimeError(s.to_string()))
    }
}

impl Serialize for WireTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for WireTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
