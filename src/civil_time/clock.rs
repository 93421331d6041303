use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Lima has observed UTC−05:00 without daylight saving since 1994.
pub const LIMA_OFFSET_SECONDS: i32 = -5 * 3600;

/// The business's home timezone, as a fixed UTC offset.
///
/// Deserializable so hosts can load it from their own configuration:
///
/// ```
/// use comprobante::civil_time::CivilClock;
///
/// let clock: CivilClock = serde_json::from_str(r#"{"zone":"America/Bogota"}"#).unwrap();
/// assert_eq!(clock.offset_seconds, -5 * 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CivilClock {
    /// IANA-style label, informational only.
    pub zone: String,
    /// Seconds east of UTC (negative west of Greenwich).
    pub offset_seconds: i32,
}

impl Default for CivilClock {
    fn default() -> Self {
        Self::lima()
    }
}

impl CivilClock {
    pub fn lima() -> Self {
        Self {
            zone: "America/Lima".to_string(),
            offset_seconds: LIMA_OFFSET_SECONDS,
        }
    }

    /// `None` when the offset is outside ±24h.
    pub fn new(zone: impl Into<String>, offset_seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(offset_seconds)?;
        Some(Self {
            zone: zone.into(),
            offset_seconds,
        })
    }

    /// The civil offset. An out-of-range value loaded through serde falls
    /// back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.offset_seconds).unwrap_or_else(|| Utc.fix())
    }

    /// Wall-clock reading of `instant` in the civil zone.
    pub fn to_civil(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset())
    }

    /// Civil calendar date of `instant`.
    pub fn civil_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_civil(instant).date_naive()
    }

    /// Absolute instant of a civil date and wall-clock time.
    pub fn to_utc(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.offset()
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
