//! Civil time normalization between the UTC wire format and local display.
//!
//! Three notions of time meet here: absolute UTC instants, civil calendar
//! dates with no time component, and civil times of day that the backend
//! ships as timestamps anchored to 1970-01-01. [`WireTime`] tells the last
//! two apart once, at the boundary; the formatting functions never guess
//! again.
//!
//! All functions are pure and total: bad input yields [`PLACEHOLDER`] or
//! `None`, never a panic.
//!
//! ```
//! use comprobante::civil_time::*;
//!
//! let lima = CivilClock::lima();
//! assert_eq!(format_civil_date("2026-01-24T00:00:00.000Z"), "24/01/2026");
//! assert_eq!(format_civil_time("1970-01-01T10:00:00.000Z", TimeStyle::TwelveHour, &lima), "10:00 a.m.");
//! assert_eq!(format_civil_time("2026-01-24T15:00:00.000Z", TimeStyle::TwelveHour, &lima), "10:00 a.m.");
//! ```

mod clock;
mod format;
mod wire;

pub use clock::{CivilClock, LIMA_OFFSET_SECONDS};
pub use format::{
    PLACEHOLDER, TimeStyle, format_civil_date, format_civil_time, format_date, format_instant,
    format_time, format_utc_instant, format_wire_time, local_inputs_to_utc_instant,
};
pub use wire::{WireTime, WireTimeError};
