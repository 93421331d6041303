#![no_main]

use comprobante::civil_time::{
    CivilClock, TimeStyle, WireTime, format_civil_date, format_civil_time, format_instant,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let clock = CivilClock::lima();
        let _ = format_civil_date(s);
        let _ = format_civil_time(s, TimeStyle::TwelveHour, &clock);
        let _ = format_instant(s, true, &clock);

        if let Some(value) = WireTime::parse(s) {
            let _ = value.to_wire();
            let _ = value.civil_time(&clock);
        }
    }
});
