#![no_main]

use comprobante::civil_time::{CivilClock, local_inputs_to_utc_instant};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, &str, i32)| {
    let (date, time, offset) = input;
    let clock = CivilClock::new("fuzz", offset % 86_400).unwrap_or_default();
    let _ = local_inputs_to_utc_instant(date, time, &clock);
});
