use comprobante::civil_time::*;

fn main() {
    let clock = CivilClock::lima();

    // Values as they arrive from the API.
    let issued = "2026-01-24T15:00:00.000Z";
    let departure = "1970-01-01T07:30:00.000Z";

    println!("Issue date:      {}", format_civil_date(issued));
    println!("Issued at:       {}", format_instant(issued, true, &clock));
    println!(
        "Departure:       {}",
        format_civil_time(departure, TimeStyle::TwelveHour, &clock)
    );
    println!(
        "Departure (24h): {}",
        format_civil_time(departure, TimeStyle::TwentyFourHour, &clock)
    );
    println!("Garbage:         {}", format_instant("mañana", true, &clock));

    // A form entry in Lima, converted for the wire.
    match local_inputs_to_utc_instant("2026-01-24", "21:30", &clock) {
        Some(instant) => {
            let wire = WireTime::from_utc(instant);
            println!("Form 24/01/2026 21:30 -> {}", wire.to_wire());
            println!("Back again:      {}", format_instant(&wire.to_wire(), true, &clock));
        }
        None => println!("form input rejected"),
    }
}
