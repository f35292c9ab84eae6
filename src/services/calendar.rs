use chrono::NaiveDateTime;

use crate::models::Booking;
use crate::services::conflicts;

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// One VEVENT for a dated booking. Bookings without a date have no calendar slot.
pub fn generate_event(booking: &Booking, stamp: NaiveDateTime) -> Option<String> {
    let (start, end) = conflicts::span(&booking.window())?;
    let (dtstart, dtend) = if booking.from_time.is_none() && booking.to_time.is_none() {
        let day = start.date();
        (
            format!("DTSTART;VALUE=DATE:{}", day.format("%Y%m%d")),
            format!("DTEND;VALUE=DATE:{}", (day + chrono::Duration::days(1)).format("%Y%m%d")),
        )
    } else {
        (
            format!("DTSTART:{}", start.format("%Y%m%dT%H%M%S")),
            format!("DTEND:{}", end.format("%Y%m%dT%H%M%S")),
        )
    };

    let mut event = format!(
        "BEGIN:VEVENT\r\n\
         UID:{}@eventdesk\r\n\
         DTSTAMP:{}\r\n\
         {dtstart}\r\n\
         {dtend}\r\n\
         SUMMARY:{}\r\n",
        booking.id,
        stamp.format("%Y%m%dT%H%M%S"),
        escape(&booking.event_name),
    );
    let location = booking
        .venue_name
        .as_deref()
        .or(booking.location.as_deref());
    if let Some(location) = location {
        event.push_str(&format!("LOCATION:{}\r\n", escape(location)));
    }
    if let Some(client) = &booking.client_name {
        event.push_str(&format!("DESCRIPTION:Client: {}\r\n", escape(client)));
    }
    event.push_str("END:VEVENT\r\n");
    Some(event)
}

pub fn generate_ics(bookings: &[Booking], stamp: NaiveDateTime) -> String {
    let mut ics = String::from(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//EventDesk//Bookings//EN\r\n",
    );
    for booking in bookings {
        if let Some(event) = generate_event(booking, stamp) {
            ics.push_str(&event);
        }
    }
    ics.push_str("END:VCALENDAR\r\n");
    ics
}
