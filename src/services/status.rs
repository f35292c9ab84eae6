use chrono::{NaiveDateTime, NaiveTime};

use crate::models::{Booking, BookingStatus, DerivedStatus, EventWindow};

/// Effective end of an event day when no end time was entered.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// The moment an event is over: its end time, or 23:59 on the event date.
pub fn event_end(window: &EventWindow) -> Option<NaiveDateTime> {
    let date = window.event_date?;
    Some(date.and_time(window.to_time.unwrap_or_else(end_of_day)))
}

pub fn derive_status(
    status: BookingStatus,
    window: &EventWindow,
    now: NaiveDateTime,
) -> DerivedStatus {
    if status == BookingStatus::Cancelled {
        return DerivedStatus::Cancelled;
    }
    match event_end(window) {
        Some(end) if now > end => DerivedStatus::Completed,
        _ => DerivedStatus::Confirmed,
    }
}

pub fn derive(booking: &Booking, now: NaiveDateTime) -> DerivedStatus {
    derive_status(booking.status, &booking.window(), now)
}

/// Orders bookings by derived status rank, then event date ascending.
/// Undated bookings sort after dated ones of the same rank.
pub fn sort_by_status(bookings: &mut [Booking], now: NaiveDateTime) {
    bookings.sort_by_cached_key(|b| {
        (
            derive(b, now).rank(),
            b.event_date.is_none(),
            b.event_date,
            b.from_time,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn window(date: Option<&str>, from: Option<&str>, to: Option<&str>) -> EventWindow {
        EventWindow {
            event_date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            from_time: from.map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap()),
            to_time: to.map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap()),
        }
    }

    #[test]
    fn test_cancelled_always_cancelled() {
        let now = dt("2024-05-01 12:00");
        for w in [
            window(None, None, None),
            window(Some("2020-01-01"), None, None),
            window(Some("2030-01-01"), Some("10:00"), Some("12:00")),
        ] {
            assert_eq!(
                derive_status(BookingStatus::Cancelled, &w, now),
                DerivedStatus::Cancelled
            );
        }
    }

    #[test]
    fn test_no_date_is_confirmed() {
        let w = window(None, None, None);
        assert_eq!(
            derive_status(BookingStatus::Confirmed, &w, dt("2099-01-01 00:00")),
            DerivedStatus::Confirmed
        );
    }

    #[test]
    fn test_future_event_is_confirmed() {
        let now = dt("2024-05-01 12:00");
        let w = window(Some("2024-05-02"), Some("10:00"), Some("11:00"));
        assert_eq!(derive_status(BookingStatus::Confirmed, &w, now), DerivedStatus::Confirmed);
    }

    #[test]
    fn test_past_event_is_completed() {
        let now = dt("2024-05-01 12:00");
        let w = window(Some("2024-04-30"), Some("10:00"), Some("11:00"));
        assert_eq!(derive_status(BookingStatus::Confirmed, &w, now), DerivedStatus::Completed);
    }

    #[test]
    fn test_same_day_uses_end_time() {
        let w = window(Some("2024-05-01"), Some("14:00"), Some("16:00"));
        assert_eq!(
            derive_status(BookingStatus::Confirmed, &w, dt("2024-05-01 15:59")),
            DerivedStatus::Confirmed
        );
        assert_eq!(
            derive_status(BookingStatus::Confirmed, &w, dt("2024-05-01 16:00")),
            DerivedStatus::Confirmed
        );
        assert_eq!(
            derive_status(BookingStatus::Confirmed, &w, dt("2024-05-01 16:01")),
            DerivedStatus::Completed
        );
    }

    #[test]
    fn test_missing_end_time_runs_to_end_of_day() {
        let w = window(Some("2024-05-01"), Some("09:00"), None);
        assert_eq!(
            derive_status(BookingStatus::Confirmed, &w, dt("2024-05-01 23:00")),
            DerivedStatus::Confirmed
        );
        assert_eq!(
            derive_status(BookingStatus::Confirmed, &w, dt("2024-05-02 00:00")),
            DerivedStatus::Completed
        );
    }

    #[test]
    fn test_status_ranks() {
        assert!(DerivedStatus::Confirmed.rank() < DerivedStatus::Completed.rank());
        assert!(DerivedStatus::Completed.rank() < DerivedStatus::Cancelled.rank());
    }
}
