use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::models::{hhmm, Booking, DerivedStatus, EventWindow};
use crate::services::status;

/// Result of an advisory conflict check. Conflicts never block a write on their own.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConflictCheck {
    pub conflicts: Vec<Booking>,
    pub warning: Option<String>,
}

impl ConflictCheck {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConflictQuery {
    pub event_date: Option<chrono::NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub from_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub to_time: Option<NaiveTime>,
    pub venue_id: Option<String>,
    pub exclude_id: Option<String>,
}

impl ConflictQuery {
    pub fn window(&self) -> EventWindow {
        EventWindow {
            event_date: self.event_date,
            from_time: self.from_time,
            to_time: self.to_time,
        }
    }
}

/// Half-open `[start, end)` span of a window; missing times default to 00:00 and 23:59.
pub fn span(window: &EventWindow) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let date = window.event_date?;
    let start = date.and_time(window.from_time.unwrap_or(NaiveTime::MIN));
    let end = date.and_time(window.to_time.unwrap_or_else(status::end_of_day));
    Some((start, end))
}

fn same_venue(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Existing bookings that overlap the candidate window. Only bookings whose derived
/// status is still confirmed take part.
pub fn find_conflicts(
    candidate: &EventWindow,
    venue_id: Option<&str>,
    existing: &[Booking],
    exclude_id: Option<&str>,
    now: NaiveDateTime,
) -> Vec<Booking> {
    let Some((start, end)) = span(candidate) else {
        return vec![];
    };

    existing
        .iter()
        .filter(|b| Some(b.id.as_str()) != exclude_id)
        .filter(|b| status::derive(b, now) == DerivedStatus::Confirmed)
        .filter(|b| same_venue(venue_id, b.venue_id.as_deref()))
        .filter(|b| match span(&b.window()) {
            Some((other_start, other_end)) => start < other_end && other_start < end,
            None => false,
        })
        .cloned()
        .collect()
}

/// Runs the detector over a fetch of existing bookings. A failed fetch degrades to an
/// empty result carrying a warning.
pub fn check(
    fetched: anyhow::Result<Vec<Booking>>,
    candidate: &EventWindow,
    venue_id: Option<&str>,
    exclude_id: Option<&str>,
    now: NaiveDateTime,
) -> ConflictCheck {
    match fetched {
        Ok(existing) => ConflictCheck {
            conflicts: find_conflicts(candidate, venue_id, &existing, exclude_id, now),
            warning: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "conflict check failed, continuing without it");
            ConflictCheck {
                conflicts: vec![],
                warning: Some("could not check for scheduling conflicts".to_string()),
            }
        }
    }
}

pub fn check_in_store(
    conn: &Connection,
    tenant_id: &str,
    candidate: &EventWindow,
    venue_id: Option<&str>,
    exclude_id: Option<&str>,
    now: NaiveDateTime,
) -> ConflictCheck {
    let Some(date) = candidate.event_date else {
        return ConflictCheck::default();
    };
    let fetched = queries::list_bookings(conn, tenant_id, Some(date), Some(date));
    check(fetched, candidate, venue_id, exclude_id, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::BookingStatus;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn window(date: &str, from: Option<&str>, to: Option<&str>) -> EventWindow {
        EventWindow {
            event_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            from_time: from.map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap()),
            to_time: to.map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap()),
        }
    }

    fn booking(id: &str, w: EventWindow, venue: Option<&str>) -> Booking {
        let now = dt("2024-01-01 00:00");
        Booking {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            event_name: format!("Event {id}"),
            event_date: w.event_date,
            from_time: w.from_time,
            to_time: w.to_time,
            location: None,
            status: BookingStatus::Confirmed,
            total_amount: Decimal::ZERO,
            client_id: "c1".to_string(),
            package_id: None,
            venue_id: venue.map(str::to_string),
            client_name: None,
            package_name: None,
            venue_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn add_client(conn: &Connection, tenant: &str, id: &str) {
        let client = crate::models::Client {
            id: id.to_string(),
            tenant_id: tenant.to_string(),
            name: format!("Client {id}"),
            email: None,
            phone: None,
            notes: None,
            created_at: dt("2024-01-01 00:00"),
        };
        db::queries::create_client(conn, &client).unwrap();
    }

    const NOW: &str = "2024-04-01 09:00";

    #[test]
    fn test_overlap_detected() {
        let candidate = window("2024-05-01", Some("14:00"), Some("16:00"));
        let existing = vec![booking(
            "a",
            window("2024-05-01", Some("15:00"), Some("17:00")),
            Some("V"),
        )];
        let found = find_conflicts(&candidate, Some("V"), &existing, None, dt(NOW));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[test]
    fn test_touching_boundary_is_not_overlap() {
        let candidate = window("2024-05-01", Some("14:00"), Some("16:00"));
        let existing = vec![booking(
            "a",
            window("2024-05-01", Some("16:00"), Some("18:00")),
            Some("V"),
        )];
        assert!(find_conflicts(&candidate, Some("V"), &existing, None, dt(NOW)).is_empty());
    }

    #[test]
    fn test_symmetric() {
        let a = booking("a", window("2024-05-01", Some("10:00"), Some("13:00")), None);
        let b = booking("b", window("2024-05-01", Some("12:00"), Some("15:00")), None);
        let c = booking("c", window("2024-05-01", Some("13:00"), Some("14:00")), None);
        for (x, y) in [(&a, &b), (&a, &c), (&b, &c)] {
            let xy = !find_conflicts(&x.window(), None, std::slice::from_ref(y), None, dt(NOW))
                .is_empty();
            let yx = !find_conflicts(&y.window(), None, std::slice::from_ref(x), None, dt(NOW))
                .is_empty();
            assert_eq!(xy, yx, "{} vs {}", x.id, y.id);
        }
    }

    #[test]
    fn test_excludes_edited_booking() {
        let a = booking("a", window("2024-05-01", Some("10:00"), Some("12:00")), None);
        let found = find_conflicts(&a.window(), None, &[a.clone()], Some("a"), dt(NOW));
        assert!(found.is_empty());
    }

    #[test]
    fn test_cancelled_and_completed_never_conflict() {
        let mut cancelled = booking("x", window("2024-05-01", None, None), None);
        cancelled.status = BookingStatus::Cancelled;
        let past = booking("y", window("2024-03-01", None, None), None);

        let found = find_conflicts(
            &window("2024-05-01", Some("10:00"), Some("11:00")),
            None,
            &[cancelled],
            None,
            dt(NOW),
        );
        assert!(found.is_empty());

        let found = find_conflicts(
            &window("2024-03-01", Some("10:00"), Some("11:00")),
            None,
            &[past],
            None,
            dt(NOW),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_missing_times_cover_whole_day() {
        let candidate = window("2024-05-01", None, None);
        let existing = vec![booking(
            "a",
            window("2024-05-01", Some("20:00"), Some("22:00")),
            None,
        )];
        assert_eq!(find_conflicts(&candidate, None, &existing, None, dt(NOW)).len(), 1);
    }

    #[test]
    fn test_different_venues_do_not_conflict() {
        let candidate = window("2024-05-01", Some("14:00"), Some("16:00"));
        let existing = vec![
            booking("a", window("2024-05-01", Some("15:00"), Some("17:00")), Some("V2")),
            booking("b", window("2024-05-01", Some("15:00"), Some("17:00")), None),
        ];
        let found = find_conflicts(&candidate, Some("V1"), &existing, None, dt(NOW));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");
    }

    #[test]
    fn test_undated_candidate_never_conflicts() {
        let existing = vec![booking("a", window("2024-05-01", None, None), None)];
        let found = find_conflicts(&EventWindow::default(), None, &existing, None, dt(NOW));
        assert!(found.is_empty());
    }

    #[test]
    fn test_failed_fetch_degrades_to_warning() {
        let result = check(
            Err(anyhow::anyhow!("connection reset")),
            &window("2024-05-01", None, None),
            None,
            None,
            dt(NOW),
        );
        assert!(!result.has_conflicts());
        assert!(result.warning.is_some());
    }

    #[test]
    fn test_check_in_store_is_tenant_scoped() {
        let conn = db::init_db(":memory:").unwrap();
        add_client(&conn, "t1", "c1");
        add_client(&conn, "t2", "c2");

        let mut mine = booking("a", window("2024-05-01", Some("10:00"), Some("12:00")), None);
        mine.client_id = "c1".to_string();
        db::queries::create_booking(&conn, &mine).unwrap();

        let mut theirs = booking("b", window("2024-05-01", Some("10:00"), Some("12:00")), None);
        theirs.tenant_id = "t2".to_string();
        theirs.client_id = "c2".to_string();
        db::queries::create_booking(&conn, &theirs).unwrap();

        let candidate = window("2024-05-01", Some("11:00"), Some("13:00"));
        let result = check_in_store(&conn, "t1", &candidate, None, None, dt(NOW));
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].id, "a");
        assert!(result.warning.is_none());
    }
}
