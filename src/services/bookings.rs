use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingInput, BookingStatus, DerivedStatus, Payment, PaymentInput, PaymentSummary,
    PaymentType,
};
use crate::services::{conflicts, ledger, status};

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    #[serde(flatten)]
    pub booking: BookingInput,
    #[serde(default)]
    pub override_conflicts: bool,
    pub initial_payment: Option<PaymentInput>,
}

/// A booking together with the values derived from it at read time.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub derived_status: DerivedStatus,
    pub summary: PaymentSummary,
}

impl BookingView {
    pub fn new(booking: Booking, payments: &[Payment], now: NaiveDateTime) -> Self {
        let derived_status = status::derive(&booking, now);
        let summary = ledger::summarize(&booking.id, booking.total_amount, payments);
        Self {
            booking,
            derived_status,
            summary,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingSaved {
    pub booking: Booking,
    pub payment: Option<Payment>,
    /// Set when the conflict check could not run.
    pub warning: Option<String>,
}

/// Checks the booking form and resolves the total amount: explicit amount, else the
/// package price, else zero.
pub fn validate(
    conn: &Connection,
    tenant_id: &str,
    input: &BookingInput,
    exclude_id: Option<&str>,
) -> Result<Decimal, AppError> {
    if input.event_name.trim().is_empty() {
        return Err(AppError::Validation("event name is required".to_string()));
    }
    if input.client_id.trim().is_empty() {
        return Err(AppError::Validation("client is required".to_string()));
    }
    if let (Some(from), Some(to)) = (input.from_time, input.to_time) {
        if from >= to {
            return Err(AppError::Validation(
                "start time must be before end time".to_string(),
            ));
        }
    }
    if matches!(input.total_amount, Some(amount) if amount < Decimal::ZERO) {
        return Err(AppError::Validation(
            "total amount cannot be negative".to_string(),
        ));
    }
    if matches!(input.total_amount, Some(amount) if amount > ledger::max_amount()) {
        return Err(AppError::Validation(format!(
            "total amount cannot exceed {}",
            ledger::max_amount()
        )));
    }

    if queries::get_client(conn, tenant_id, &input.client_id)?.is_none() {
        return Err(AppError::Validation(format!(
            "unknown client: {}",
            input.client_id
        )));
    }
    if let Some(venue_id) = &input.venue_id {
        if queries::get_venue(conn, tenant_id, venue_id)?.is_none() {
            return Err(AppError::Validation(format!("unknown venue: {venue_id}")));
        }
    }
    let package = match &input.package_id {
        Some(package_id) => match queries::get_package(conn, tenant_id, package_id)? {
            Some(p) => Some(p),
            None => {
                return Err(AppError::Validation(format!(
                    "unknown package: {package_id}"
                )))
            }
        },
        None => None,
    };

    if queries::booking_name_taken(conn, tenant_id, input.event_name.trim(), exclude_id)? {
        return Err(AppError::Validation(format!(
            "a booking named \"{}\" already exists",
            input.event_name.trim()
        )));
    }

    Ok(input
        .total_amount
        .or(package.map(|p| p.price))
        .unwrap_or(Decimal::ZERO))
}

fn validate_payment(input: &PaymentInput) -> Result<(), AppError> {
    if input.amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "payment amount must be positive".to_string(),
        ));
    }
    if input.amount > ledger::max_amount() {
        return Err(AppError::Validation(format!(
            "payment amount cannot exceed {}",
            ledger::max_amount()
        )));
    }
    Ok(())
}

fn conflict_gate(
    conn: &Connection,
    tenant_id: &str,
    request: &BookingRequest,
    exclude_id: Option<&str>,
    now: NaiveDateTime,
) -> Result<Option<String>, AppError> {
    let check = conflicts::check_in_store(
        conn,
        tenant_id,
        &request.booking.window(),
        request.booking.venue_id.as_deref(),
        exclude_id,
        now,
    );
    if check.has_conflicts() && !request.override_conflicts {
        return Err(AppError::Conflicts(check.conflicts));
    }
    if check.has_conflicts() {
        tracing::info!(
            tenant = tenant_id,
            conflicts = check.conflicts.len(),
            "saving booking over scheduling conflicts"
        );
    }
    Ok(check.warning)
}

/// Creates a booking and, if requested, its initial payment. The two writes are not
/// atomic: a failed payment leaves the booking in place and reports
/// [`AppError::PaymentNotRecorded`] so only the payment needs retrying.
pub fn create_booking(
    conn: &Connection,
    tenant_id: &str,
    request: BookingRequest,
    now: NaiveDateTime,
) -> Result<BookingSaved, AppError> {
    let total_amount = validate(conn, tenant_id, &request.booking, None)?;
    if let Some(payment) = &request.initial_payment {
        validate_payment(payment)?;
    }
    let warning = conflict_gate(conn, tenant_id, &request, None, now)?;

    let input = request.booking;
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        event_name: input.event_name.trim().to_string(),
        event_date: input.event_date,
        from_time: input.from_time,
        to_time: input.to_time,
        location: input.location,
        status: BookingStatus::Confirmed,
        total_amount,
        client_id: input.client_id,
        package_id: input.package_id,
        venue_id: input.venue_id,
        client_name: None,
        package_name: None,
        venue_name: None,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(conn, &booking)?;
    tracing::info!(tenant = tenant_id, booking_id = %booking.id, "booking created");

    let payment = match request.initial_payment {
        Some(input) => {
            let payment = new_payment(tenant_id, &booking.id, input, total_amount, now);
            if let Err(e) = queries::create_payment(conn, &payment) {
                tracing::warn!(
                    tenant = tenant_id,
                    booking_id = %booking.id,
                    error = %e,
                    "initial payment not recorded"
                );
                return Err(AppError::PaymentNotRecorded {
                    booking_id: booking.id,
                    reason: e.to_string(),
                });
            }
            Some(payment)
        }
        None => None,
    };

    let booking = queries::get_booking_by_id(conn, tenant_id, &booking.id)?.unwrap_or(booking);
    Ok(BookingSaved {
        booking,
        payment,
        warning,
    })
}

/// Edits a booking through the same validation and conflict path as creation.
pub fn update_booking(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    request: BookingRequest,
    now: NaiveDateTime,
) -> Result<BookingSaved, AppError> {
    if request.initial_payment.is_some() {
        return Err(AppError::Validation(
            "initial payment is only accepted when creating a booking; record it separately"
                .to_string(),
        ));
    }
    let existing = queries::get_booking_by_id(conn, tenant_id, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    let total_amount = validate(conn, tenant_id, &request.booking, Some(id))?;
    let warning = conflict_gate(conn, tenant_id, &request, Some(id), now)?;

    let input = request.booking;
    let updated = Booking {
        event_name: input.event_name.trim().to_string(),
        event_date: input.event_date,
        from_time: input.from_time,
        to_time: input.to_time,
        location: input.location,
        total_amount,
        client_id: input.client_id,
        package_id: input.package_id,
        venue_id: input.venue_id,
        updated_at: now,
        ..existing
    };
    queries::update_booking(conn, &updated)?;
    tracing::info!(tenant = tenant_id, booking_id = id, "booking updated");

    let booking = queries::get_booking_by_id(conn, tenant_id, id)?.unwrap_or(updated);
    Ok(BookingSaved {
        booking,
        payment: None,
        warning,
    })
}

pub fn cancel_booking(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    if !queries::update_booking_status(conn, tenant_id, id, &BookingStatus::Cancelled, now)? {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    tracing::info!(tenant = tenant_id, booking_id = id, "booking cancelled");
    Ok(())
}

fn new_payment(
    tenant_id: &str,
    booking_id: &str,
    input: PaymentInput,
    pending: Decimal,
    now: NaiveDateTime,
) -> Payment {
    Payment {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        booking_id: booking_id.to_string(),
        payment_type: ledger::classify(input.amount, pending, input.is_advance),
        amount: input.amount,
        refund_amount: None,
        method: input.method,
        payment_date: input.payment_date.unwrap_or_else(|| now.date()),
        notes: input.notes,
        created_at: now,
    }
}

/// Records a payment, classifying it against the booking's current pending balance.
pub fn record_payment(
    conn: &Connection,
    tenant_id: &str,
    booking_id: &str,
    input: PaymentInput,
    now: NaiveDateTime,
) -> Result<Payment, AppError> {
    validate_payment(&input)?;
    let booking = queries::get_booking_by_id(conn, tenant_id, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    let existing = queries::list_payments(conn, tenant_id, Some(booking_id))?;
    let summary = ledger::summarize(&booking.id, booking.total_amount, &existing);

    let payment = new_payment(tenant_id, booking_id, input, summary.pending, now);
    queries::create_payment(conn, &payment)?;
    tracing::info!(
        tenant = tenant_id,
        booking_id,
        payment_type = payment.payment_type.as_str(),
        "payment recorded"
    );
    Ok(payment)
}

/// Turns a payment into a refund. Defaults to refunding the whole amount.
pub fn refund_payment(
    conn: &Connection,
    tenant_id: &str,
    payment_id: &str,
    refund_amount: Option<Decimal>,
) -> Result<Payment, AppError> {
    let payment = queries::get_payment(conn, tenant_id, payment_id)?
        .ok_or_else(|| AppError::NotFound(format!("payment {payment_id}")))?;

    if payment.payment_type == PaymentType::Refund {
        return Err(AppError::Validation(
            "payment is already a refund".to_string(),
        ));
    }
    let refund_amount = refund_amount.unwrap_or(payment.amount);
    if refund_amount <= Decimal::ZERO || refund_amount > payment.amount {
        return Err(AppError::Validation(
            "refund amount must be positive and no more than the payment amount".to_string(),
        ));
    }

    queries::mark_refund(conn, tenant_id, payment_id, refund_amount)?;
    tracing::info!(tenant = tenant_id, payment_id, %refund_amount, "payment refunded");

    queries::get_payment(conn, tenant_id, payment_id)?
        .ok_or_else(|| AppError::NotFound(format!("payment {payment_id}")))
}

/// Listing view: derived status and balance per booking. Without a status filter the
/// result is ordered by status rank, then event date.
pub fn list_views(
    conn: &Connection,
    tenant_id: &str,
    status_filter: Option<DerivedStatus>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    now: NaiveDateTime,
) -> Result<Vec<BookingView>, AppError> {
    let mut bookings = queries::list_bookings(conn, tenant_id, from, to)?;
    let payments = queries::list_payments(conn, tenant_id, None)?;

    if status_filter.is_none() {
        status::sort_by_status(&mut bookings, now);
    }

    Ok(bookings
        .into_iter()
        .map(|b| BookingView::new(b, &payments, now))
        .filter(|v| status_filter.map_or(true, |s| v.derived_status == s))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Client, Package, PaymentMethod};
    use chrono::NaiveTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn setup() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        queries::create_client(
            &conn,
            &Client {
                id: "c1".to_string(),
                tenant_id: "t1".to_string(),
                name: "Meera".to_string(),
                email: None,
                phone: None,
                notes: None,
                created_at: dt("2024-01-01 00:00"),
            },
        )
        .unwrap();
        conn
    }

    fn request(name: &str, date: &str, from: &str, to: &str) -> BookingRequest {
        BookingRequest {
            booking: BookingInput {
                event_name: name.to_string(),
                event_date: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
                from_time: NaiveTime::parse_from_str(from, "%H:%M").ok(),
                to_time: NaiveTime::parse_from_str(to, "%H:%M").ok(),
                location: None,
                total_amount: Some(d("10000")),
                client_id: "c1".to_string(),
                package_id: None,
                venue_id: None,
            },
            override_conflicts: false,
            initial_payment: None,
        }
    }

    fn cash(amount: &str) -> PaymentInput {
        PaymentInput {
            amount: d(amount),
            method: PaymentMethod::Cash,
            payment_date: None,
            notes: None,
            is_advance: false,
        }
    }

    const NOW: &str = "2024-04-01 09:00";

    #[test]
    fn test_create_with_initial_payment() {
        let conn = setup();
        let mut req = request("Sangeet", "2024-05-01", "14:00", "16:00");
        req.initial_payment = Some(cash("10000"));

        let saved = create_booking(&conn, "t1", req, dt(NOW)).unwrap();
        let payment = saved.payment.unwrap();
        assert_eq!(payment.payment_type, PaymentType::Full);
        assert_eq!(payment.payment_date, dt(NOW).date());
        assert_eq!(saved.booking.client_name.as_deref(), Some("Meera"));
    }

    #[test]
    fn test_time_range_must_be_ordered() {
        let conn = setup();
        let req = request("Reception", "2024-05-01", "16:00", "16:00");
        let err = create_booking(&conn, "t1", req, dt(NOW)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let conn = setup();
        create_booking(&conn, "t1", request("Haldi", "2024-05-01", "08:00", "10:00"), dt(NOW))
            .unwrap();
        let err = create_booking(&conn, "t1", request("haldi", "2024-06-01", "08:00", "10:00"), dt(NOW))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unknown_client_rejected() {
        let conn = setup();
        let mut req = request("Mehendi", "2024-05-01", "08:00", "10:00");
        req.booking.client_id = "ghost".to_string();
        assert!(matches!(
            create_booking(&conn, "t1", req, dt(NOW)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_conflicts_block_until_overridden() {
        let conn = setup();
        create_booking(&conn, "t1", request("A", "2024-05-01", "14:00", "16:00"), dt(NOW)).unwrap();

        let err = create_booking(&conn, "t1", request("B", "2024-05-01", "15:00", "17:00"), dt(NOW))
            .unwrap_err();
        match err {
            AppError::Conflicts(found) => assert_eq!(found[0].event_name, "A"),
            other => panic!("expected conflicts, got {other:?}"),
        }

        let mut req = request("B", "2024-05-01", "15:00", "17:00");
        req.override_conflicts = true;
        assert!(create_booking(&conn, "t1", req, dt(NOW)).is_ok());
    }

    #[test]
    fn test_update_excludes_itself_from_conflicts() {
        let conn = setup();
        let saved =
            create_booking(&conn, "t1", request("A", "2024-05-01", "14:00", "16:00"), dt(NOW)).unwrap();

        let moved = request("A", "2024-05-01", "15:00", "18:00");
        let updated = update_booking(&conn, "t1", &saved.booking.id, moved, dt(NOW)).unwrap();
        assert_eq!(updated.booking.to_time, NaiveTime::from_hms_opt(18, 0, 0));
        assert_eq!(updated.booking.created_at, saved.booking.created_at);
    }

    #[test]
    fn test_package_price_fills_total() {
        let conn = setup();
        queries::create_package(
            &conn,
            &Package {
                id: "p1".to_string(),
                tenant_id: "t1".to_string(),
                name: "Platinum".to_string(),
                description: None,
                price: d("150000"),
                created_at: dt("2024-01-01 00:00"),
            },
        )
        .unwrap();

        let mut req = request("Wedding", "2024-05-01", "10:00", "22:00");
        req.booking.total_amount = None;
        req.booking.package_id = Some("p1".to_string());
        let saved = create_booking(&conn, "t1", req, dt(NOW)).unwrap();
        assert_eq!(saved.booking.total_amount, d("150000"));
        assert_eq!(saved.booking.package_name.as_deref(), Some("Platinum"));
    }

    #[test]
    fn test_record_payment_classifies_against_pending() {
        let conn = setup();
        let saved =
            create_booking(&conn, "t1", request("A", "2024-05-01", "14:00", "16:00"), dt(NOW)).unwrap();
        let id = saved.booking.id;

        let first = record_payment(&conn, "t1", &id, cash("4000"), dt(NOW)).unwrap();
        assert_eq!(first.payment_type, PaymentType::Partial);

        let second = record_payment(&conn, "t1", &id, cash("6000"), dt(NOW)).unwrap();
        assert_eq!(second.payment_type, PaymentType::Full);

        let third = record_payment(&conn, "t1", &id, cash("1"), dt(NOW)).unwrap();
        assert_eq!(third.payment_type, PaymentType::Overpaid);

        assert!(matches!(
            record_payment(&conn, "t1", &id, cash("0"), dt(NOW)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_refund_reduces_paid() {
        let conn = setup();
        let saved =
            create_booking(&conn, "t1", request("A", "2024-05-01", "14:00", "16:00"), dt(NOW)).unwrap();
        let id = saved.booking.id;
        let p = record_payment(&conn, "t1", &id, cash("4000"), dt(NOW)).unwrap();

        assert!(matches!(
            refund_payment(&conn, "t1", &p.id, Some(d("5000"))),
            Err(AppError::Validation(_))
        ));
        let refunded = refund_payment(&conn, "t1", &p.id, None).unwrap();
        assert_eq!(refunded.refund_amount, Some(d("4000")));
        assert!(matches!(
            refund_payment(&conn, "t1", &p.id, None),
            Err(AppError::Validation(_))
        ));

        let views = list_views(&conn, "t1", None, None, None, dt(NOW)).unwrap();
        assert_eq!(views[0].summary.total_paid, Decimal::ZERO);
        assert_eq!(views[0].summary.pending, d("10000"));
    }

    #[test]
    fn test_list_views_sorted_and_filtered() {
        let conn = setup();
        let past = create_booking(&conn, "t1", request("Past", "2024-03-01", "10:00", "12:00"), dt(NOW))
            .unwrap();
        let later = create_booking(&conn, "t1", request("Later", "2024-06-01", "10:00", "12:00"), dt(NOW))
            .unwrap();
        let soon = create_booking(&conn, "t1", request("Soon", "2024-05-01", "10:00", "12:00"), dt(NOW))
            .unwrap();
        let dropped = create_booking(&conn, "t1", request("Dropped", "2024-04-15", "10:00", "12:00"), dt(NOW))
            .unwrap();
        cancel_booking(&conn, "t1", &dropped.booking.id, dt(NOW)).unwrap();

        let all = list_views(&conn, "t1", None, None, None, dt(NOW)).unwrap();
        let order: Vec<_> = all.iter().map(|v| v.booking.id.clone()).collect();
        assert_eq!(
            order,
            vec![
                soon.booking.id.clone(),
                later.booking.id.clone(),
                past.booking.id.clone(),
                dropped.booking.id.clone()
            ]
        );

        let completed =
            list_views(&conn, "t1", Some(DerivedStatus::Completed), None, None, dt(NOW)).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].booking.id, past.booking.id);
    }

    #[test]
    fn test_failed_initial_payment_keeps_booking() {
        let conn = setup();
        conn.execute_batch(
            "CREATE TRIGGER reject_payments BEFORE INSERT ON payments
             BEGIN SELECT RAISE(ABORT, 'payments offline'); END;",
        )
        .unwrap();

        let mut req = request("Sangeet", "2024-05-01", "14:00", "16:00");
        req.initial_payment = Some(cash("2500"));

        let booking_id = match create_booking(&conn, "t1", req, dt(NOW)) {
            Err(AppError::PaymentNotRecorded { booking_id, reason }) => {
                assert!(reason.contains("payments offline"));
                booking_id
            }
            other => panic!("expected payment not recorded, got {other:?}"),
        };

        let kept = queries::get_booking_by_id(&conn, "t1", &booking_id).unwrap();
        assert!(kept.is_some());
        assert!(queries::list_payments(&conn, "t1", Some(&booking_id))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_rejects_initial_payment() {
        let conn = setup();
        let saved =
            create_booking(&conn, "t1", request("A", "2024-05-01", "14:00", "16:00"), dt(NOW)).unwrap();

        let mut edit = request("A", "2024-05-01", "14:00", "17:00");
        edit.initial_payment = Some(cash("1000"));
        assert!(matches!(
            update_booking(&conn, "t1", &saved.booking.id, edit, dt(NOW)),
            Err(AppError::Validation(_))
        ));

        let stored = queries::get_booking_by_id(&conn, "t1", &saved.booking.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.to_time, NaiveTime::from_hms_opt(16, 0, 0));
        assert!(queries::list_payments(&conn, "t1", None).unwrap().is_empty());
    }

    #[test]
    fn test_amounts_above_cap_rejected() {
        let conn = setup();
        let mut req = request("Gala", "2024-05-01", "18:00", "22:00");
        req.booking.total_amount = Some(Decimal::MAX);
        assert!(matches!(
            create_booking(&conn, "t1", req, dt(NOW)),
            Err(AppError::Validation(_))
        ));

        let mut req = request("Gala", "2024-05-01", "18:00", "22:00");
        req.booking.total_amount = Some(d("0.5"));
        let saved = create_booking(&conn, "t1", req, dt(NOW)).unwrap();
        assert!(matches!(
            record_payment(&conn, "t1", &saved.booking.id, cash("50000000000000000000000000000"), dt(NOW)),
            Err(AppError::Validation(_))
        ));

        let largest = ledger::max_amount().to_string();
        let p = record_payment(&conn, "t1", &saved.booking.id, cash(&largest), dt(NOW)).unwrap();
        assert_eq!(p.payment_type, PaymentType::Overpaid);
        let views = list_views(&conn, "t1", None, None, None, dt(NOW)).unwrap();
        assert_eq!(views[0].summary.payment_progress, d("100"));
        assert_eq!(views[0].summary.pending, Decimal::ZERO);
    }

    #[test]
    fn test_cancel_stamps_updated_at() {
        let conn = setup();
        let saved =
            create_booking(&conn, "t1", request("A", "2024-05-01", "14:00", "16:00"), dt(NOW)).unwrap();
        let later = dt("2024-04-03 17:45");
        cancel_booking(&conn, "t1", &saved.booking.id, later).unwrap();

        let stored = queries::get_booking_by_id(&conn, "t1", &saved.booking.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.updated_at, later);
    }

    #[test]
    fn test_cancel_missing_booking() {
        let conn = setup();
        assert!(matches!(
            cancel_booking(&conn, "t1", "nope", dt(NOW)),
            Err(AppError::NotFound(_))
        ));
    }
}
