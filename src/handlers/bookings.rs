use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{auth, now};
use crate::models::{DerivedStatus, Payment, PaymentSummary};
use crate::services::bookings::{self, BookingRequest, BookingSaved, BookingView};
use crate::services::conflicts::{self, ConflictCheck, ConflictQuery};
use crate::services::ledger;
use crate::state::AppState;

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let status_filter = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            DerivedStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown status filter: {s}")))?,
        ),
        None => None,
    };

    let db = state.conn()?;
    let views = bookings::list_views(&db, &tenant, status_filter, query.from, query.to, now())?;
    Ok(Json(views))
}

// GET /api/bookings/:id
#[derive(Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    view: BookingView,
    payments: Vec<Payment>,
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingDetail>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let booking = queries::get_booking_by_id(&db, &tenant, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    let payments = queries::list_payments(&db, &tenant, Some(&id))?;

    Ok(Json(BookingDetail {
        view: BookingView::new(booking, &payments, now()),
        payments,
    }))
}

// GET /api/bookings/:id/summary
pub async fn booking_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PaymentSummary>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let booking = queries::get_booking_by_id(&db, &tenant, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    let payments = queries::list_payments(&db, &tenant, Some(&id))?;

    Ok(Json(ledger::summarize(
        &booking.id,
        booking.total_amount,
        &payments,
    )))
}

// POST /api/bookings/check-conflicts
pub async fn check_conflicts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(query): Json<ConflictQuery>,
) -> Result<Json<ConflictCheck>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let check = conflicts::check_in_store(
        &db,
        &tenant,
        &query.window(),
        query.venue_id.as_deref(),
        query.exclude_id.as_deref(),
        now(),
    );
    Ok(Json(check))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingSaved>), AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let saved = bookings::create_booking(&db, &tenant, body, now())?;
    Ok((StatusCode::CREATED, Json(saved)))
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<BookingRequest>,
) -> Result<Json<BookingSaved>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let saved = bookings::update_booking(&db, &tenant, &id, body, now())?;
    Ok(Json(saved))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    bookings::cancel_booking(&db, &tenant, &id, now())?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    if !queries::delete_booking(&db, &tenant, &id)? {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    tracing::info!(tenant = %tenant, booking_id = %id, "booking deleted");
    Ok(StatusCode::NO_CONTENT)
}
