use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{auth, now};
use crate::models::DerivedStatus;
use crate::services::{calendar, status};
use crate::state::AppState;

fn ics_response(ics: String, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response()
}

// GET /api/bookings/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let booking = {
        let db = state.conn()?;
        queries::get_booking_by_id(&db, &tenant, &id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?
    };
    if booking.event_date.is_none() {
        return Err(AppError::Validation(
            "booking has no event date to export".to_string(),
        ));
    }

    let ics = calendar::generate_ics(std::slice::from_ref(&booking), now());
    Ok(ics_response(ics, &format!("booking-{id}.ics")))
}

// GET /api/calendar/feed.ics
#[derive(Deserialize)]
pub struct FeedQuery {
    /// Calendar clients cannot send headers, so the token may come in the query string.
    pub token: Option<String>,
}

pub async fn calendar_feed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> Result<Response, AppError> {
    let tenant = match query.token.as_deref() {
        Some(token) => auth::tenant_from_token(token, &state.config)?,
        None => auth::tenant_from_headers(&headers, &state.config)?,
    };

    let now = now();
    let bookings = {
        let db = state.conn()?;
        queries::list_bookings(&db, &tenant, None, None)?
    };
    let upcoming: Vec<_> = bookings
        .into_iter()
        .filter(|b| status::derive(b, now) == DerivedStatus::Confirmed)
        .collect();

    Ok(ics_response(
        calendar::generate_ics(&upcoming, now),
        "bookings.ics",
    ))
}
