use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{auth, now};
use crate::models::{Payment, PaymentInput};
use crate::services::bookings;
use crate::state::AppState;

// GET /api/payments
#[derive(Deserialize)]
pub struct PaymentsQuery {
    pub booking_id: Option<String>,
}

pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PaymentsQuery>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let payments = queries::list_payments(&db, &tenant, query.booking_id.as_deref())?;
    Ok(Json(payments))
}

// POST /api/payments
#[derive(Deserialize)]
pub struct RecordPaymentRequest {
    pub booking_id: String,
    #[serde(flatten)]
    pub payment: PaymentInput,
}

pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let payment = bookings::record_payment(&db, &tenant, &body.booking_id, body.payment, now())?;
    Ok((StatusCode::CREATED, Json(payment)))
}

// POST /api/payments/:id/refund
#[derive(Deserialize, Default)]
pub struct RefundRequest {
    pub refund_amount: Option<Decimal>,
}

pub async fn refund_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<RefundRequest>>,
) -> Result<Json<Payment>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;
    let Json(body) = body.unwrap_or_default();

    let db = state.conn()?;
    let payment = bookings::refund_payment(&db, &tenant, &id, body.refund_amount)?;
    Ok(Json(payment))
}

// DELETE /api/payments/:id
pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    if !queries::delete_payment(&db, &tenant, &id)? {
        return Err(AppError::NotFound(format!("payment {id}")));
    }
    tracing::info!(tenant = %tenant, payment_id = %id, "payment deleted");
    Ok(StatusCode::NO_CONTENT)
}
