use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::errors::AppError;
use crate::handlers::{auth, now};
use crate::services::bookings;
use crate::services::dashboard::{self, DashboardStats};
use crate::state::AppState;

// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    let views = bookings::list_views(&db, &tenant, None, None, None, now())?;
    Ok(Json(dashboard::summarize(&views)))
}
