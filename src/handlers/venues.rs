use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{auth, now};
use crate::models::{client::non_blank, Venue, VenueInput};
use crate::state::AppState;

// GET /api/venues
pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Venue>>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    Ok(Json(queries::list_venues(&db, &tenant)?))
}

// GET /api/venues/:id
pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Venue>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    queries::get_venue(&db, &tenant, &id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("venue {id}")))
}

// POST /api/venues
pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<VenueInput>,
) -> Result<(StatusCode, Json<Venue>), AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("venue name is required".to_string()));
    }

    let venue = Venue {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant,
        name: body.name.trim().to_string(),
        address: non_blank(body.address),
        created_at: now(),
    };

    let db = state.conn()?;
    queries::create_venue(&db, &venue)?;
    Ok((StatusCode::CREATED, Json(venue)))
}

// PUT /api/venues/:id
pub async fn update_venue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<VenueInput>,
) -> Result<Json<Venue>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("venue name is required".to_string()));
    }

    let db = state.conn()?;
    let existing = queries::get_venue(&db, &tenant, &id)?
        .ok_or_else(|| AppError::NotFound(format!("venue {id}")))?;
    let venue = Venue {
        name: body.name.trim().to_string(),
        address: non_blank(body.address),
        ..existing
    };
    queries::update_venue(&db, &venue)?;
    Ok(Json(venue))
}

// DELETE /api/venues/:id
pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    if !queries::delete_venue(&db, &tenant, &id)? {
        return Err(AppError::NotFound(format!("venue {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
