use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rust_decimal::Decimal;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{auth, now};
use crate::models::{Package, PackageInput};
use crate::services::ledger;
use crate::state::AppState;

fn validate(input: &PackageInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("package name is required".to_string()));
    }
    if input.price < Decimal::ZERO {
        return Err(AppError::Validation("package price cannot be negative".to_string()));
    }
    if input.price > ledger::max_amount() {
        return Err(AppError::Validation(format!(
            "package price cannot exceed {}",
            ledger::max_amount()
        )));
    }
    Ok(())
}

// GET /api/packages
pub async fn list_packages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Package>>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    Ok(Json(queries::list_packages(&db, &tenant)?))
}

// GET /api/packages/:id
pub async fn get_package(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Package>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    queries::get_package(&db, &tenant, &id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("package {id}")))
}

// POST /api/packages
pub async fn create_package(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PackageInput>,
) -> Result<(StatusCode, Json<Package>), AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;
    validate(&body)?;

    let package = Package {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant,
        name: body.name.trim().to_string(),
        description: body.description,
        price: body.price,
        created_at: now(),
    };

    let db = state.conn()?;
    queries::create_package(&db, &package)?;
    Ok((StatusCode::CREATED, Json(package)))
}

// PUT /api/packages/:id
pub async fn update_package(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PackageInput>,
) -> Result<Json<Package>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;
    validate(&body)?;

    let db = state.conn()?;
    let existing = queries::get_package(&db, &tenant, &id)?
        .ok_or_else(|| AppError::NotFound(format!("package {id}")))?;
    let package = Package {
        name: body.name.trim().to_string(),
        description: body.description,
        price: body.price,
        ..existing
    };
    queries::update_package(&db, &package)?;
    Ok(Json(package))
}

// DELETE /api/packages/:id
pub async fn delete_package(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    if !queries::delete_package(&db, &tenant, &id)? {
        return Err(AppError::NotFound(format!("package {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
