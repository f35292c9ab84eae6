use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{auth, now};
use crate::models::{Client, ClientInput};
use crate::state::AppState;

fn validate(input: &ClientInput) -> Result<(), AppError> {
    if input.name.is_empty() {
        return Err(AppError::Validation("client name is required".to_string()));
    }
    if matches!(&input.email, Some(email) if !email.contains('@')) {
        return Err(AppError::Validation("client email is not valid".to_string()));
    }
    Ok(())
}

// GET /api/clients
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Client>>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    Ok(Json(queries::list_clients(&db, &tenant)?))
}

// GET /api/clients/:id
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Client>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    queries::get_client(&db, &tenant, &id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))
}

// POST /api/clients
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ClientInput>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;
    let input = body.normalized();
    validate(&input)?;

    let client = Client {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant,
        name: input.name,
        email: input.email,
        phone: input.phone,
        notes: input.notes,
        created_at: now(),
    };

    let db = state.conn()?;
    queries::create_client(&db, &client)?;
    tracing::info!(tenant = %client.tenant_id, client_id = %client.id, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

// PUT /api/clients/:id
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ClientInput>,
) -> Result<Json<Client>, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;
    let input = body.normalized();
    validate(&input)?;

    let db = state.conn()?;
    let existing = queries::get_client(&db, &tenant, &id)?
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;
    let client = Client {
        name: input.name,
        email: input.email,
        phone: input.phone,
        notes: input.notes,
        ..existing
    };
    queries::update_client(&db, &client)?;
    Ok(Json(client))
}

// DELETE /api/clients/:id
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let tenant = auth::tenant_from_headers(&headers, &state.config)?;

    let db = state.conn()?;
    if !queries::delete_client(&db, &tenant, &id)? {
        return Err(AppError::NotFound(format!("client {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
