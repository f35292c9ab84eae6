use axum::http::HeaderMap;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Resolves the tenant for a request from its `Authorization: Bearer` token.
pub fn tenant_from_headers(headers: &HeaderMap, config: &AppConfig) -> Result<String, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    tenant_from_token(token, config)
}

pub fn tenant_from_token(token: &str, config: &AppConfig) -> Result<String, AppError> {
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    config
        .tenant_for_token(token)
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}
