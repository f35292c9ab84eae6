use std::collections::HashMap;
use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Bearer token -> tenant id.
    pub tenant_tokens: HashMap<String, String>,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "eventdesk.db".to_string()),
            tenant_tokens: parse_tenant_tokens(
                &env::var("TENANT_TOKENS").unwrap_or_else(|_| "changeme:default".to_string()),
            ),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn tenant_for_token(&self, token: &str) -> Option<&str> {
        self.tenant_tokens.get(token).map(String::as_str)
    }
}

/// Parses `token:tenant,token:tenant`. Malformed entries are skipped with a warning.
pub fn parse_tenant_tokens(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.split_once(':') {
            Some((token, tenant)) if !token.trim().is_empty() && !tenant.trim().is_empty() => {
                Some((token.trim().to_string(), tenant.trim().to_string()))
            }
            _ => {
                tracing::warn!("ignoring malformed TENANT_TOKENS entry");
                None
            }
        })
        .collect()
}
