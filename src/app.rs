use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::HeaderValue,
    middleware::from_fn_with_state,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::JwtKeys;
use crate::config::SecurityConfig;
use crate::configuration::ConfigStore;
use crate::database::port::{bounded, PersistencePort};
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::{identity_middleware, ApiResponse, ApiResult};

/// Shared handles every request needs
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub persistence: Arc<dyn PersistencePort>,
    pub jwt: Arc<JwtKeys>,
    pub max_rows: i64,
    pub persistence_timeout: Duration,
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected
        .merge(api_routes(state.clone()))
        .with_state(state);

    let security = &crate::config::config().security;
    let router = match cors_layer(security) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    use axum::routing::delete;
    use handlers::{configurations, data, whoami};

    Router::new()
        .route("/api/auth/whoami", get(whoami::get))
        .route(
            "/api/configurations",
            get(configurations::list).post(configurations::save),
        )
        .route("/api/configurations/:id", delete(configurations::delete))
        .route("/api/data/:entity", get(data::list))
        .route_layer(from_fn_with_state(state.jwt.clone(), identity_middleware))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Storefront Reports API",
            "version": version,
            "description": "Tenant-scoped reporting data and encrypted per-user filter configurations",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/whoami (protected)",
                "configurations": "/api/configurations[/:id] (protected)",
                "data": "/api/data/:entity (protected, entity = bots | reports)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    bounded(state.persistence_timeout, state.persistence.health_check())
        .await
        .map_err(|e| {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("database unavailable")
        })?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(enable_cors: bool, origins: &[&str]) -> SecurityConfig {
        SecurityConfig {
            enable_cors,
            cors_origins: origins.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn cors_disabled_adds_no_layer() {
        assert!(cors_layer(&security(false, &["*"])).is_none());
    }

    #[test]
    fn cors_enabled_builds_a_layer() {
        assert!(cors_layer(&security(true, &["*"])).is_some());
        assert!(cors_layer(&security(true, &["https://app.example.com"])).is_some());
    }
}
