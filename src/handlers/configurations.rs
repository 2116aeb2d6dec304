use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::access::Identity;
use crate::app::AppState;
use crate::configuration::{FilterConfiguration, LoadWarning, NewConfiguration};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::ReportType;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Warning {
    #[serde(flatten)]
    pub warning: LoadWarning,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListBody {
    pub configurations: Vec<FilterConfiguration>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Serialize)]
pub struct DeletedBody {
    pub id: Uuid,
}

/// Blank means "no filter"; anything else must be a known type
pub(crate) fn parse_report_type(raw: Option<&str>) -> Result<Option<ReportType>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(ApiError::validation_error),
    }
}

/// GET /api/configurations?type= - list saved filters; unreadable data yields warnings, not errors
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ListBody> {
    let report_type = parse_report_type(query.report_type.as_deref())?;
    let listing = state.store.list(&identity, report_type).await?;

    let warnings = listing
        .warnings
        .into_iter()
        .map(|warning| Warning {
            message: warning.message(),
            warning,
        })
        .collect();

    Ok(ApiResponse::success(ListBody {
        configurations: listing.configurations,
        warnings,
    }))
}

/// POST /api/configurations - save a new named filter
pub async fn save(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<FilterConfiguration> {
    let Json(body) = payload.map_err(|e| ApiError::validation_error(format!("Invalid JSON body: {}", e.body_text())))?;
    let input: NewConfiguration = serde_json::from_value(body)
        .map_err(|e| ApiError::validation_error(format!("Invalid configuration: {}", e)))?;

    let created = state.store.save(&identity, input).await?;
    tracing::info!("User {} saved configuration {}", identity.user_id, created.id);
    Ok(ApiResponse::created(created))
}

/// DELETE /api/configurations/:id - idempotent delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<DeletedBody> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::validation_error("Invalid configuration id"))?;
    state.store.delete(&identity, id).await?;
    Ok(ApiResponse::success(DeletedBody { id }))
}
