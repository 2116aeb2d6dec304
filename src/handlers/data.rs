use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::Value;

use super::configurations::parse_report_type;
use crate::access::{scope_for, Identity};
use crate::app::AppState;
use crate::database::port::{bounded, RowQuery};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::EntityKind;

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

/// GET /api/data/:entity - tenant rows visible to the caller.
///
/// Callers without access get an empty list, same as a tenant with no rows.
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(entity): Path<String>,
    Query(query): Query<DataQuery>,
) -> ApiResult<Vec<Value>> {
    let entity: EntityKind = entity.parse().map_err(ApiError::not_found)?;
    let report_type = parse_report_type(query.report_type.as_deref())?;
    if report_type.is_some() && entity != EntityKind::Reports {
        return Err(ApiError::validation_error("The type filter only applies to reports"));
    }

    let scope = scope_for(Some(&identity));
    let row_query = RowQuery {
        report_type,
        limit: state.max_rows,
    };

    let rows = bounded(
        state.persistence_timeout,
        state.persistence.query_scoped(entity, &scope, &row_query),
    )
    .await?;

    tracing::debug!("Returned {} {:?} row(s) for user {}", rows.len(), entity, identity.user_id);
    Ok(ApiResponse::success(rows))
}
