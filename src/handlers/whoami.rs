use axum::Extension;
use serde::Serialize;

use crate::access::{classify, scope_for, AccessClass, Identity, ScopePredicate};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub identity: Identity,
    pub access_class: AccessClass,
    pub scope: ScopePredicate,
}

/// GET /api/auth/whoami - the caller's identity and what it resolves to
pub async fn get(Extension(identity): Extension<Identity>) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI {
        access_class: classify(Some(&identity)),
        scope: scope_for(Some(&identity)),
        identity,
    }))
}
