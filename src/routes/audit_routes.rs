use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::audit_dto::{AuditListQuery, AuditListResponse, AuditStatsResponse},
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/integration/audit",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("action" = Option<String>, Query, description = "Filter by action"),
        ("target_type" = Option<String>, Query, description = "Filter by target type"),
        ("actor_id" = Option<String>, Query, description = "Filter by acting user"),
        ("from" = Option<String>, Query, description = "Lower bound on created_at"),
        ("to" = Option<String>, Query, description = "Upper bound on created_at")
    ),
    responses(
        (status = 200, description = "Audit entries", body = Json<AuditListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_audit_entries(
    State(state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.audit_service.list(&query).await?;
    Ok(Json(AuditListResponse::from(result)))
}

#[axum::debug_handler]
pub async fn audit_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.audit_service.stats().await?;
    Ok(Json(AuditStatsResponse::from(stats)))
}
