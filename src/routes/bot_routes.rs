use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dto::bot_dto::{AutomationStatusResponse, BatchOutcome, ProcessBatchPayload},
    dto::application_dto::ApplicationResponse,
    error::{Error, Result},
    middleware::auth::Claims,
    models::actor::{Actor, ActorRole},
    models::application::ApplicationStatus,
    models::audit_entry::{AuditAction, NewAuditEntry},
    AppState,
};

/// On-demand processing is attributed to the caller, acting as the mimic.
fn mimic_actor(claims: &Claims) -> Actor {
    let base = Actor::from_claims(claims);
    Actor::new(base.id, base.name, ActorRole::BotMimic)
}

#[utoipa::path(
    post,
    path = "/api/integration/bot/process/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application advanced", body = Json<ApplicationResponse>),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Nothing to advance")
    )
)]
#[axum::debug_handler]
pub async fn process_single(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let actor = mimic_actor(&claims);
    let application = state.bot_service.process_single(id, &actor).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/integration/bot/process-batch",
    request_body = ProcessBatchPayload,
    responses(
        (status = 200, description = "Itemized batch outcome", body = Json<BatchOutcome>)
    )
)]
#[axum::debug_handler]
pub async fn process_batch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ProcessBatchPayload>,
) -> Result<impl IntoResponse> {
    let status_filter: Option<ApplicationStatus> = match payload.status.as_deref() {
        Some(raw) => Some(raw.parse().map_err(|_| {
            Error::BadRequest(format!("unknown status filter: {}", raw))
        })?),
        None => None,
    };
    let actor = mimic_actor(&claims);
    let outcome = state
        .bot_service
        .process_batch(status_filter, payload.limit, &actor)
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn automation_status(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let settings = state.automation_service.get().await?;
    Ok(Json(AutomationStatusResponse::from(settings)))
}

async fn toggle_automation(
    state: &AppState,
    claims: &Claims,
    enabled: bool,
) -> Result<AutomationStatusResponse> {
    let actor = Actor::from_claims(claims);
    let settings = state
        .automation_service
        .set_enabled(enabled, &actor)
        .await?;

    let (action, verb) = if enabled {
        (AuditAction::AutomationEnabled, "enabled")
    } else {
        (AuditAction::AutomationDisabled, "disabled")
    };
    state
        .audit_service
        .record(
            NewAuditEntry::new(
                actor.clone(),
                action,
                format!("{} {} the automated application mimic", actor.name, verb),
            )
            .target("automation", "1", None)
            .metadata(json!({ "enabled": enabled })),
        )
        .await;

    Ok(AutomationStatusResponse::from(settings))
}

#[axum::debug_handler]
pub async fn enable_automation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let settings = toggle_automation(&state, &claims, true).await?;
    Ok(Json(settings))
}

#[axum::debug_handler]
pub async fn disable_automation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let settings = toggle_automation(&state, &claims, false).await?;
    Ok(Json(settings))
}

#[axum::debug_handler]
pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let by_status = state.application_service.status_counts().await?;
    let total: i64 = by_status.values().sum();
    let automation = state.automation_service.get().await?;
    Ok(Json(json!({
        "total_applications": total,
        "by_status": by_status,
        "automation_enabled": automation.enabled,
    })))
}
