use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationListQuery, ApplicationListResponse, ApplicationResponse,
        CommentPayload, CreateApplicationPayload, UpdateStatusPayload, WithdrawPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::actor::Actor,
    models::application::ApplicationStatus,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Application created", body = Json<ApplicationResponse>),
        (status = 400, description = "Invalid payload or duplicate application"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state
        .job_service
        .get(payload.job_id)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
    let application = state
        .application_service
        .create(&job, payload.applicant_id, payload.applicant_name, payload.notes)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse::from(application)),
    ))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[axum::debug_handler]
pub async fn get_application_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
    Ok(Json(application.history().to_vec()))
}

#[axum::debug_handler]
pub async fn withdraw_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WithdrawPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .withdraw(id, payload.applicant_id, payload.comment)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    get,
    path = "/api/integration/applications",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "List of applications", body = Json<ApplicationListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.application_service.list(&query).await?;
    Ok(Json(ApplicationListResponse::from(result)))
}

#[utoipa::path(
    post,
    path = "/api/integration/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status applied", body = Json<ApplicationResponse>),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Record is terminal"),
        (status = 422, description = "Transition not allowed")
    )
)]
#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    let new_status: ApplicationStatus = payload
        .status
        .parse()
        .map_err(|_| Error::InvalidTransition(format!("unknown status: {}", payload.status)))?;
    let actor = Actor::from_claims(&claims);
    let application = state
        .application_service
        .apply_status(id, &actor, new_status, payload.comment)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[axum::debug_handler]
pub async fn update_application_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .set_comment(id, payload.comment)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}
