use apptrack_backend::middleware::audit::{
    classify, extract_target_id, extract_target_name, is_exempt, RequestFacts,
};
use apptrack_backend::models::audit_entry::AuditAction;
use axum::http::{Method, StatusCode};
use serde_json::json;

fn facts(method: Method, path: &str) -> RequestFacts {
    RequestFacts {
        method,
        path: path.to_string(),
        status: StatusCode::OK,
        request: None,
        response: None,
    }
}

#[test]
fn the_whole_exposed_surface_classifies_to_a_concrete_action() {
    let id = "5f64a2bb-2078-45fd-aabc-7ba9b3dd2e7c";
    let cases = [
        (Method::POST, "/api/applications".to_string(), AuditAction::ApplicationCreated),
        (
            Method::GET,
            format!("/api/applications/{id}"),
            AuditAction::ApplicationViewed,
        ),
        (
            Method::POST,
            format!("/api/applications/{id}/withdraw"),
            AuditAction::ApplicationWithdrawn,
        ),
        (
            Method::POST,
            format!("/api/integration/applications/{id}/status"),
            AuditAction::ApplicationStatusUpdated,
        ),
        (
            Method::PATCH,
            format!("/api/integration/applications/{id}/comment"),
            AuditAction::ApplicationCommentUpdated,
        ),
        (
            Method::POST,
            format!("/api/integration/bot/process/{id}"),
            AuditAction::BotProcessTriggered,
        ),
        (
            Method::POST,
            "/api/integration/bot/process-batch".to_string(),
            AuditAction::BotProcessTriggered,
        ),
        (
            Method::POST,
            "/api/integration/bot/automation/enable".to_string(),
            AuditAction::AutomationEnabled,
        ),
        (
            Method::POST,
            "/api/integration/bot/automation/disable".to_string(),
            AuditAction::AutomationDisabled,
        ),
        (
            Method::GET,
            "/api/integration/dashboard/stats".to_string(),
            AuditAction::DashboardViewed,
        ),
    ];

    for (method, path, expected) in cases {
        let classification = classify(&facts(method.clone(), &path));
        assert_eq!(
            classification.action, expected,
            "{method} {path} misclassified"
        );
    }
}

#[test]
fn generality_extends_beyond_routes_this_service_exposes() {
    assert_eq!(
        classify(&facts(Method::POST, "/api/jobs")).action,
        AuditAction::JobCreated
    );
    assert_eq!(
        classify(&facts(Method::DELETE, "/api/jobs/42")).action,
        AuditAction::JobDeleted
    );
    assert_eq!(
        classify(&facts(Method::POST, "/api/auth/login")).action,
        AuditAction::UserLogin
    );
    assert_eq!(
        classify(&facts(Method::PATCH, "/api/users/7/profile")).action,
        AuditAction::ProfileUpdated
    );
}

#[test]
fn anything_unrecognized_still_produces_a_record_shape() {
    let classification = classify(&facts(Method::PUT, "/api/some/future/endpoint"));
    assert_eq!(classification.action, AuditAction::Unclassified);
    assert!(!classification.summary.is_empty());
}

#[test]
fn own_audit_reads_never_feed_back_into_the_log() {
    assert!(is_exempt(&Method::GET, "/api/integration/audit"));
    assert!(is_exempt(&Method::GET, "/api/integration/audit/stats"));
    assert!(!is_exempt(
        &Method::POST,
        "/api/integration/applications/abc/status"
    ));
}

#[test]
fn target_extraction_prefers_path_ids_and_response_names() {
    let mut f = facts(
        Method::POST,
        "/api/integration/applications/0f9adcb3-22b1-4b34-a53a-d0a817dc8b25/status",
    );
    f.request = Some(json!({"status": "under-review", "id": "body-id"}));
    f.response = Some(json!({"applicant_name": "Alex Candidate", "status": "under-review"}));

    assert_eq!(
        extract_target_id(&f).as_deref(),
        Some("0f9adcb3-22b1-4b34-a53a-d0a817dc8b25")
    );
    assert_eq!(extract_target_name(&f).as_deref(), Some("Alex Candidate"));

    // No identifier in the path: fall back to the body.
    let mut batch = facts(Method::POST, "/api/integration/bot/process-batch");
    batch.request = Some(json!({"application_id": "7c7a45ad-92a4-4a0d-a19a-25fa1f4d2a60"}));
    assert_eq!(
        extract_target_id(&batch).as_deref(),
        Some("7c7a45ad-92a4-4a0d-a19a-25fa1f4d2a60")
    );
}

#[test]
fn action_names_serialize_screaming_snake() {
    assert_eq!(
        AuditAction::ApplicationStatusUpdated.as_str(),
        "APPLICATION_STATUS_UPDATED"
    );
    assert_eq!(AuditAction::UserLogin.as_str(), "USER_LOGIN");
    assert_eq!(AuditAction::JobCreated.as_str(), "JOB_CREATED");
    assert_eq!(AuditAction::Unclassified.as_str(), "UNCLASSIFIED");
}
