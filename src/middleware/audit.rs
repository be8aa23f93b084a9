use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use bytes::Bytes;
use serde_json::{json, Value as JsonValue};
use sqlx::types::ipnetwork::IpNetwork;
use std::net::IpAddr;
use uuid::Uuid;

use crate::middleware::auth::Claims;
use crate::models::actor::{Actor, ActorRole};
use crate::models::audit_entry::{AuditAction, NewAuditEntry};
use crate::services::audit_service::AuditService;
use crate::utils::redact::redact;

const MAX_REQUEST_CAPTURE_BYTES: usize = 64 * 1024;
const MAX_RESPONSE_CAPTURE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AuditLayer {
    pub audit: AuditService,
}

impl AuditLayer {
    pub fn new(audit: AuditService) -> Self {
        Self { audit }
    }
}

/// Everything the classifier is allowed to look at about one finished
/// operation.
#[derive(Debug, Clone)]
pub struct RequestFacts {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub request: Option<JsonValue>,
    pub response: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub action: AuditAction,
    pub summary: &'static str,
    pub target_type: Option<&'static str>,
}

fn classified(
    action: AuditAction,
    summary: &'static str,
    target_type: Option<&'static str>,
) -> Option<Classification> {
    Some(Classification {
        action,
        summary,
        target_type,
    })
}

type Matcher = fn(&RequestFacts) -> Option<Classification>;

fn match_application_status(f: &RequestFacts) -> Option<Classification> {
    if f.method == Method::POST && f.path.contains("/applications/") && f.path.ends_with("/status")
    {
        return classified(
            AuditAction::ApplicationStatusUpdated,
            "updated an application status",
            Some("application"),
        );
    }
    None
}

fn match_withdrawal(f: &RequestFacts) -> Option<Classification> {
    if f.method == Method::POST
        && f.path.contains("/applications/")
        && f.path.ends_with("/withdraw")
    {
        return classified(
            AuditAction::ApplicationWithdrawn,
            "withdrew an application",
            Some("application"),
        );
    }
    None
}

fn match_comment(f: &RequestFacts) -> Option<Classification> {
    if f.method == Method::PATCH
        && f.path.contains("/applications/")
        && f.path.ends_with("/comment")
    {
        return classified(
            AuditAction::ApplicationCommentUpdated,
            "updated an application comment",
            Some("application"),
        );
    }
    None
}

fn match_application_create(f: &RequestFacts) -> Option<Classification> {
    if f.method == Method::POST && f.path.ends_with("/applications") {
        return classified(
            AuditAction::ApplicationCreated,
            "submitted an application",
            Some("application"),
        );
    }
    None
}

fn match_application_read(f: &RequestFacts) -> Option<Classification> {
    if f.method == Method::GET && f.path.contains("/applications") {
        return classified(
            AuditAction::ApplicationViewed,
            "viewed application data",
            Some("application"),
        );
    }
    None
}

fn match_bot_automation(f: &RequestFacts) -> Option<Classification> {
    if f.method == Method::POST && f.path.contains("/bot/automation") {
        if f.path.ends_with("/enable") {
            return classified(
                AuditAction::AutomationEnabled,
                "enabled automated processing",
                Some("automation"),
            );
        }
        if f.path.ends_with("/disable") {
            return classified(
                AuditAction::AutomationDisabled,
                "disabled automated processing",
                Some("automation"),
            );
        }
    }
    None
}

fn match_bot_process(f: &RequestFacts) -> Option<Classification> {
    if f.method == Method::POST && f.path.contains("/bot/process") {
        return classified(
            AuditAction::BotProcessTriggered,
            "triggered automated application processing",
            Some("application"),
        );
    }
    None
}

fn match_job(f: &RequestFacts) -> Option<Classification> {
    if !f.path.contains("/jobs") {
        return None;
    }
    if f.method == Method::POST {
        classified(AuditAction::JobCreated, "created a job posting", Some("job"))
    } else if f.method == Method::PATCH || f.method == Method::PUT {
        classified(AuditAction::JobUpdated, "updated a job posting", Some("job"))
    } else if f.method == Method::DELETE {
        classified(AuditAction::JobDeleted, "deleted a job posting", Some("job"))
    } else {
        None
    }
}

fn match_auth(f: &RequestFacts) -> Option<Classification> {
    if f.path.contains("/auth") || f.path.contains("/login") {
        return classified(AuditAction::UserLogin, "logged in", Some("user"));
    }
    None
}

fn match_profile(f: &RequestFacts) -> Option<Classification> {
    if f.path.contains("/profile") {
        return classified(
            AuditAction::ProfileUpdated,
            "updated profile data",
            Some("profile"),
        );
    }
    None
}

fn match_dashboard(f: &RequestFacts) -> Option<Classification> {
    if f.path.contains("/dashboard") {
        return classified(
            AuditAction::DashboardViewed,
            "viewed the dashboard",
            Some("dashboard"),
        );
    }
    None
}

/// Ordered: the most specific application operations first, category
/// matchers after, so e.g. a status change is never reported as a generic
/// application read.
const MATCHERS: &[Matcher] = &[
    match_application_status,
    match_withdrawal,
    match_comment,
    match_application_create,
    match_application_read,
    match_bot_automation,
    match_bot_process,
    match_job,
    match_auth,
    match_profile,
    match_dashboard,
];

pub fn classify(facts: &RequestFacts) -> Classification {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(facts))
        .unwrap_or(Classification {
            action: AuditAction::Unclassified,
            summary: "performed an unclassified operation",
            target_type: None,
        })
}

/// First identifier-shaped path segment, else an id supplied in the body.
pub fn extract_target_id(facts: &RequestFacts) -> Option<String> {
    facts
        .path
        .split('/')
        .find(|segment| Uuid::parse_str(segment).is_ok())
        .map(str::to_string)
        .or_else(|| {
            let body = facts.request.as_ref()?;
            ["application_id", "id", "job_id"]
                .iter()
                .find_map(|key| body.get(key))
                .and_then(value_to_id)
        })
}

fn value_to_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Known response shape fields first, then known request body fields.
pub fn extract_target_name(facts: &RequestFacts) -> Option<String> {
    const NAME_KEYS: &[&str] = &["applicant_name", "name", "title"];
    for source in [facts.response.as_ref(), facts.request.as_ref()]
        .into_iter()
        .flatten()
    {
        for key in NAME_KEYS {
            if let Some(name) = source.get(key).and_then(|v| v.as_str()) {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// The interceptor never audits its own read surface or file downloads.
pub fn is_exempt(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS
        || path == "/health"
        || path.starts_with("/api/integration/audit")
        || path.starts_with("/uploads")
        || path.contains("/export")
        || path.contains("/download")
}

fn describe(actor: &Actor, classification: &Classification, facts: &RequestFacts) -> String {
    let mut description = format!("{} {}", actor.name, classification.summary);
    if !facts.status.is_success() {
        description.push_str(&format!(" (failed with {})", facts.status.as_u16()));
    }
    description
}

fn actor_from_body(facts: &RequestFacts) -> Actor {
    if let Some(body) = &facts.request {
        let id = body
            .get("applicant_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let name = body.get("applicant_name").and_then(|v| v.as_str());
        if id.is_some() || name.is_some() {
            return Actor::new(id, name.unwrap_or("Applicant"), ActorRole::Applicant);
        }
    }
    Actor::new(None, "Anonymous", ActorRole::System)
}

fn origin_address(headers: &HeaderMap) -> Option<IpNetwork> {
    let raw = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))?;
    raw.trim().parse::<IpAddr>().ok().map(IpNetwork::from)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

fn content_length_within(headers: &HeaderMap, limit: usize) -> bool {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .map(|len| len <= limit)
        .unwrap_or(false)
}

async fn buffer_request(req: Request) -> (Request, Option<JsonValue>) {
    if !is_json(req.headers()) || !content_length_within(req.headers(), MAX_REQUEST_CAPTURE_BYTES)
    {
        return (req, None);
    }
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_REQUEST_CAPTURE_BYTES)
        .await
        .unwrap_or_else(|_| Bytes::new());
    let parsed = serde_json::from_slice(&bytes).ok();
    (Request::from_parts(parts, Body::from(bytes)), parsed)
}

async fn buffer_response(resp: Response) -> (Response, Option<JsonValue>) {
    if !is_json(resp.headers()) {
        return (resp, None);
    }
    let (parts, body) = resp.into_parts();
    let bytes = match to_bytes(body, MAX_RESPONSE_CAPTURE_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = ?e, "audit interceptor could not buffer response body");
            Bytes::new()
        }
    };
    let parsed = serde_json::from_slice(&bytes).ok();
    (Response::from_parts(parts, Body::from(bytes)), parsed)
}

/// Wraps every inbound operation: lets it run to completion, then derives a
/// structured audit record from what was observed. Recording happens in a
/// detached task and the recorder swallows its own failures, so this layer
/// can never change the outcome of the operation it watched.
pub async fn audit_middleware(
    State(layer): State<AuditLayer>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    if is_exempt(&method, &path) {
        return next.run(req).await;
    }

    let origin = origin_address(req.headers());
    let claims_actor = req.extensions().get::<Claims>().map(Actor::from_claims);

    let (req, request_json) = buffer_request(req).await;
    let response = next.run(req).await;
    let (response, response_json) = buffer_response(response).await;

    let facts = RequestFacts {
        method,
        path,
        status: response.status(),
        request: request_json,
        response: response_json,
    };

    let actor = claims_actor.unwrap_or_else(|| actor_from_body(&facts));
    let classification = classify(&facts);
    let description = describe(&actor, &classification, &facts);

    let mut entry = NewAuditEntry::new(actor, classification.action, description);
    entry.target_type = classification.target_type.map(str::to_string);
    entry.target_id = extract_target_id(&facts);
    entry.target_name = extract_target_name(&facts);
    entry.origin_address = origin;
    entry.metadata = Some(json!({
        "method": facts.method.as_str(),
        "path": facts.path,
        "status": facts.status.as_u16(),
        "success": facts.status.is_success(),
        "request": facts.request.as_ref().map(redact),
    }));

    let audit = layer.audit.clone();
    tokio::spawn(async move { audit.record(entry).await });

    response
}
