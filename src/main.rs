use axum::{
    routing::{get, patch, post},
    Router,
};
use apptrack_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::audit::{audit_middleware, AuditLayer},
    middleware::{auth, rate_limit},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    app_state.bot_service.start_scheduler().await?;

    let audit_layer = AuditLayer::new(app_state.audit_service.clone());

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route(
            "/api/applications",
            post(routes::application_routes::create_application),
        )
        .route(
            "/api/applications/:id",
            get(routes::application_routes::get_application),
        )
        .route(
            "/api/applications/:id/history",
            get(routes::application_routes::get_application_history),
        )
        .route(
            "/api/applications/:id/withdraw",
            post(routes::application_routes::withdraw_application),
        )
        .layer(axum::middleware::from_fn_with_state(
            audit_layer.clone(),
            audit_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.public_rps),
            rate_limit::rps_middleware,
        ));

    let integration_api = Router::new()
        .route(
            "/api/integration/applications",
            get(routes::application_routes::list_applications),
        )
        .route(
            "/api/integration/applications/:id/status",
            post(routes::application_routes::update_application_status),
        )
        .route(
            "/api/integration/applications/:id/comment",
            patch(routes::application_routes::update_application_comment),
        )
        .route(
            "/api/integration/bot/process/:id",
            post(routes::bot_routes::process_single),
        )
        .route(
            "/api/integration/bot/process-batch",
            post(routes::bot_routes::process_batch),
        )
        .route(
            "/api/integration/bot/automation",
            get(routes::bot_routes::automation_status),
        )
        .route(
            "/api/integration/bot/automation/enable",
            post(routes::bot_routes::enable_automation),
        )
        .route(
            "/api/integration/bot/automation/disable",
            post(routes::bot_routes::disable_automation),
        )
        .route(
            "/api/integration/audit",
            get(routes::audit_routes::list_audit_entries),
        )
        .route(
            "/api/integration/audit/stats",
            get(routes::audit_routes::audit_stats),
        )
        .route(
            "/api/integration/dashboard/stats",
            get(routes::bot_routes::dashboard_stats),
        )
        .layer(axum::middleware::from_fn_with_state(
            audit_layer,
            audit_middleware,
        ))
        .layer(axum::middleware::from_fn(auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.integration_rps),
            rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(integration_api)
        .with_state(app_state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.bot_service.stop_scheduler().await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
