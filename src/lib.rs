pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod workflow;

use crate::services::{
    application_service::ApplicationService, audit_service::AuditService,
    automation_service::AutomationService, bot_service::BotService, job_service::JobService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub application_service: ApplicationService,
    pub audit_service: AuditService,
    pub automation_service: AutomationService,
    pub bot_service: BotService,
    pub job_service: JobService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let audit_service = AuditService::new(pool.clone(), config.audit_metadata_max_bytes);
        let application_service = ApplicationService::new(pool.clone(), audit_service.clone());
        let automation_service = AutomationService::new(pool.clone());
        let bot_service = BotService::new(
            pool.clone(),
            application_service.clone(),
            automation_service.clone(),
            audit_service.clone(),
        );
        let job_service = JobService::new(pool.clone());

        Self {
            pool,
            application_service,
            audit_service,
            automation_service,
            bot_service,
            job_service,
        }
    }
}
