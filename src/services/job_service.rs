use crate::error::Result;
use crate::models::job::Job;
use sqlx::PgPool;
use uuid::Uuid;

/// Read-only lookup into the job-posting system's table. Posting CRUD lives
/// outside this service.
#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT id, title, job_type, created_at FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }
}
