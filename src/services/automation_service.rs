use crate::error::Result;
use crate::models::actor::Actor;
use crate::models::automation::AutomationSettings;
use sqlx::PgPool;

/// The persisted enable/disable gate for the scheduled sweep. Single row,
/// plain overwrite semantics; read fresh on every tick so a toggle takes
/// effect within one interval on every instance.
#[derive(Clone)]
pub struct AutomationService {
    pool: PgPool,
}

impl AutomationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<AutomationSettings> {
        let settings = sqlx::query_as::<_, AutomationSettings>(
            "SELECT enabled, last_modified_by, last_modified_at FROM automation_settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }

    pub async fn set_enabled(&self, enabled: bool, actor: &Actor) -> Result<AutomationSettings> {
        let settings = sqlx::query_as::<_, AutomationSettings>(
            r#"
            UPDATE automation_settings
            SET enabled = $1, last_modified_by = $2, last_modified_at = NOW()
            WHERE id = 1
            RETURNING enabled, last_modified_by, last_modified_at
            "#,
        )
        .bind(enabled)
        .bind(&actor.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }
}
