use crate::dto::audit_dto::AuditListQuery;
use crate::error::Result;
use crate::models::audit_entry::{AuditEntry, NewAuditEntry};
use crate::utils::redact::truncate_to_bytes;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

const AUDIT_COLUMNS: &str = "id, actor_id, actor_name, actor_role, action, description, \
     target_type, target_id, target_name, origin_address, metadata, created_at";

#[derive(Debug, Clone)]
pub struct AuditList {
    pub items: Vec<AuditEntry>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone)]
pub struct AuditStats {
    pub total: i64,
    pub last_24h: i64,
    pub by_action: Vec<(String, i64)>,
}

#[derive(Clone)]
pub struct AuditService {
    pool: PgPool,
    metadata_max_bytes: usize,
}

impl AuditService {
    pub fn new(pool: PgPool, metadata_max_bytes: usize) -> Self {
        Self {
            pool,
            metadata_max_bytes,
        }
    }

    /// Best-effort append. A failed write is logged and dropped; the audit
    /// trail must never take the primary workflow down with it.
    pub async fn record(&self, entry: NewAuditEntry) {
        if let Err(e) = self.try_record(&entry).await {
            tracing::error!(
                error = ?e,
                action = %entry.action,
                "failed to persist audit entry"
            );
        }
    }

    async fn try_record(&self, entry: &NewAuditEntry) -> Result<()> {
        let metadata = entry
            .metadata
            .clone()
            .map(|m| truncate_to_bytes(m, self.metadata_max_bytes));
        sqlx::query(
            r#"
            INSERT INTO audit_entries
                (actor_id, actor_name, actor_role, action, description,
                 target_type, target_id, target_name, origin_address, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.actor.id)
        .bind(&entry.actor.name)
        .bind(entry.actor.role.as_str())
        .bind(entry.action.as_str())
        .bind(&entry.description)
        .bind(&entry.target_type)
        .bind(&entry.target_id)
        .bind(&entry.target_name)
        .bind(entry.origin_address)
        .bind(metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list(&self, query: &AuditListQuery) -> Result<AuditList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM audit_entries WHERE 1=1");
        Self::push_filters(&mut count_qb, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM audit_entries WHERE 1=1",
            AUDIT_COLUMNS
        ));
        Self::push_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(per_page);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        let items = qb
            .build_query_as::<AuditEntry>()
            .fetch_all(&self.pool)
            .await?;

        let total_pages = (total + per_page - 1) / per_page;
        Ok(AuditList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    fn push_filters(qb: &mut QueryBuilder<Postgres>, query: &AuditListQuery) {
        if let Some(action) = &query.action {
            qb.push(" AND action = ");
            qb.push_bind(action.clone());
        }
        if let Some(target_type) = &query.target_type {
            qb.push(" AND target_type = ");
            qb.push_bind(target_type.clone());
        }
        if let Some(actor_id) = query.actor_id {
            qb.push(" AND actor_id = ");
            qb.push_bind(actor_id);
        }
        if let Some(from) = query.from {
            qb.push(" AND created_at >= ");
            qb.push_bind(from);
        }
        if let Some(to) = query.to {
            qb.push(" AND created_at <= ");
            qb.push_bind(to);
        }
    }

    pub async fn stats(&self) -> Result<AuditStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_entries")
            .fetch_one(&self.pool)
            .await?;
        let cutoff: DateTime<Utc> = Utc::now() - chrono::Duration::hours(24);
        let last_24h: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM audit_entries WHERE created_at >= $1")
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await?;
        let by_action: Vec<(String, i64)> = sqlx::query_as(
            "SELECT action, COUNT(*) FROM audit_entries GROUP BY action ORDER BY COUNT(*) DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(AuditStats {
            total,
            last_24h,
            by_action,
        })
    }
}
