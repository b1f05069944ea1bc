use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use airweave_core::billing::{BillingPeriodStatus, BillingPlan};
use airweave_core::collection::Collection;
use airweave_core::connection::{AuthMethod, SourceConnection, SourceConnectionStatus};
use airweave_core::cursor::Cursor;
use airweave_core::ids::{
    CollectionId, OrganizationId, SourceConnectionId, SyncDagId, SyncId, SyncJobId,
};
use airweave_core::organization::Organization;
use airweave_core::sync::{JobCounters, JobStatus, Sync, SyncJob, SyncStatus};
use airweave_core::usage::{ActionType, Usage};
use airweave_metadata::error::DataError;
use airweave_metadata::store::MetadataStore;

use crate::convert::{
    billing_status_from_str, job_status_from_str, job_status_to_str, map_err, plan_from_str,
    source_connection_status_from_str, source_connection_status_to_str, sync_status_from_str,
    sync_status_to_str,
};

/// Postgres-backed `MetadataStore`. Queries are written as plain SQL
/// strings against manually defined row types rather than the
/// `query!`/`query_as!` compile-time macros, since there's no schema
/// to check them against at build time.
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    plan: String,
    is_legacy: bool,
}

impl OrganizationRow {
    fn into_domain(self) -> Result<Organization, DataError> {
        Ok(Organization {
            id: OrganizationId::from(self.id),
            name: self.name,
            plan: plan_from_str(&self.plan)?,
            is_legacy: self.is_legacy,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CollectionRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    readable_id: String,
}

impl CollectionRow {
    fn into_domain(self) -> Collection {
        Collection {
            id: CollectionId::from(self.id),
            organization_id: OrganizationId::from(self.organization_id),
            name: self.name,
            readable_id: self.readable_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SourceConnectionRow {
    id: Uuid,
    organization_id: Uuid,
    collection_id: Uuid,
    source_kind: String,
    name: String,
    auth: serde_json::Value,
    config: serde_json::Value,
    cron_schedule: Option<String>,
    cursor_field: Option<String>,
    status: String,
}

impl SourceConnectionRow {
    fn into_domain(self) -> Result<SourceConnection, DataError> {
        let auth: AuthMethod = serde_json::from_value(self.auth)
            .map_err(|e| DataError::Other(format!("corrupt auth column: {e}")))?;
        Ok(SourceConnection {
            id: SourceConnectionId::from(self.id),
            organization_id: OrganizationId::from(self.organization_id),
            collection_id: CollectionId::from(self.collection_id),
            source_kind: self.source_kind,
            name: self.name,
            auth,
            config: self.config,
            cron_schedule: self.cron_schedule,
            cursor_field: self.cursor_field,
            status: source_connection_status_from_str(&self.status)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SyncRow {
    id: Uuid,
    source_connection_id: Uuid,
    dag_id: Uuid,
    cron_schedule: Option<String>,
    next_scheduled_run: Option<DateTime<Utc>>,
    status: String,
}

impl SyncRow {
    fn into_domain(self) -> Result<Sync, DataError> {
        Ok(Sync {
            id: SyncId::from(self.id),
            source_connection_id: SourceConnectionId::from(self.source_connection_id),
            dag_id: SyncDagId::from(self.dag_id),
            cron_schedule: self.cron_schedule,
            next_scheduled_run: self.next_scheduled_run,
            status: sync_status_from_str(&self.status)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SyncJobRow {
    id: Uuid,
    sync_id: Uuid,
    status: String,
    entities_processed: i64,
    entities_inserted: i64,
    entities_updated: i64,
    entities_skipped: i64,
    entities_deleted: i64,
    entities_failed: i64,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl SyncJobRow {
    fn into_domain(self) -> Result<SyncJob, DataError> {
        Ok(SyncJob {
            id: SyncJobId::from(self.id),
            sync_id: SyncId::from(self.sync_id),
            status: job_status_from_str(&self.status)?,
            counters: JobCounters {
                entities_processed: self.entities_processed as u64,
                entities_inserted: self.entities_inserted as u64,
                entities_updated: self.entities_updated as u64,
                entities_skipped: self.entities_skipped as u64,
                entities_deleted: self.entities_deleted as u64,
                entities_failed: self.entities_failed as u64,
            },
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            error: self.error,
        })
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn get_organization(&self, id: OrganizationId) -> Result<Organization, DataError> {
        sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, plan, is_legacy FROM organizations WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .into_domain()
    }

    async fn get_collection(&self, id: CollectionId) -> Result<Collection, DataError> {
        Ok(sqlx::query_as::<_, CollectionRow>(
            "SELECT id, organization_id, name, readable_id FROM collections WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .into_domain())
    }

    async fn get_source_connection(
        &self,
        id: SourceConnectionId,
    ) -> Result<SourceConnection, DataError> {
        sqlx::query_as::<_, SourceConnectionRow>(
            "SELECT id, organization_id, collection_id, source_kind, name, auth, config, \
             cron_schedule, cursor_field, status FROM source_connections WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .into_domain()
    }

    async fn save_source_connection(
        &self,
        connection: &SourceConnection,
    ) -> Result<SourceConnection, DataError> {
        let auth = serde_json::to_value(&connection.auth)
            .map_err(|e| DataError::Other(format!("cannot serialize auth: {e}")))?;
        sqlx::query(
            "INSERT INTO source_connections \
             (id, organization_id, collection_id, source_kind, name, auth, config, \
              cron_schedule, cursor_field, status) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10) \
             ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, auth = EXCLUDED.auth, config = EXCLUDED.config, \
             cron_schedule = EXCLUDED.cron_schedule, cursor_field = EXCLUDED.cursor_field, \
             status = EXCLUDED.status",
        )
        .bind(Uuid::from(connection.id))
        .bind(Uuid::from(connection.organization_id))
        .bind(Uuid::from(connection.collection_id))
        .bind(&connection.source_kind)
        .bind(&connection.name)
        .bind(auth)
        .bind(&connection.config)
        .bind(&connection.cron_schedule)
        .bind(&connection.cursor_field)
        .bind(source_connection_status_to_str(connection.status))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(connection.clone())
    }

    async fn list_schedulable_source_connections(&self) -> Result<Vec<SourceConnection>, DataError> {
        let rows = sqlx::query_as::<_, SourceConnectionRow>(
            "SELECT id, organization_id, collection_id, source_kind, name, auth, config, \
             cron_schedule, cursor_field, status FROM source_connections \
             WHERE status = 'active' AND cron_schedule IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows.into_iter().map(SourceConnectionRow::into_domain).collect()
    }

    async fn get_sync(&self, id: SyncId) -> Result<Sync, DataError> {
        sqlx::query_as::<_, SyncRow>(
            "SELECT id, source_connection_id, dag_id, cron_schedule, next_scheduled_run, status \
             FROM syncs WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .into_domain()
    }

    async fn save_sync(&self, sync: &Sync) -> Result<Sync, DataError> {
        sqlx::query(
            "INSERT INTO syncs (id, source_connection_id, dag_id, cron_schedule, \
             next_scheduled_run, status) VALUES ($1,$2,$3,$4,$5,$6) \
             ON CONFLICT (id) DO UPDATE SET \
             cron_schedule = EXCLUDED.cron_schedule, \
             next_scheduled_run = EXCLUDED.next_scheduled_run, status = EXCLUDED.status",
        )
        .bind(Uuid::from(sync.id))
        .bind(Uuid::from(sync.source_connection_id))
        .bind(Uuid::from(sync.dag_id))
        .bind(&sync.cron_schedule)
        .bind(sync.next_scheduled_run)
        .bind(sync_status_to_str(sync.status))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(sync.clone())
    }

    async fn list_schedulable_syncs(&self) -> Result<Vec<Sync>, DataError> {
        let rows = sqlx::query_as::<_, SyncRow>(
            "SELECT id, source_connection_id, dag_id, cron_schedule, next_scheduled_run, status \
             FROM syncs WHERE status = 'active' AND cron_schedule IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows.into_iter().map(SyncRow::into_domain).collect()
    }

    async fn create_job_if_none_non_terminal(&self, sync_id: SyncId) -> Result<SyncJob, DataError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let existing: Option<Uuid> = sqlx::query(
            "SELECT id FROM sync_jobs WHERE sync_id = $1 \
             AND status NOT IN ('completed', 'failed', 'cancelled') \
             FOR UPDATE",
        )
        .bind(Uuid::from(sync_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?
        .map(|row| row.get("id"));

        if existing.is_some() {
            tx.rollback().await.map_err(map_err)?;
            return Err(DataError::Conflict(format!(
                "sync {sync_id} already has a non-terminal job"
            )));
        }

        let job = SyncJob::new(sync_id);
        sqlx::query(
            "INSERT INTO sync_jobs \
             (id, sync_id, status, entities_processed, entities_inserted, entities_updated, \
              entities_skipped, entities_deleted, entities_failed, created_at, started_at, \
              completed_at, error) \
             VALUES ($1,$2,$3,0,0,0,0,0,0,$4,NULL,NULL,NULL)",
        )
        .bind(Uuid::from(job.id))
        .bind(Uuid::from(job.sync_id))
        .bind(job_status_to_str(job.status))
        .bind(job.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;
        Ok(job)
    }

    async fn get_job(&self, id: SyncJobId) -> Result<SyncJob, DataError> {
        sqlx::query_as::<_, SyncJobRow>(
            "SELECT id, sync_id, status, entities_processed, entities_inserted, \
             entities_updated, entities_skipped, entities_deleted, entities_failed, \
             created_at, started_at, completed_at, error FROM sync_jobs WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .into_domain()
    }

    async fn save_job(&self, job: &SyncJob) -> Result<SyncJob, DataError> {
        sqlx::query(
            "UPDATE sync_jobs SET status = $2, entities_processed = $3, entities_inserted = $4, \
             entities_updated = $5, entities_skipped = $6, entities_deleted = $7, \
             entities_failed = $8, started_at = $9, completed_at = $10, error = $11 \
             WHERE id = $1",
        )
        .bind(Uuid::from(job.id))
        .bind(job_status_to_str(job.status))
        .bind(job.counters.entities_processed as i64)
        .bind(job.counters.entities_inserted as i64)
        .bind(job.counters.entities_updated as i64)
        .bind(job.counters.entities_skipped as i64)
        .bind(job.counters.entities_deleted as i64)
        .bind(job.counters.entities_failed as i64)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.error)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(job.clone())
    }

    async fn list_jobs(&self, sync_id: SyncId, limit: u64) -> Result<Vec<SyncJob>, DataError> {
        let rows = sqlx::query_as::<_, SyncJobRow>(
            "SELECT id, sync_id, status, entities_processed, entities_inserted, \
             entities_updated, entities_skipped, entities_deleted, entities_failed, \
             created_at, started_at, completed_at, error FROM sync_jobs \
             WHERE sync_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(Uuid::from(sync_id))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows.into_iter().map(SyncJobRow::into_domain).collect()
    }

    async fn get_cursor(&self, source_connection_id: SourceConnectionId) -> Result<Cursor, DataError> {
        let row: Option<serde_json::Value> = sqlx::query(
            "SELECT data FROM cursors WHERE source_connection_id = $1",
        )
        .bind(Uuid::from(source_connection_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .map(|row| row.get("data"));

        Ok(match row {
            Some(data) => Cursor {
                source_connection_id,
                data: serde_json::from_value(data)
                    .map_err(|e| DataError::Other(format!("corrupt cursor data: {e}")))?,
            },
            None => Cursor::new(source_connection_id),
        })
    }

    async fn save_cursor(&self, cursor: &Cursor) -> Result<(), DataError> {
        let data = serde_json::to_value(&cursor.data)
            .map_err(|e| DataError::Other(format!("cannot serialize cursor: {e}")))?;
        sqlx::query(
            "INSERT INTO cursors (source_connection_id, data) VALUES ($1, $2) \
             ON CONFLICT (source_connection_id) DO UPDATE SET data = EXCLUDED.data",
        )
        .bind(Uuid::from(cursor.source_connection_id))
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn get_usage(&self, organization_id: OrganizationId) -> Result<Usage, DataError> {
        let row = sqlx::query(
            "SELECT entities, queries, source_connections, team_members FROM usage \
             WHERE organization_id = $1",
        )
        .bind(Uuid::from(organization_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(match row {
            Some(row) => Usage {
                entities: row.get::<i64, _>("entities") as u64,
                queries: row.get::<i64, _>("queries") as u64,
                source_connections: row.get::<i64, _>("source_connections") as u64,
                team_members: row.get::<i64, _>("team_members") as u64,
            },
            None => Usage::default(),
        })
    }

    async fn increment_usage(
        &self,
        organization_id: OrganizationId,
        action: ActionType,
        amount: u64,
    ) -> Result<Usage, DataError> {
        let column = match action {
            ActionType::Entities => "entities",
            ActionType::Queries => "queries",
            ActionType::SourceConnections => "source_connections",
            ActionType::TeamMembers => "team_members",
        };

        sqlx::query(
            "INSERT INTO usage (organization_id, entities, queries, source_connections, team_members) \
             VALUES ($1, 0, 0, 0, 0) ON CONFLICT (organization_id) DO NOTHING",
        )
        .bind(Uuid::from(organization_id))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        let query = format!(
            "UPDATE usage SET {column} = {column} + $2 WHERE organization_id = $1 \
             RETURNING entities, queries, source_connections, team_members"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::from(organization_id))
            .bind(amount as i64)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;

        Ok(Usage {
            entities: row.get::<i64, _>("entities") as u64,
            queries: row.get::<i64, _>("queries") as u64,
            source_connections: row.get::<i64, _>("source_connections") as u64,
            team_members: row.get::<i64, _>("team_members") as u64,
        })
    }

    async fn get_billing_status(
        &self,
        organization_id: OrganizationId,
    ) -> Result<BillingPeriodStatus, DataError> {
        let row = sqlx::query("SELECT status FROM billing_periods WHERE organization_id = $1")
            .bind(Uuid::from(organization_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;

        match row {
            Some(row) => billing_status_from_str(row.get::<&str, _>("status")),
            None => Ok(BillingPeriodStatus::Active),
        }
    }

    async fn load_previous_snapshot(&self, sync_id: SyncId) -> Result<HashMap<String, String>, DataError> {
        let rows = sqlx::query(
            "SELECT entity_id, content_hash FROM sync_snapshots WHERE sync_id = $1",
        )
        .bind(Uuid::from(sync_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("entity_id"), row.get("content_hash")))
            .collect())
    }

    async fn save_snapshot(
        &self,
        sync_id: SyncId,
        snapshot: HashMap<String, String>,
    ) -> Result<(), DataError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        sqlx::query("DELETE FROM sync_snapshots WHERE sync_id = $1")
            .bind(Uuid::from(sync_id))
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;

        for (entity_id, content_hash) in &snapshot {
            sqlx::query(
                "INSERT INTO sync_snapshots (sync_id, entity_id, content_hash) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::from(sync_id))
            .bind(entity_id)
            .bind(content_hash)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        tx.commit().await.map_err(map_err)?;
        Ok(())
    }
}
