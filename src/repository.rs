use crate::{
    audit::{self, Actor, AuditAction, NewAuditEntry},
    errors::RepoError,
    models::{
        AllowedCompany, ArifpayEndpoint, AuditLog, AuditLogFilter, Branch, DashboardStats,
        Merchant, MerchantUser, Role, RoleCapability, StreamPaySetting, SystemUser,
        UssdPushSetting,
    },
    resource::{
        Resource, delete_sql, insert_statement, select_all_sql, select_by_id_sql,
        select_first_sql, select_for_update_sql, select_list, update_statement,
    },
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;

/// ResourceRepository
///
/// CRUD contract for one audited entity table. Every write runs in its own
/// transaction together with exactly one `audit_log` row; a failed write leaves
/// neither behind.
#[async_trait]
pub trait ResourceRepository<R: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, RepoError>;

    /// Fails with `RepoError::NotFound` when no row has this id.
    async fn find(&self, id: i64) -> Result<R, RepoError>;

    /// The row with the lowest id; `RepoError::NotFound` on an empty table.
    async fn first(&self) -> Result<R, RepoError>;

    async fn create(&self, actor: &Actor, input: R::Create) -> Result<R, RepoError>;

    /// Partial update: only the fields present in `input` change.
    async fn update(&self, actor: &Actor, id: i64, input: R::Update) -> Result<R, RepoError>;

    /// Returns the deleted row.
    async fn delete(&self, actor: &Actor, id: i64) -> Result<R, RepoError>;
}

/// Repository Trait
///
/// The full persistence contract of the API: CRUD for every entity table plus the
/// read-only queries behind the role tree, the audit browser and the dashboard.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's asynchronous task boundaries. Handlers reach the
/// per-table methods through `ResourceRepository::<R>::…`.
#[async_trait]
pub trait Repository:
    ResourceRepository<Merchant>
    + ResourceRepository<Branch>
    + ResourceRepository<AllowedCompany>
    + ResourceRepository<SystemUser>
    + ResourceRepository<Role>
    + ResourceRepository<RoleCapability>
    + ResourceRepository<ArifpayEndpoint>
    + ResourceRepository<MerchantUser>
    + ResourceRepository<StreamPaySetting>
    + ResourceRepository<UssdPushSetting>
    + Send
    + Sync
{
    /// Flat capability rows of one role, ordered by `ID`.
    async fn list_role_capabilities(&self, role_id: i64) -> Result<Vec<RoleCapability>, RepoError>;

    /// Audit rows, newest first, narrowed by the filter.
    async fn list_audit_logs(&self, filter: AuditLogFilter) -> Result<Vec<AuditLog>, RepoError>;

    async fn get_stats(&self) -> Result<DashboardStats, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl<R: Resource> ResourceRepository<R> for PostgresRepository {
    async fn list(&self) -> Result<Vec<R>, RepoError> {
        let rows = sqlx::query_as::<_, R>(&select_all_sql::<R>())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<R, RepoError> {
        sqlx::query_as::<_, R>(&select_by_id_sql::<R>())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn first(&self) -> Result<R, RepoError> {
        sqlx::query_as::<_, R>(&select_first_sql::<R>())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    /// create
    ///
    /// `BEGIN`, `INSERT … RETURNING`, audit row (`CREATE`, no old snapshot), `COMMIT`.
    async fn create(&self, actor: &Actor, input: R::Create) -> Result<R, RepoError> {
        let mut tx = self.pool.begin().await?;

        let mut insert = insert_statement::<R>(&input, &actor.user_name);
        let row = insert.build_query_as::<R>().fetch_one(&mut *tx).await?;

        let entry = NewAuditEntry::for_change(AuditAction::Create, actor, None, Some(&row))?;
        audit::record(&mut *tx, &entry).await?;

        tx.commit().await?;
        tracing::info!(table = R::TABLE, id = row.id(), user = %actor.user_name, "record created");
        Ok(row)
    }

    /// update
    ///
    /// The prior row is read with `FOR UPDATE` inside the transaction, so the old
    /// snapshot is exactly what the UPDATE overwrote. A missing row returns before
    /// anything is written; dropping `tx` rolls back.
    async fn update(&self, actor: &Actor, id: i64, input: R::Update) -> Result<R, RepoError> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, R>(&select_for_update_sql::<R>())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepoError::NotFound)?;

        let mut update = update_statement::<R>(id, &input, &actor.user_name);
        let new = update.build_query_as::<R>().fetch_one(&mut *tx).await?;

        let entry = NewAuditEntry::for_change(AuditAction::Update, actor, Some(&old), Some(&new))?;
        audit::record(&mut *tx, &entry).await?;

        tx.commit().await?;
        tracing::info!(table = R::TABLE, id, user = %actor.user_name, "record updated");
        Ok(new)
    }

    async fn delete(&self, actor: &Actor, id: i64) -> Result<R, RepoError> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, R>(&select_for_update_sql::<R>())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepoError::NotFound)?;

        // Dependents are never removed behind the audit log's back: a referenced
        // row cannot be deleted until its dependents are.
        sqlx::query(&delete_sql::<R>())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| match RepoError::from(err) {
                RepoError::InvalidReference { constraint } => RepoError::InUse { constraint },
                other => other,
            })?;

        let entry = NewAuditEntry::for_change(AuditAction::Delete, actor, Some(&old), None)?;
        audit::record(&mut *tx, &entry).await?;

        tx.commit().await?;
        tracing::info!(table = R::TABLE, id, user = %actor.user_name, "record deleted");
        Ok(old)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_role_capabilities(&self, role_id: i64) -> Result<Vec<RoleCapability>, RepoError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE ROLE_ID = $1 ORDER BY ID",
            select_list::<RoleCapability>(),
            RoleCapability::TABLE
        );
        let rows = sqlx::query_as::<_, RoleCapability>(&sql)
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// list_audit_logs
    ///
    /// Optional filters are appended with QueryBuilder binds; the limit is clamped
    /// by `AuditLogFilter::effective_limit`.
    async fn list_audit_logs(&self, filter: AuditLogFilter) -> Result<Vec<AuditLog>, RepoError> {
        let limit = filter.effective_limit();
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT id, table_name, record_id, action, old_value, new_value,
                   user_id, user_name, request_id, created_at
            FROM audit_log
            WHERE TRUE
            "#,
        );

        if let Some(table_name) = filter.table_name {
            builder.push(" AND table_name = ");
            builder.push_bind(table_name);
        }

        if let Some(record_id) = filter.record_id {
            builder.push(" AND record_id = ");
            builder.push_bind(record_id);
        }

        builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        builder.push_bind(limit);

        let rows = builder
            .build_query_as::<AuditLog>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// get_stats
    ///
    /// Compiles the dashboard counters in a single round trip.
    async fn get_stats(&self) -> Result<DashboardStats, RepoError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM merchants) AS total_merchants,
                (SELECT COUNT(*) FROM merchant_branches) AS total_branches,
                (SELECT COUNT(*) FROM allowed_companies WHERE STATUS = 'Pending') AS pending_companies,
                (SELECT COUNT(*) FROM system_users) AS total_system_users,
                (SELECT COUNT(*) FROM merchant_users WHERE IS_LOCKED) AS locked_merchant_users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
