use std::fmt;

use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{errors::RepoError, resource::Resource};

/// Actor
///
/// The authenticated user performing a mutation, as recorded on the audit row
/// and in the `INSERTUSER`/`UPDATEUSER` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub user_name: String,
    /// Correlates the audit row with the request's `x-request-id`.
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// NewAuditEntry
///
/// One audit row to be written in the same transaction as the mutation it describes.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub table_name: &'static str,
    pub record_id: i64,
    pub action: AuditAction,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub user_id: i64,
    pub user_name: String,
    pub request_id: Option<Uuid>,
}

impl NewAuditEntry {
    /// Snapshots `old` and `new` as JSON. The record id is taken from whichever
    /// snapshot exists (the new row for creates and updates, the old row for deletes).
    pub fn for_change<R: Resource>(
        action: AuditAction,
        actor: &Actor,
        old: Option<&R>,
        new: Option<&R>,
    ) -> Result<Self, serde_json::Error> {
        let record_id = new.or(old).map(|row| row.id()).unwrap_or_default();
        Ok(Self {
            table_name: R::TABLE,
            record_id,
            action,
            old_value: old.map(serde_json::to_value).transpose()?,
            new_value: new.map(serde_json::to_value).transpose()?,
            user_id: actor.user_id,
            user_name: actor.user_name.clone(),
            request_id: actor.request_id,
        })
    }
}

/// record
///
/// Inserts the audit row on the caller's connection. Callers pass the open
/// transaction (`&mut *tx`), which makes the audit row commit or roll back
/// together with the mutation.
pub async fn record(conn: &mut PgConnection, entry: &NewAuditEntry) -> Result<i64, RepoError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO audit_log (table_name, record_id, action, old_value, new_value, user_id, user_name, request_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(entry.table_name)
    .bind(entry.record_id)
    .bind(entry.action.as_str())
    .bind(&entry.old_value)
    .bind(&entry.new_value)
    .bind(entry.user_id)
    .bind(&entry.user_name)
    .bind(entry.request_id)
    .fetch_one(conn)
    .await?;

    tracing::debug!(
        audit_id = id,
        table = entry.table_name,
        record_id = entry.record_id,
        action = %entry.action,
        "audit entry recorded"
    );

    Ok(id)
}
