use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// AuditLog
///
/// One row of the append-only `audit_log` table: who changed which record of which
/// table, when, and the before/after snapshots. Serialized in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditLog {
    pub id: i64,
    pub table_name: String,
    pub record_id: i64,
    /// "CREATE" | "UPDATE" | "DELETE"
    pub action: String,
    #[ts(type = "unknown")]
    pub old_value: Option<Value>,
    #[ts(type = "unknown")]
    pub new_value: Option<Value>,
    pub user_id: i64,
    pub user_name: String,
    pub request_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AuditLogFilter
///
/// Query parameters of GET /api/audit-logs.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditLogFilter {
    /// Restrict to one table, e.g. `merchants`.
    pub table_name: Option<String>,
    /// Restrict to one record id (usually combined with `tableName`).
    pub record_id: Option<i64>,
    /// Maximum rows returned (default 100, capped at 500).
    pub limit: Option<i64>,
}

impl AuditLogFilter {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}
