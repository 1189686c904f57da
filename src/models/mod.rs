//! Row, request and response types.
//!
//! Entity rows serialize with the legacy UPPER_CASE field names. Postgres folds the
//! unquoted upper-case column names to lower case, which is what the snake_case
//! struct fields map. Date columns are `DateTime<Utc>` and serialize as RFC 3339 text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

mod arifpay_endpoint;
mod audit_log;
mod branch;
mod company;
mod merchant;
mod merchant_user;
mod payment_settings;
mod role;
mod system_user;

pub use arifpay_endpoint::{ArifpayEndpoint, CreateArifpayEndpointRequest, UpdateArifpayEndpointRequest};
pub use audit_log::{AuditLog, AuditLogFilter};
pub use branch::{Branch, CreateBranchRequest, UpdateBranchRequest};
pub use company::{AllowedCompany, ApprovalRequest, CreateCompanyRequest, UpdateCompanyRequest};
pub use merchant::{CreateMerchantRequest, Merchant, UpdateMerchantRequest};
pub use merchant_user::{CreateMerchantUserRequest, MerchantUser, UpdateMerchantUserRequest};
pub use payment_settings::{
    CreateStreamPaySettingRequest, CreateUssdPushSettingRequest, StreamPaySetting,
    UpdateStreamPaySettingRequest, UpdateUssdPushSettingRequest, UssdPushSetting,
};
pub use role::{
    CapabilityNode, CreateRoleCapabilityRequest, CreateRoleRequest, Role, RoleCapability,
    UpdateRoleCapabilityRequest, UpdateRoleRequest,
};
pub use system_user::{CreateSystemUserRequest, SystemUser, UpdateSystemUserRequest};

/// AuditStamp
///
/// The `INSERTDATE`/`UPDATEDATE`/`INSERTUSER`/`UPDATEUSER` columns carried by every
/// entity table. Flattened into each row struct, both for sqlx and for JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct AuditStamp {
    #[ts(type = "string")]
    pub insertdate: DateTime<Utc>,
    #[ts(type = "string")]
    pub updatedate: DateTime<Utc>,
    pub insertuser: Option<String>,
    pub updateuser: Option<String>,
}

/// DashboardStats
///
/// Output schema for the dashboard landing page (GET /api/dashboard/stats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_merchants: i64,
    pub total_branches: i64,
    /// Companies still waiting for an approval decision.
    pub pending_companies: i64,
    pub total_system_users: i64,
    pub locked_merchant_users: i64,
}
