use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values, nullable},
    validation::{self, STATUS_PENDING, Validate, ValidationError},
};

/// MerchantUser
///
/// A merchant-side login bound to a device (`merchant_users` table), carrying the
/// failed-attempt counter and lock flag of that login.
///
/// `ENCRYPTION_KEY` is persisted but never serialized, so it appears neither in
/// responses nor in audit snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct MerchantUser {
    pub id: i64,
    pub merchant_id: i64,
    pub username: String,
    pub phone_number: String,
    pub device_id: Option<String>,
    pub failed_attempts: i32,
    pub is_locked: bool,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub encryption_key: Option<String>,
    #[ts(type = "string | null")]
    pub last_login_date: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateMerchantUserRequest {
    pub merchant_id: Option<i64>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub device_id: Option<String>,
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateMerchantUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub device_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_attempts: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UpdateMerchantUserRequest {
    /// The update applied by PUT /api/merchant-users/{id}/unlock.
    pub fn unlock() -> Self {
        Self {
            failed_attempts: Some(0),
            is_locked: Some(false),
            ..Self::default()
        }
    }
}

impl Validate for CreateMerchantUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required_id("MERCHANT_ID", self.merchant_id)?;
        validation::required("USERNAME", &self.username)?;
        validation::required("PHONE_NUMBER", &self.phone_number)?;
        validation::phone("PHONE_NUMBER", &self.phone_number)
    }
}

impl Validate for UpdateMerchantUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("USERNAME", &self.username)?;
        validation::phone("PHONE_NUMBER", &self.phone_number)?;
        validation::non_negative("FAILED_ATTEMPTS", self.failed_attempts)?;
        validation::status("STATUS", &self.status)
    }
}

impl Resource for MerchantUser {
    type Create = CreateMerchantUserRequest;
    type Update = UpdateMerchantUserRequest;

    const TABLE: &'static str = "merchant_users";
    const LABEL: &'static str = "Merchant user";
    const COLUMNS: &'static str = "ID, MERCHANT_ID, USERNAME, PHONE_NUMBER, DEVICE_ID, \
         FAILED_ATTEMPTS, IS_LOCKED, ENCRYPTION_KEY, LAST_LOGIN_DATE, STATUS";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "MERCHANT_ID",
        "USERNAME",
        "PHONE_NUMBER",
        "DEVICE_ID",
        "ENCRYPTION_KEY",
        "STATUS",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.merchant_id)
            .bind(input.username.as_deref())
            .bind(input.phone_number.as_deref())
            .bind(input.device_id.as_deref())
            .bind(input.encryption_key.as_deref())
            .bind(STATUS_PENDING);
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("USERNAME", input.username.as_deref())
            .set("PHONE_NUMBER", input.phone_number.as_deref())
            .set("DEVICE_ID", nullable(&input.device_id))
            .set("FAILED_ATTEMPTS", input.failed_attempts)
            .set("IS_LOCKED", input.is_locked)
            .set("ENCRYPTION_KEY", input.encryption_key.as_deref())
            .set("STATUS", input.status.as_deref());
    }

    fn conflict_message(constraint: &str) -> Option<&'static str> {
        match constraint {
            "merchant_users_username_key" => Some("Username is already taken"),
            "merchant_users_phone_number_key" => Some("Phone number is already registered"),
            _ => None,
        }
    }
}
