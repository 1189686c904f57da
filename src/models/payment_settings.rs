use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values, nullable},
    validation::{self, Validate, ValidationError},
};

// Secrets in this module are write-only: accepted on create/update, never serialized.

/// StreamPaySetting
///
/// Credentials for the StreamPay integration (`stream_pay_settings` table).
/// The lowest-ID row is the active configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct StreamPaySetting {
    pub id: i64,
    pub base_url: String,
    pub api_key: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub secret_key: String,
    pub merchant_code: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateStreamPaySettingRequest {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub merchant_code: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateStreamPaySettingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub merchant_code: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreateStreamPaySettingRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("BASE_URL", &self.base_url)?;
        validation::url("BASE_URL", &self.base_url)?;
        validation::required("API_KEY", &self.api_key)?;
        validation::required("SECRET_KEY", &self.secret_key)
    }
}

impl Validate for UpdateStreamPaySettingRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::url("BASE_URL", &self.base_url)?;
        validation::not_blank("API_KEY", &self.api_key)?;
        validation::not_blank("SECRET_KEY", &self.secret_key)
    }
}

impl Resource for StreamPaySetting {
    type Create = CreateStreamPaySettingRequest;
    type Update = UpdateStreamPaySettingRequest;

    const TABLE: &'static str = "stream_pay_settings";
    const LABEL: &'static str = "Stream pay settings";
    const COLUMNS: &'static str = "ID, BASE_URL, API_KEY, SECRET_KEY, MERCHANT_CODE, IS_ACTIVE";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["BASE_URL", "API_KEY", "SECRET_KEY", "MERCHANT_CODE", "IS_ACTIVE"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.base_url.as_deref())
            .bind(input.api_key.as_deref())
            .bind(input.secret_key.as_deref())
            .bind(input.merchant_code.as_deref())
            .bind(input.is_active.unwrap_or(true));
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("BASE_URL", input.base_url.as_deref())
            .set("API_KEY", input.api_key.as_deref())
            .set("SECRET_KEY", input.secret_key.as_deref())
            .set("MERCHANT_CODE", nullable(&input.merchant_code))
            .set("IS_ACTIVE", input.is_active);
    }

    fn order_by() -> &'static str {
        "ID"
    }
}

/// UssdPushSetting
///
/// Credentials for the USSD push integration (`ussd_push_settings` table).
/// The lowest-ID row is the active configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UssdPushSetting {
    pub id: i64,
    pub short_code: String,
    pub callback_url: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password: String,
    pub api_key: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateUssdPushSettingRequest {
    pub short_code: Option<String>,
    pub callback_url: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateUssdPushSettingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub api_key: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreateUssdPushSettingRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("SHORT_CODE", &self.short_code)?;
        validation::required("CALLBACK_URL", &self.callback_url)?;
        validation::url("CALLBACK_URL", &self.callback_url)?;
        validation::required("USERNAME", &self.username)?;
        validation::required("PASSWORD", &self.password)
    }
}

impl Validate for UpdateUssdPushSettingRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("SHORT_CODE", &self.short_code)?;
        validation::url("CALLBACK_URL", &self.callback_url)?;
        validation::not_blank("USERNAME", &self.username)?;
        validation::not_blank("PASSWORD", &self.password)
    }
}

impl Resource for UssdPushSetting {
    type Create = CreateUssdPushSettingRequest;
    type Update = UpdateUssdPushSettingRequest;

    const TABLE: &'static str = "ussd_push_settings";
    const LABEL: &'static str = "USSD push settings";
    const COLUMNS: &'static str =
        "ID, SHORT_CODE, CALLBACK_URL, USERNAME, PASSWORD, API_KEY, IS_ACTIVE";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "SHORT_CODE",
        "CALLBACK_URL",
        "USERNAME",
        "PASSWORD",
        "API_KEY",
        "IS_ACTIVE",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.short_code.as_deref())
            .bind(input.callback_url.as_deref())
            .bind(input.username.as_deref())
            .bind(input.password.as_deref())
            .bind(input.api_key.as_deref())
            .bind(input.is_active.unwrap_or(true));
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("SHORT_CODE", input.short_code.as_deref())
            .set("CALLBACK_URL", input.callback_url.as_deref())
            .set("USERNAME", input.username.as_deref())
            .set("PASSWORD", input.password.as_deref())
            .set("API_KEY", nullable(&input.api_key))
            .set("IS_ACTIVE", input.is_active);
    }

    fn order_by() -> &'static str {
        "ID"
    }
}
