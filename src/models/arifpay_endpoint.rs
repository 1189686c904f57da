use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values, nullable},
    validation::{self, Validate, ValidationError},
};

/// ArifpayEndpoint
///
/// Routing configuration for one payment-gateway call (`arifpay_endpoints` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct ArifpayEndpoint {
    pub id: i64,
    pub endpoint_name: String,
    pub base_url: String,
    pub path: Option<String>,
    pub http_method: String,
    pub timeout_ms: Option<i32>,
    pub is_active: bool,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateArifpayEndpointRequest {
    pub endpoint_name: Option<String>,
    pub base_url: Option<String>,
    pub path: Option<String>,
    pub http_method: Option<String>,
    pub timeout_ms: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateArifpayEndpointRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub path: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<i32>)]
    #[ts(as = "Option<i32>")]
    pub timeout_ms: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreateArifpayEndpointRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("ENDPOINT_NAME", &self.endpoint_name)?;
        validation::required("BASE_URL", &self.base_url)?;
        validation::url("BASE_URL", &self.base_url)?;
        validation::http_method("HTTP_METHOD", &self.http_method)?;
        validation::non_negative("TIMEOUT_MS", self.timeout_ms)
    }
}

impl Validate for UpdateArifpayEndpointRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("ENDPOINT_NAME", &self.endpoint_name)?;
        validation::url("BASE_URL", &self.base_url)?;
        validation::http_method("HTTP_METHOD", &self.http_method)?;
        validation::non_negative("TIMEOUT_MS", self.timeout_ms.flatten())
    }
}

impl Resource for ArifpayEndpoint {
    type Create = CreateArifpayEndpointRequest;
    type Update = UpdateArifpayEndpointRequest;

    const TABLE: &'static str = "arifpay_endpoints";
    const LABEL: &'static str = "Endpoint";
    const COLUMNS: &'static str =
        "ID, ENDPOINT_NAME, BASE_URL, PATH, HTTP_METHOD, TIMEOUT_MS, IS_ACTIVE";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "ENDPOINT_NAME",
        "BASE_URL",
        "PATH",
        "HTTP_METHOD",
        "TIMEOUT_MS",
        "IS_ACTIVE",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.endpoint_name.as_deref())
            .bind(input.base_url.as_deref())
            .bind(input.path.as_deref())
            .bind(input.http_method.as_deref().unwrap_or("POST"))
            .bind(input.timeout_ms)
            .bind(input.is_active.unwrap_or(true));
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("ENDPOINT_NAME", input.endpoint_name.as_deref())
            .set("BASE_URL", input.base_url.as_deref())
            .set("PATH", nullable(&input.path))
            .set("HTTP_METHOD", input.http_method.as_deref())
            .set("TIMEOUT_MS", input.timeout_ms)
            .set("IS_ACTIVE", input.is_active);
    }

    fn conflict_message(constraint: &str) -> Option<&'static str> {
        match constraint {
            "arifpay_endpoints_endpoint_name_key" => Some("Endpoint name already exists"),
            _ => None,
        }
    }
}
