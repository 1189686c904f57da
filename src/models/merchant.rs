use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values, nullable},
    validation::{self, STATUS_PENDING, Validate, ValidationError},
};

/// Merchant
///
/// A merchant onboarded onto the payment platform (`merchants` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct Merchant {
    pub id: i64,
    pub merchant_name: String,
    /// Business identifier, unique across merchants.
    pub merchant_code: String,
    pub tin_number: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub status: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateMerchantRequest {
    pub merchant_name: Option<String>,
    pub merchant_code: Option<String>,
    pub tin_number: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateMerchantRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_code: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub tin_number: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub phone_number: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub email: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for CreateMerchantRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("MERCHANT_NAME", &self.merchant_name)?;
        validation::required("MERCHANT_CODE", &self.merchant_code)?;
        validation::phone("PHONE_NUMBER", &self.phone_number)?;
        validation::email("EMAIL", &self.email)?;
        validation::status("STATUS", &self.status)
    }
}

impl Validate for UpdateMerchantRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("MERCHANT_NAME", &self.merchant_name)?;
        validation::not_blank("MERCHANT_CODE", &self.merchant_code)?;
        validation::phone("PHONE_NUMBER", validation::provided(&self.phone_number))?;
        validation::email("EMAIL", validation::provided(&self.email))?;
        validation::status("STATUS", &self.status)
    }
}

impl Resource for Merchant {
    type Create = CreateMerchantRequest;
    type Update = UpdateMerchantRequest;

    const TABLE: &'static str = "merchants";
    const LABEL: &'static str = "Merchant";
    const COLUMNS: &'static str =
        "ID, MERCHANT_NAME, MERCHANT_CODE, TIN_NUMBER, PHONE_NUMBER, EMAIL, ADDRESS, STATUS";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "MERCHANT_NAME",
        "MERCHANT_CODE",
        "TIN_NUMBER",
        "PHONE_NUMBER",
        "EMAIL",
        "ADDRESS",
        "STATUS",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.merchant_name.as_deref())
            .bind(input.merchant_code.as_deref())
            .bind(input.tin_number.as_deref())
            .bind(input.phone_number.as_deref())
            .bind(input.email.as_deref())
            .bind(input.address.as_deref())
            .bind(input.status.as_deref().unwrap_or(STATUS_PENDING));
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("MERCHANT_NAME", input.merchant_name.as_deref())
            .set("MERCHANT_CODE", input.merchant_code.as_deref())
            .set("TIN_NUMBER", nullable(&input.tin_number))
            .set("PHONE_NUMBER", nullable(&input.phone_number))
            .set("EMAIL", nullable(&input.email))
            .set("ADDRESS", nullable(&input.address))
            .set("STATUS", input.status.as_deref());
    }

    fn conflict_message(constraint: &str) -> Option<&'static str> {
        match constraint {
            "merchants_merchant_code_key" => Some("Merchant code already exists"),
            _ => None,
        }
    }
}
