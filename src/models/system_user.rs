use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values},
    validation::{self, STATUS_PENDING, Validate, ValidationError},
};

/// SystemUser
///
/// A back-office operator (`system_users` table). The authentication token's
/// subject is this row's `ID`; the row's `FULL_NAME` is stamped on every write
/// the user performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct SystemUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub role_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub status: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateSystemUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role_id: Option<i64>,
    pub branch_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateSystemUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<i64>)]
    #[ts(as = "Option<i64>")]
    pub role_id: Option<Option<i64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<i64>)]
    #[ts(as = "Option<i64>")]
    pub branch_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for CreateSystemUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("FULL_NAME", &self.full_name)?;
        validation::required("EMAIL", &self.email)?;
        validation::email("EMAIL", &self.email)?;
        validation::required("PHONE_NUMBER", &self.phone_number)?;
        validation::phone("PHONE_NUMBER", &self.phone_number)
    }
}

impl Validate for UpdateSystemUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("FULL_NAME", &self.full_name)?;
        validation::email("EMAIL", &self.email)?;
        validation::phone("PHONE_NUMBER", &self.phone_number)?;
        validation::status("STATUS", &self.status)
    }
}

impl Resource for SystemUser {
    type Create = CreateSystemUserRequest;
    type Update = UpdateSystemUserRequest;

    const TABLE: &'static str = "system_users";
    const LABEL: &'static str = "User";
    const COLUMNS: &'static str = "ID, FULL_NAME, EMAIL, PHONE_NUMBER, ROLE_ID, BRANCH_ID, STATUS";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "FULL_NAME",
        "EMAIL",
        "PHONE_NUMBER",
        "ROLE_ID",
        "BRANCH_ID",
        "STATUS",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.full_name.as_deref())
            .bind(input.email.as_deref())
            .bind(input.phone_number.as_deref())
            .bind(input.role_id)
            .bind(input.branch_id)
            .bind(STATUS_PENDING);
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("FULL_NAME", input.full_name.as_deref())
            .set("EMAIL", input.email.as_deref())
            .set("PHONE_NUMBER", input.phone_number.as_deref())
            .set("ROLE_ID", input.role_id)
            .set("BRANCH_ID", input.branch_id)
            .set("STATUS", input.status.as_deref());
    }

    fn conflict_message(constraint: &str) -> Option<&'static str> {
        match constraint {
            "system_users_email_key" => Some("Email is already registered"),
            "system_users_phone_number_key" => Some("Phone number is already registered"),
            _ => None,
        }
    }
}
