use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values, nullable},
    validation::{self, STATUS_PENDING, Validate, ValidationError},
};

/// Branch
///
/// A physical or logical outlet of a merchant (`merchant_branches` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct Branch {
    pub id: i64,
    pub merchant_id: i64,
    pub branch_name: String,
    pub branch_code: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub status: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateBranchRequest {
    pub merchant_id: Option<i64>,
    pub branch_name: Option<String>,
    pub branch_code: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateBranchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub branch_code: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub location: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub phone_number: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for CreateBranchRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required_id("MERCHANT_ID", self.merchant_id)?;
        validation::required("BRANCH_NAME", &self.branch_name)?;
        validation::phone("PHONE_NUMBER", &self.phone_number)?;
        validation::status("STATUS", &self.status)
    }
}

impl Validate for UpdateBranchRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("BRANCH_NAME", &self.branch_name)?;
        validation::phone("PHONE_NUMBER", validation::provided(&self.phone_number))?;
        validation::status("STATUS", &self.status)
    }
}

impl Resource for Branch {
    type Create = CreateBranchRequest;
    type Update = UpdateBranchRequest;

    const TABLE: &'static str = "merchant_branches";
    const LABEL: &'static str = "Branch";
    const COLUMNS: &'static str =
        "ID, MERCHANT_ID, BRANCH_NAME, BRANCH_CODE, LOCATION, PHONE_NUMBER, STATUS";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "MERCHANT_ID",
        "BRANCH_NAME",
        "BRANCH_CODE",
        "LOCATION",
        "PHONE_NUMBER",
        "STATUS",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.merchant_id)
            .bind(input.branch_name.as_deref())
            .bind(input.branch_code.as_deref())
            .bind(input.location.as_deref())
            .bind(input.phone_number.as_deref())
            .bind(input.status.as_deref().unwrap_or(STATUS_PENDING));
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("BRANCH_NAME", input.branch_name.as_deref())
            .set("BRANCH_CODE", nullable(&input.branch_code))
            .set("LOCATION", nullable(&input.location))
            .set("PHONE_NUMBER", nullable(&input.phone_number))
            .set("STATUS", input.status.as_deref());
    }

    fn conflict_message(constraint: &str) -> Option<&'static str> {
        match constraint {
            "merchant_branches_branch_code_key" => {
                Some("Branch code already exists for this merchant")
            }
            _ => None,
        }
    }

    fn order_by() -> &'static str {
        "MERCHANT_ID, ID"
    }
}
