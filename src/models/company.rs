use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values, nullable},
    validation::{self, STATUS_APPROVED, STATUS_PENDING, Validate, ValidationError},
};

/// AllowedCompany
///
/// A company allowed to transact through the platform once approved
/// (`allowed_companies` table). `APPROVED` mirrors `STATUS == "Approved"` and
/// `APPROVED_BY` names the user who made the last status decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct AllowedCompany {
    pub id: i64,
    pub company_name: String,
    pub short_code: String,
    pub description: Option<String>,
    pub approved: bool,
    pub status: String,
    pub approved_by: Option<String>,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

/// New companies always start `Pending`; approval goes through an update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateCompanyRequest {
    pub company_name: Option<String>,
    pub short_code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateCompanyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// ApprovalRequest
///
/// Payload of PUT /api/companies/{id}/approval.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct ApprovalRequest {
    pub status: Option<String>,
}

impl Validate for CreateCompanyRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("COMPANY_NAME", &self.company_name)?;
        validation::required("SHORT_CODE", &self.short_code)
    }
}

impl Validate for UpdateCompanyRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("COMPANY_NAME", &self.company_name)?;
        validation::not_blank("SHORT_CODE", &self.short_code)?;
        validation::status("STATUS", &self.status)
    }
}

impl Validate for ApprovalRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("STATUS", &self.status)?;
        validation::status("STATUS", &self.status)
    }
}

impl From<ApprovalRequest> for UpdateCompanyRequest {
    fn from(req: ApprovalRequest) -> Self {
        Self {
            status: req.status,
            ..Self::default()
        }
    }
}

impl Resource for AllowedCompany {
    type Create = CreateCompanyRequest;
    type Update = UpdateCompanyRequest;

    const TABLE: &'static str = "allowed_companies";
    const LABEL: &'static str = "Company";
    const COLUMNS: &'static str =
        "ID, COMPANY_NAME, SHORT_CODE, DESCRIPTION, APPROVED, STATUS, APPROVED_BY";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["COMPANY_NAME", "SHORT_CODE", "DESCRIPTION", "APPROVED", "STATUS"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.company_name.as_deref())
            .bind(input.short_code.as_deref())
            .bind(input.description.as_deref())
            .bind(false)
            .bind(STATUS_PENDING);
    }

    fn assign_update<'a>(input: &'a Self::Update, actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("COMPANY_NAME", input.company_name.as_deref())
            .set("SHORT_CODE", input.short_code.as_deref())
            .set("DESCRIPTION", nullable(&input.description));

        // A status decision also flips APPROVED and records who made it.
        if let Some(status) = input.status.as_deref() {
            set.set("STATUS", Some(status))
                .set("APPROVED", Some(status == STATUS_APPROVED))
                .set("APPROVED_BY", Some(actor));
        }
    }

    fn conflict_message(constraint: &str) -> Option<&'static str> {
        match constraint {
            "allowed_companies_short_code_key" => Some("Company short code already exists"),
            _ => None,
        }
    }
}
