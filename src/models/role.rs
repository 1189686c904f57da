use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::AuditStamp;
use crate::{
    resource::{Assignments, Resource, Values, nullable},
    validation::{self, STATUS_PENDING, Validate, ValidationError},
};

/// Role
///
/// A named bundle of menu capabilities assigned to system users (`roles` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct Role {
    pub id: i64,
    pub role_name: String,
    pub description: Option<String>,
    pub status: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateRoleRequest {
    pub role_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateRoleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
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

impl Validate for CreateRoleRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("ROLE_NAME", &self.role_name)
    }
}

impl Validate for UpdateRoleRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("ROLE_NAME", &self.role_name)?;
        validation::status("STATUS", &self.status)
    }
}

impl Resource for Role {
    type Create = CreateRoleRequest;
    type Update = UpdateRoleRequest;

    const TABLE: &'static str = "roles";
    const LABEL: &'static str = "Role";
    const COLUMNS: &'static str = "ID, ROLE_NAME, DESCRIPTION, STATUS";
    const INSERT_COLUMNS: &'static [&'static str] = &["ROLE_NAME", "DESCRIPTION", "STATUS"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.role_name.as_deref())
            .bind(input.description.as_deref())
            .bind(STATUS_PENDING);
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("ROLE_NAME", input.role_name.as_deref())
            .set("DESCRIPTION", nullable(&input.description))
            .set("STATUS", input.status.as_deref());
    }

    fn conflict_message(constraint: &str) -> Option<&'static str> {
        match constraint {
            "roles_role_name_key" => Some("Role name already exists"),
            _ => None,
        }
    }
}

/// RoleCapability
///
/// One menu/permission entry of a role (`role_capablities` table). Entries nest
/// through `PARENTID`; see `permissions::capability_tree`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct RoleCapability {
    pub id: i64,
    pub role_id: i64,
    pub menu_name: String,
    pub menu_path: Option<String>,
    pub parentid: Option<i64>,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_approve: bool,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct CreateRoleCapabilityRequest {
    pub role_id: Option<i64>,
    pub menu_name: Option<String>,
    pub menu_path: Option<String>,
    pub parentid: Option<i64>,
    pub can_view: Option<bool>,
    pub can_create: Option<bool>,
    pub can_edit: Option<bool>,
    pub can_delete: Option<bool>,
    pub can_approve: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub struct UpdateRoleCapabilityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(as = "Option<String>")]
    pub menu_path: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<i64>)]
    #[ts(as = "Option<i64>")]
    pub parentid: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_view: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_create: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_edit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_approve: Option<bool>,
}

impl Validate for CreateRoleCapabilityRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required_id("ROLE_ID", self.role_id)?;
        validation::required("MENU_NAME", &self.menu_name)?;
        if let Some(parent) = self.parentid {
            validation::required_id("PARENTID", Some(parent))?;
        }
        Ok(())
    }
}

impl Validate for UpdateRoleCapabilityRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::not_blank("MENU_NAME", &self.menu_name)?;
        if let Some(Some(parent)) = self.parentid {
            validation::required_id("PARENTID", Some(parent))?;
        }
        Ok(())
    }
}

impl Resource for RoleCapability {
    type Create = CreateRoleCapabilityRequest;
    type Update = UpdateRoleCapabilityRequest;

    const TABLE: &'static str = "role_capablities";
    const LABEL: &'static str = "Role capability";
    const COLUMNS: &'static str = "ID, ROLE_ID, MENU_NAME, MENU_PATH, PARENTID, CAN_VIEW, \
         CAN_CREATE, CAN_EDIT, CAN_DELETE, CAN_APPROVE";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "ROLE_ID",
        "MENU_NAME",
        "MENU_PATH",
        "PARENTID",
        "CAN_VIEW",
        "CAN_CREATE",
        "CAN_EDIT",
        "CAN_DELETE",
        "CAN_APPROVE",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>) {
        values
            .bind(input.role_id)
            .bind(input.menu_name.as_deref())
            .bind(input.menu_path.as_deref())
            .bind(input.parentid)
            .bind(input.can_view.unwrap_or(true))
            .bind(input.can_create.unwrap_or(false))
            .bind(input.can_edit.unwrap_or(false))
            .bind(input.can_delete.unwrap_or(false))
            .bind(input.can_approve.unwrap_or(false));
    }

    fn assign_update<'a>(input: &'a Self::Update, _actor: &'a str, set: &mut Assignments<'_, 'a>) {
        set.set("MENU_NAME", input.menu_name.as_deref())
            .set("MENU_PATH", nullable(&input.menu_path))
            .set("PARENTID", input.parentid)
            .set("CAN_VIEW", input.can_view)
            .set("CAN_CREATE", input.can_create)
            .set("CAN_EDIT", input.can_edit)
            .set("CAN_DELETE", input.can_delete)
            .set("CAN_APPROVE", input.can_approve);
    }

    fn order_by() -> &'static str {
        "ROLE_ID, ID"
    }
}

/// CapabilityNode
///
/// A capability with its nested children, as returned by GET /api/roles/{id}/capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CapabilityNode {
    #[serde(flatten)]
    pub capability: RoleCapability,
    #[serde(rename = "CHILDREN")]
    #[schema(no_recursion)]
    pub children: Vec<CapabilityNode>,
}
