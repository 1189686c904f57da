use crate::{
    AppState,
    auth::AuthUser,
    errors::AppError,
    models::{
        AllowedCompany, ApprovalRequest, AuditLog, AuditLogFilter, CapabilityNode, DashboardStats,
        MerchantUser, Role, SystemUser, UpdateCompanyRequest, UpdateMerchantUserRequest,
    },
    permissions::capability_tree,
    repository::{Repository, ResourceRepository},
    resource::Resource,
    validation::Validate,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};

// --- Generic entity handlers ---
//
// One set of handlers serves every audited table; routes instantiate them per
// resource (`list::<Merchant>`). Validation runs before the repository is touched.

/// list
///
/// [Authenticated Route] All rows of the table, in the resource's list order.
pub async fn list<R>(State(state): State<AppState>) -> Result<Json<Vec<R>>, AppError>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    let rows = ResourceRepository::<R>::list(state.repo.as_ref())
        .await
        .map_err(AppError::from_repo::<R>)?;
    Ok(Json(rows))
}

/// find
///
/// [Authenticated Route] One row by id, 404 "<Label> not found" otherwise.
pub async fn find<R>(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<R>, AppError>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    let Path(id) = id?;
    let row = ResourceRepository::<R>::find(state.repo.as_ref(), id)
        .await
        .map_err(AppError::from_repo::<R>)?;
    Ok(Json(row))
}

/// create
///
/// [Authenticated Route] Validates the payload, then inserts the row and its
/// `CREATE` audit entry in one transaction. Responds 201 with the stored row.
pub async fn create<R>(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<R::Create>, JsonRejection>,
) -> Result<(StatusCode, Json<R>), AppError>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    let Json(input) = payload?;
    input.validate()?;

    let row = ResourceRepository::<R>::create(state.repo.as_ref(), &user.actor(), input)
        .await
        .map_err(AppError::from_repo::<R>)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// update
///
/// [Authenticated Route] Partial update with an `UPDATE` audit entry carrying
/// both snapshots. A missing id is a 404 and leaves no audit trace.
pub async fn update<R>(
    user: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<R::Update>, JsonRejection>,
) -> Result<Json<R>, AppError>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    let Path(id) = id?;
    let Json(input) = payload?;
    input.validate()?;

    let row = ResourceRepository::<R>::update(state.repo.as_ref(), &user.actor(), id, input)
        .await
        .map_err(AppError::from_repo::<R>)?;
    Ok(Json(row))
}

/// delete
///
/// [Authenticated Route] Deletes the row and records a `DELETE` audit entry with
/// the old snapshot. Responds 200 with the deleted row.
pub async fn delete<R>(
    user: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<R>, AppError>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    let Path(id) = id?;
    let row = ResourceRepository::<R>::delete(state.repo.as_ref(), &user.actor(), id)
        .await
        .map_err(AppError::from_repo::<R>)?;
    Ok(Json(row))
}

/// current
///
/// [Authenticated Route] The active row of a single-configuration table (the
/// lowest `ID`). An empty table is a 404 rather than an empty body.
pub async fn current<R>(State(state): State<AppState>) -> Result<Json<R>, AppError>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    let row = ResourceRepository::<R>::first(state.repo.as_ref())
        .await
        .map_err(AppError::from_repo::<R>)?;
    Ok(Json(row))
}

// --- Workflow handlers ---

/// approve_company
///
/// [Authenticated Route] Moves a company through the approval workflow. Sets
/// `STATUS`, derives `APPROVED` from it and stamps `APPROVED_BY` with the caller.
#[utoipa::path(
    put,
    path = "/api/companies/{id}/approval",
    params(("id" = i64, Path, description = "Company id")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Updated company", body = AllowedCompany),
        (status = 400, description = "Missing or unknown STATUS"),
        (status = 404, description = "Company not found")
    )
)]
pub async fn approve_company(
    user: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ApprovalRequest>, JsonRejection>,
) -> Result<Json<AllowedCompany>, AppError> {
    let Path(id) = id?;
    let Json(approval) = payload?;
    approval.validate()?;

    let company = ResourceRepository::<AllowedCompany>::update(
        state.repo.as_ref(),
        &user.actor(),
        id,
        UpdateCompanyRequest::from(approval),
    )
    .await
    .map_err(AppError::from_repo::<AllowedCompany>)?;

    tracing::info!(company_id = id, status = %company.status, approver = %user.name, "company approval changed");
    Ok(Json(company))
}

/// unlock_merchant_user
///
/// [Authenticated Route] Clears the failed-attempt counter and the lock flag.
#[utoipa::path(
    put,
    path = "/api/merchant-users/{id}/unlock",
    params(("id" = i64, Path, description = "Merchant user id")),
    responses(
        (status = 200, description = "Unlocked merchant user", body = MerchantUser),
        (status = 404, description = "Merchant user not found")
    )
)]
pub async fn unlock_merchant_user(
    user: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MerchantUser>, AppError> {
    let Path(id) = id?;
    let merchant_user = ResourceRepository::<MerchantUser>::update(
        state.repo.as_ref(),
        &user.actor(),
        id,
        UpdateMerchantUserRequest::unlock(),
    )
    .await
    .map_err(AppError::from_repo::<MerchantUser>)?;
    Ok(Json(merchant_user))
}

/// role_capability_tree
///
/// [Authenticated Route] The role's capabilities nested by `PARENTID`.
#[utoipa::path(
    get,
    path = "/api/roles/{id}/capabilities",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Capability tree", body = [CapabilityNode]),
        (status = 404, description = "Role not found")
    )
)]
pub async fn role_capability_tree(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<CapabilityNode>>, AppError> {
    let Path(role_id) = id?;

    // Distinguishes an unknown role from a role without capabilities.
    ResourceRepository::<Role>::find(state.repo.as_ref(), role_id)
        .await
        .map_err(AppError::from_repo::<Role>)?;

    let rows = state.repo.list_role_capabilities(role_id).await?;
    Ok(Json(capability_tree(rows)))
}

// --- Read-only views ---

/// get_me
///
/// [Authenticated Route] The system user behind the session.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = SystemUser),
        (status = 401, description = "No resolvable user")
    )
)]
pub async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SystemUser>, AppError> {
    let me = ResourceRepository::<SystemUser>::find(state.repo.as_ref(), user.id)
        .await
        .map_err(AppError::from_repo::<SystemUser>)?;
    Ok(Json(me))
}

/// list_audit_logs
///
/// [Authenticated Route] Audit entries newest first, optionally narrowed to one
/// table or record.
#[utoipa::path(
    get,
    path = "/api/audit-logs",
    params(AuditLogFilter),
    responses((status = 200, description = "Audit entries", body = [AuditLog]))
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    filter: Result<Query<AuditLogFilter>, QueryRejection>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let Query(filter) = filter?;
    let logs = state.repo.list_audit_logs(filter).await?;
    Ok(Json(logs))
}

/// dashboard_stats
///
/// [Authenticated Route] Counters for the dashboard landing page.
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses((status = 200, description = "Dashboard counters", body = DashboardStats))
)]
pub async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = state.repo.get_stats().await?;
    Ok(Json(stats))
}
