use crate::{
    AppState, handlers,
    models::{
        AllowedCompany, ArifpayEndpoint, Branch, Merchant, MerchantUser, Role, RoleCapability,
        StreamPaySetting, SystemUser, UssdPushSetting,
    },
    repository::{Repository, ResourceRepository},
    resource::Resource,
};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Every route below is nested under `/api` and sits behind the `AuthUser`
/// middleware: a request without a resolvable system user never reaches a handler.
///
/// Each entity table exposes the same five verbs through the generic handlers;
/// the workflow endpoints (approval, unlock, capability tree) are added on top.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The system user behind the session.
        .route("/me", get(handlers::get_me))
        // --- Merchants & Branches ---
        .merge(resource_routes::<Merchant>("/merchants"))
        .merge(resource_routes::<Branch>("/branches"))
        // --- Companies ---
        // PUT /companies/{id}/approval
        // Approve or reject a company; stamps APPROVED_BY with the caller.
        .merge(resource_routes::<AllowedCompany>("/companies"))
        .route("/companies/{id}/approval", put(handlers::approve_company))
        // --- Back-office users, roles and their menu capabilities ---
        .merge(resource_routes::<SystemUser>("/system-users"))
        .merge(resource_routes::<Role>("/roles"))
        // GET /roles/{id}/capabilities
        // The role's capabilities as a PARENTID tree.
        .route("/roles/{id}/capabilities", get(handlers::role_capability_tree))
        .merge(resource_routes::<RoleCapability>("/role-capabilities"))
        // --- Payment integrations ---
        .merge(resource_routes::<ArifpayEndpoint>("/arifpay-endpoints"))
        .merge(settings_routes::<StreamPaySetting>("/stream-pay-settings"))
        .merge(settings_routes::<UssdPushSetting>("/ussd-push-settings"))
        // --- Merchant users ---
        // PUT /merchant-users/{id}/unlock
        // Resets FAILED_ATTEMPTS and IS_LOCKED.
        .merge(resource_routes::<MerchantUser>("/merchant-users"))
        .route("/merchant-users/{id}/unlock", put(handlers::unlock_merchant_user))
        // --- Oversight ---
        .route("/audit-logs", get(handlers::list_audit_logs))
        .route("/dashboard/stats", get(handlers::dashboard_stats))
}

/// `GET|POST <base>` and `GET|PUT|DELETE <base>/{id}` for one entity table.
fn resource_routes<R>(base: &str) -> Router<AppState>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    Router::new()
        .route(base, get(handlers::list::<R>).post(handlers::create::<R>))
        .route(
            &format!("{base}/{{id}}"),
            get(handlers::find::<R>)
                .put(handlers::update::<R>)
                .delete(handlers::delete::<R>),
        )
}

/// Single-configuration tables: `GET <base>` returns the active row instead of a list.
fn settings_routes<R>(base: &str) -> Router<AppState>
where
    R: Resource,
    dyn Repository: ResourceRepository<R>,
{
    Router::new()
        .route(base, get(handlers::current::<R>).post(handlers::create::<R>))
        .route(
            &format!("{base}/{{id}}"),
            put(handlers::update::<R>).delete(handlers::delete::<R>),
        )
}
