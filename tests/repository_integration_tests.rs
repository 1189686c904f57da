//! Postgres-backed checks of the write path. Run with a disposable database:
//! `DATABASE_URL=… cargo test --test repository_integration_tests -- --ignored`.

use backoffice_api::{
    AppError, RepoError,
    audit::Actor,
    models::{
        AllowedCompany, ApprovalRequest, AuditLogFilter, Branch, CreateBranchRequest,
        CreateCompanyRequest, CreateMerchantRequest, CreateRoleCapabilityRequest,
        CreateRoleRequest, CreateStreamPaySettingRequest, CreateSystemUserRequest, Merchant, Role,
        RoleCapability, StreamPaySetting, SystemUser, UpdateCompanyRequest, UpdateMerchantRequest, UpdateRoleCapabilityRequest,
    },
    repository::{PostgresRepository, Repository, ResourceRepository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }

    async fn audit_rows(&self, table: &str, record_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE table_name = $1 AND record_id = $2")
            .bind(table)
            .bind(record_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count audit rows")
    }

    async fn audit_actions(&self, table: &str, record_id: i64) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT action FROM audit_log WHERE table_name = $1 AND record_id = $2 ORDER BY id",
        )
        .bind(table)
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .expect("Failed to read audit actions")
    }

    async fn total_audit_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count audit rows")
    }
}

// --- Test Data Helpers ---

fn actor() -> Actor {
    Actor {
        user_id: 7,
        user_name: "Abebe Kebede".to_string(),
        request_id: Some(Uuid::new_v4()),
    }
}

/// Codes carry a random suffix so reruns against the same database never collide.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn merchant_request(code: &str) -> CreateMerchantRequest {
    CreateMerchantRequest {
        merchant_name: Some("Abyssinia Coffee".to_string()),
        merchant_code: Some(code.to_string()),
        ..CreateMerchantRequest::default()
    }
}

async fn create_merchant(repo: &PostgresRepository, code: &str) -> Merchant {
    ResourceRepository::<Merchant>::create(repo, &actor(), merchant_request(code))
        .await
        .expect("Failed to create merchant")
}

async fn create_branch(repo: &PostgresRepository, merchant_id: i64) -> Branch {
    ResourceRepository::<Branch>::create(
        repo,
        &actor(),
        CreateBranchRequest {
            merchant_id: Some(merchant_id),
            branch_name: Some("Bole".to_string()),
            branch_code: Some(unique("BR")),
            ..CreateBranchRequest::default()
        },
    )
    .await
    .expect("Failed to create branch")
}

async fn create_role(repo: &PostgresRepository) -> Role {
    ResourceRepository::<Role>::create(
        repo,
        &actor(),
        CreateRoleRequest {
            role_name: Some(unique("Operations")),
            description: None,
        },
    )
    .await
    .expect("Failed to create role")
}

async fn create_capability(
    repo: &PostgresRepository,
    role_id: i64,
    parent: Option<i64>,
) -> RoleCapability {
    ResourceRepository::<RoleCapability>::create(
        repo,
        &actor(),
        CreateRoleCapabilityRequest {
            role_id: Some(role_id),
            menu_name: Some("Merchants".to_string()),
            parentid: parent,
            ..CreateRoleCapabilityRequest::default()
        },
    )
    .await
    .expect("Failed to create capability")
}

/// Digits only, so the value passes the phone rule and stays unique across runs.
fn unique_phone() -> String {
    let digits: String = Uuid::new_v4()
        .as_u128()
        .to_string()
        .chars()
        .take(9)
        .collect();
    format!("+251{digits}")
}

fn system_user_request(email: &str, phone: &str) -> CreateSystemUserRequest {
    CreateSystemUserRequest {
        full_name: Some("Hana Tesfaye".to_string()),
        email: Some(email.to_string()),
        phone_number: Some(phone.to_string()),
        ..CreateSystemUserRequest::default()
    }
}

/// Audit rows whose snapshot carries this e-mail address.
async fn system_user_audit_rows(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log WHERE table_name = 'system_users' \
         AND (new_value ->> 'EMAIL' = $1 OR old_value ->> 'EMAIL' = $1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("Failed to count audit rows")
}

// --- Tests ---

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_writes_exactly_one_audit_row() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let merchant = create_merchant(&repo, &unique("AUD")).await;
    assert_eq!(merchant.status, "Pending");
    assert_eq!(merchant.audit.insertuser.as_deref(), Some("Abebe Kebede"));

    let logs = repo
        .list_audit_logs(AuditLogFilter {
            table_name: Some("merchants".to_string()),
            record_id: Some(merchant.id),
            limit: None,
        })
        .await
        .unwrap();

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "CREATE");
    assert_eq!(logs[0].user_id, 7);
    assert!(logs[0].old_value.is_none());
    assert_eq!(logs[0].new_value.as_ref().unwrap()["ID"], merchant.id);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_records_before_and_after_snapshots() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let merchant = create_merchant(&repo, &unique("UPD")).await;

    let updated = ResourceRepository::<Merchant>::update(
        &repo,
        &actor(),
        merchant.id,
        UpdateMerchantRequest {
            email: Some(Some("ops@abyssinia.et".to_string())),
            ..UpdateMerchantRequest::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.email.as_deref(), Some("ops@abyssinia.et"));
    assert_eq!(updated.merchant_name, merchant.merchant_name);

    let logs = repo
        .list_audit_logs(AuditLogFilter {
            table_name: Some("merchants".to_string()),
            record_id: Some(merchant.id),
            limit: None,
        })
        .await
        .unwrap();

    // Newest first.
    assert_eq!(logs[0].action, "UPDATE");
    assert!(logs[0].old_value.as_ref().unwrap()["EMAIL"].is_null());
    assert_eq!(logs[0].new_value.as_ref().unwrap()["EMAIL"], "ops@abyssinia.et");
    assert_eq!(logs[1].action, "CREATE");
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_missing_row_is_not_found_and_unaudited() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let before = ctx.total_audit_rows().await;

    let update = ResourceRepository::<Merchant>::update(
        &repo,
        &actor(),
        i64::MAX,
        UpdateMerchantRequest::default(),
    )
    .await;
    assert!(matches!(update, Err(RepoError::NotFound)));

    let delete = ResourceRepository::<Merchant>::delete(&repo, &actor(), i64::MAX).await;
    assert!(matches!(delete, Err(RepoError::NotFound)));

    let find = ResourceRepository::<Merchant>::find(&repo, i64::MAX).await;
    assert!(matches!(find, Err(RepoError::NotFound)));

    assert_eq!(ctx.total_audit_rows().await, before);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_code_rolls_back_without_audit() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let code = unique("DUP");
    create_merchant(&repo, &code).await;
    let before = ctx.total_audit_rows().await;

    let result = ResourceRepository::<Merchant>::create(&repo, &actor(), merchant_request(&code)).await;

    match result {
        Err(RepoError::Conflict { constraint }) => {
            assert_eq!(constraint, "merchants_merchant_code_key")
        }
        other => panic!("expected a conflict, got {other:?}"),
    }
    assert_eq!(ctx.total_audit_rows().await, before);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM merchants WHERE MERCHANT_CODE = $1")
        .bind(&code)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_branch_for_unknown_merchant_is_invalid_reference() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let before = ctx.total_audit_rows().await;

    let result = ResourceRepository::<Branch>::create(
        &repo,
        &actor(),
        CreateBranchRequest {
            merchant_id: Some(i64::MAX),
            branch_name: Some("Bole".to_string()),
            branch_code: Some(unique("BR")),
            ..CreateBranchRequest::default()
        },
    )
    .await;

    assert!(matches!(result, Err(RepoError::InvalidReference { .. })));
    assert_eq!(ctx.total_audit_rows().await, before);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_company_approval_stamps_approver() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let company = ResourceRepository::<AllowedCompany>::create(
        &repo,
        &actor(),
        CreateCompanyRequest {
            company_name: Some("Ethio Fuel".to_string()),
            short_code: Some(unique("EF")),
            description: None,
        },
    )
    .await
    .unwrap();
    assert!(!company.approved);
    assert_eq!(company.status, "Pending");

    let approved = ResourceRepository::<AllowedCompany>::update(
        &repo,
        &actor(),
        company.id,
        UpdateCompanyRequest::from(ApprovalRequest {
            status: Some("Approved".to_string()),
        }),
    )
    .await
    .unwrap();

    assert!(approved.approved);
    assert_eq!(approved.status, "Approved");
    assert_eq!(approved.approved_by.as_deref(), Some("Abebe Kebede"));
    assert_eq!(ctx.audit_rows("allowed_companies", company.id).await, 2);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_returns_row_and_audits_old_snapshot() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let merchant = create_merchant(&repo, &unique("DEL")).await;

    let deleted = ResourceRepository::<Merchant>::delete(&repo, &actor(), merchant.id)
        .await
        .unwrap();
    assert_eq!(deleted.id, merchant.id);

    let logs = repo
        .list_audit_logs(AuditLogFilter {
            table_name: Some("merchants".to_string()),
            record_id: Some(merchant.id),
            limit: Some(1),
        })
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "DELETE");
    assert!(logs[0].new_value.is_none());
    assert_eq!(
        logs[0].old_value.as_ref().unwrap()["MERCHANT_CODE"],
        merchant.merchant_code
    );
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_merchant_with_branches_cannot_be_deleted() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let merchant = create_merchant(&repo, &unique("PAR")).await;
    let branch = create_branch(&repo, merchant.id).await;

    let result = ResourceRepository::<Merchant>::delete(&repo, &actor(), merchant.id).await;
    assert!(matches!(result, Err(RepoError::InUse { .. })));

    let message = AppError::from_repo::<Merchant>(result.unwrap_err()).to_string();
    assert_eq!(message, "Merchant is still referenced by other records");

    // Nothing changed on either side, and nothing was audited beyond the creates.
    let still_there = ResourceRepository::<Branch>::find(&repo, branch.id).await.unwrap();
    assert_eq!(still_there.merchant_id, merchant.id);
    assert!(ResourceRepository::<Merchant>::find(&repo, merchant.id).await.is_ok());
    assert_eq!(ctx.audit_actions("merchant_branches", branch.id).await, vec!["CREATE"]);
    assert_eq!(ctx.audit_actions("merchants", merchant.id).await, vec!["CREATE"]);

    // Once the dependents are gone, the parent can go too.
    ResourceRepository::<Branch>::delete(&repo, &actor(), branch.id).await.unwrap();
    ResourceRepository::<Merchant>::delete(&repo, &actor(), merchant.id).await.unwrap();
    assert_eq!(
        ctx.audit_actions("merchant_branches", branch.id).await,
        vec!["CREATE", "DELETE"]
    );
    assert_eq!(
        ctx.audit_actions("merchants", merchant.id).await,
        vec!["CREATE", "DELETE"]
    );
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_role_and_parent_capability_with_dependents_cannot_be_deleted() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let role = create_role(&repo).await;
    let parent = create_capability(&repo, role.id, None).await;
    let child = create_capability(&repo, role.id, Some(parent.id)).await;

    let result = ResourceRepository::<Role>::delete(&repo, &actor(), role.id).await;
    assert!(matches!(result, Err(RepoError::InUse { .. })));

    let result = ResourceRepository::<RoleCapability>::delete(&repo, &actor(), parent.id).await;
    assert!(matches!(result, Err(RepoError::InUse { .. })));

    let child_now = ResourceRepository::<RoleCapability>::find(&repo, child.id).await.unwrap();
    assert_eq!(child_now.parentid, Some(parent.id));
    assert_eq!(ctx.audit_actions("role_capablities", child.id).await, vec!["CREATE"]);
    assert_eq!(ctx.audit_actions("role_capablities", parent.id).await, vec!["CREATE"]);
    assert_eq!(ctx.audit_actions("roles", role.id).await, vec!["CREATE"]);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_explicit_null_moves_capability_to_root() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let role = create_role(&repo).await;
    let parent = create_capability(&repo, role.id, None).await;
    let child = create_capability(&repo, role.id, Some(parent.id)).await;

    let request: UpdateRoleCapabilityRequest =
        serde_json::from_str(r#"{ "PARENTID": null }"#).unwrap();
    let moved = ResourceRepository::<RoleCapability>::update(&repo, &actor(), child.id, request)
        .await
        .unwrap();
    assert_eq!(moved.parentid, None);
    assert_eq!(moved.menu_name, child.menu_name);

    let logs = repo
        .list_audit_logs(AuditLogFilter {
            table_name: Some("role_capablities".to_string()),
            record_id: Some(child.id),
            limit: Some(1),
        })
        .await
        .unwrap();
    assert_eq!(logs[0].action, "UPDATE");
    assert_eq!(logs[0].old_value.as_ref().unwrap()["PARENTID"], parent.id);
    assert!(logs[0].new_value.as_ref().unwrap()["PARENTID"].is_null());

    // With the child detached, the former parent is free to go.
    ResourceRepository::<RoleCapability>::delete(&repo, &actor(), parent.id)
        .await
        .unwrap();
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_system_user_email_is_conflict_without_trace() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let email = format!("{}@backoffice.et", unique("ops"));
    ResourceRepository::<SystemUser>::create(
        &repo,
        &actor(),
        system_user_request(&email, &unique_phone()),
    )
    .await
    .unwrap();

    let result = ResourceRepository::<SystemUser>::create(
        &repo,
        &actor(),
        system_user_request(&email, &unique_phone()),
    )
    .await;

    let err = AppError::from_repo::<SystemUser>(result.unwrap_err());
    assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    assert_eq!(err.to_string(), "Email is already registered");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM system_users WHERE EMAIL = $1")
        .bind(&email)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(system_user_audit_rows(&ctx.pool, &email).await, 1);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_system_user_phone_is_conflict_without_trace() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let phone = unique_phone();
    let first_email = format!("{}@backoffice.et", unique("first"));
    let second_email = format!("{}@backoffice.et", unique("second"));
    ResourceRepository::<SystemUser>::create(
        &repo,
        &actor(),
        system_user_request(&first_email, &phone),
    )
    .await
    .unwrap();

    let result = ResourceRepository::<SystemUser>::create(
        &repo,
        &actor(),
        system_user_request(&second_email, &phone),
    )
    .await;

    let err = AppError::from_repo::<SystemUser>(result.unwrap_err());
    assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    assert_eq!(err.to_string(), "Phone number is already registered");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM system_users WHERE PHONE_NUMBER = $1")
        .bind(&phone)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(system_user_audit_rows(&ctx.pool, &second_email).await, 0);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_first_setting_is_lowest_id() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let created = ResourceRepository::<StreamPaySetting>::create(
        &repo,
        &actor(),
        CreateStreamPaySettingRequest {
            base_url: Some("https://stream.example".to_string()),
            api_key: Some(unique("key")),
            secret_key: Some("s3cret".to_string()),
            ..CreateStreamPaySettingRequest::default()
        },
    )
    .await
    .unwrap();

    let lowest: i64 = sqlx::query_scalar("SELECT MIN(ID) FROM stream_pay_settings")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    let first = ResourceRepository::<StreamPaySetting>::first(&repo).await.unwrap();
    assert_eq!(first.id, lowest);
    assert!(first.id <= created.id);
}
