#![allow(dead_code)]

use async_trait::async_trait;
use backoffice_api::{
    AppConfig, AppState, RepoError,
    audit::Actor,
    auth::AuthUser,
    models::{AuditLog, AuditLogFilter, DashboardStats, RoleCapability, SystemUser},
    repository::{Repository, RepositoryState, ResourceRepository},
    resource::Resource,
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

// --- MOCK REPOSITORY IMPLEMENTATION ---

/// Failure injected into the next repository call.
#[derive(Debug, Clone)]
pub enum MockFailure {
    NotFound,
    Conflict(&'static str),
    InvalidReference,
    InUse,
    Database,
}

impl MockFailure {
    fn into_error(self) -> RepoError {
        match self {
            MockFailure::NotFound => RepoError::NotFound,
            MockFailure::Conflict(constraint) => RepoError::Conflict {
                constraint: constraint.to_string(),
            },
            MockFailure::InvalidReference => RepoError::InvalidReference {
                constraint: "fk".to_string(),
            },
            MockFailure::InUse => RepoError::InUse {
                constraint: "fk".to_string(),
            },
            MockFailure::Database => RepoError::Database(sqlx::Error::PoolTimedOut),
        }
    }
}

/// In-memory stand-in for the Postgres repository.
///
/// Rows are kept as their JSON form per table. A create overlays the payload on
/// the first seeded row of the table, so tests seed one template row per table
/// they create into.
#[derive(Default)]
pub struct MockRepo {
    rows: Mutex<HashMap<&'static str, Vec<Value>>>,
    next_id: Mutex<i64>,
    fail_next: Mutex<Option<MockFailure>>,
    /// Number of create/update/delete calls that reached the repository.
    pub writes: AtomicUsize,
    pub audit_logs: Vec<AuditLog>,
    pub stats: DashboardStats,
}

impl MockRepo {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1000),
            ..Self::default()
        }
    }

    pub fn with_rows<R: Resource>(self, rows: Vec<R>) -> Self {
        let values = rows
            .iter()
            .map(|row| serde_json::to_value(row).unwrap())
            .collect::<Vec<_>>();
        self.rows.lock().unwrap().entry(R::TABLE).or_default().extend(values);
        self
    }

    pub fn fail_next(&self, failure: MockFailure) {
        *self.fail_next.lock().unwrap() = Some(failure);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stored<R: Resource>(&self) -> Vec<R> {
        self.rows
            .lock()
            .unwrap()
            .get(R::TABLE)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|value| serde_json::from_value(value).unwrap())
            .collect()
    }

    fn take_failure(&self) -> Result<(), RepoError> {
        match self.fail_next.lock().unwrap().take() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

/// Copies the fields of `patch` onto `target`. Create payloads serialize absent
/// fields as null, so nulls are only applied for updates, where they mean "clear".
fn overlay(target: &mut Value, patch: Value, apply_nulls: bool) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            if apply_nulls || !value.is_null() {
                target.insert(key, value);
            }
        }
    }
}

fn row_id(value: &Value) -> Option<i64> {
    value.get("ID").and_then(Value::as_i64)
}

#[async_trait]
impl<R: Resource> ResourceRepository<R> for MockRepo {
    async fn list(&self) -> Result<Vec<R>, RepoError> {
        self.take_failure()?;
        Ok(self.stored::<R>())
    }

    async fn find(&self, id: i64) -> Result<R, RepoError> {
        self.take_failure()?;
        self.stored::<R>()
            .into_iter()
            .find(|row| row.id() == id)
            .ok_or(RepoError::NotFound)
    }

    async fn first(&self) -> Result<R, RepoError> {
        self.take_failure()?;
        self.stored::<R>()
            .into_iter()
            .min_by_key(|row| row.id())
            .ok_or(RepoError::NotFound)
    }

    async fn create(&self, actor: &Actor, input: R::Create) -> Result<R, RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut rows = self.rows.lock().unwrap();
        let table = rows.entry(R::TABLE).or_default();
        let mut row = table.first().cloned().unwrap_or_else(|| json!({}));

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        overlay(&mut row, serde_json::to_value(&input)?, false);
        overlay(
            &mut row,
            json!({ "ID": id, "INSERTUSER": actor.user_name, "UPDATEUSER": actor.user_name }),
            false,
        );

        let created: R = serde_json::from_value(row.clone())?;
        table.push(row);
        Ok(created)
    }

    async fn update(&self, actor: &Actor, id: i64, input: R::Update) -> Result<R, RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(R::TABLE)
            .and_then(|table| table.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or(RepoError::NotFound)?;

        overlay(row, serde_json::to_value(&input)?, true);
        overlay(row, json!({ "UPDATEUSER": actor.user_name }), false);
        Ok(serde_json::from_value(row.clone())?)
    }

    async fn delete(&self, _actor: &Actor, id: i64) -> Result<R, RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut rows = self.rows.lock().unwrap();
        let table = rows.get_mut(R::TABLE).ok_or(RepoError::NotFound)?;
        let position = table
            .iter()
            .position(|row| row_id(row) == Some(id))
            .ok_or(RepoError::NotFound)?;
        Ok(serde_json::from_value(table.remove(position))?)
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn list_role_capabilities(&self, role_id: i64) -> Result<Vec<RoleCapability>, RepoError> {
        self.take_failure()?;
        Ok(self
            .stored::<RoleCapability>()
            .into_iter()
            .filter(|capability| capability.role_id == role_id)
            .collect())
    }

    async fn list_audit_logs(&self, filter: AuditLogFilter) -> Result<Vec<AuditLog>, RepoError> {
        self.take_failure()?;
        let limit = filter.effective_limit() as usize;
        Ok(self.audit_logs.iter().take(limit).cloned().collect())
    }

    async fn get_stats(&self) -> Result<DashboardStats, RepoError> {
        self.take_failure()?;
        Ok(self.stats.clone())
    }
}

// --- FIXTURES ---

pub fn operator() -> SystemUser {
    SystemUser {
        id: 7,
        full_name: "Abebe Kebede".to_string(),
        email: "abebe@example.com".to_string(),
        phone_number: "+251911000000".to_string(),
        role_id: Some(1),
        status: "Approved".to_string(),
        ..SystemUser::default()
    }
}

pub fn auth_user() -> AuthUser {
    AuthUser {
        id: 7,
        name: "Abebe Kebede".to_string(),
        role_id: Some(1),
        request_id: None,
    }
}

pub fn state_with(repo: MockRepo) -> (AppState, Arc<MockRepo>) {
    let repo = Arc::new(repo);
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: AppConfig::default(),
    };
    (state, repo)
}
