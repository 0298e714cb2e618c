//! In-memory registry and tenant schemas with the same write semantics as
//! the Postgres store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::StoreError;
use crate::reconcile::plan::{FieldSet, Scope, StatusFilter};
use crate::reconcile::store::{RegistrySource, TenantDirectory, UpdateResult, UpsertResult};
use crate::registry::repo_types::{RegistryUser, TenantRecord, ACTIVE_STATUS};
use crate::tenants::repo_types::TenantUser;
use crate::tenants::schema::TenantSchema;

#[derive(Default)]
struct Inner {
    tenants: Vec<TenantRecord>,
    registry: Vec<RegistryUser>,
    // provisioned schemas only
    schemas: BTreeMap<String, BTreeMap<String, TenantUser>>,
    registry_down: bool,
    next_id: u128,
}

impl Inner {
    // registry ids increase with insertion so id order is predictable
    fn next_id(&mut self) -> Uuid {
        self.next_id += 1;
        Uuid::from_u128(self.next_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether any `fields` update column differs between the rows.
fn differs(row: &TenantUser, user: &RegistryUser, fields: FieldSet) -> bool {
    match fields {
        FieldSet::Credential => row.password_hash != user.password_hash,
        FieldSet::All => {
            row.password_hash != user.password_hash
                || row.full_name != user.full_name
                || row.email != user.email
                || row.role != user.role
                || row.status != user.status
                || row.last_login != user.last_login
        }
    }
}

fn apply_update(row: &mut TenantUser, user: &RegistryUser, fields: FieldSet) {
    row.password_hash = user.password_hash.clone();
    if fields == FieldSet::All {
        row.full_name = user.full_name.clone();
        row.email = user.email.clone();
        row.role = user.role.clone();
        row.status = user.status.clone();
        row.last_login = user.last_login;
    }
    row.updated_at = Some(OffsetDateTime::now_utc());
}

fn new_row(user: &RegistryUser, fields: FieldSet) -> TenantUser {
    let all = fields == FieldSet::All;
    TenantUser {
        id: Uuid::new_v4(),
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        full_name: user.full_name.clone().filter(|_| all),
        email: user.email.clone().filter(|_| all),
        role: user.role.clone().filter(|_| all),
        status: user.status.clone(),
        created_at: user.created_at,
        last_login: user.last_login.filter(|_| all),
        updated_at: None,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, schema_name: &str, provisioned: bool) -> Uuid {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        inner.tenants.push(TenantRecord {
            id,
            schema_name: schema_name.to_string(),
        });
        if provisioned {
            inner.schemas.insert(schema_name.to_string(), BTreeMap::new());
        }
        id
    }

    /// Registers a tenant whose schema exists.
    pub fn add_tenant(&self, schema_name: &str) -> Uuid {
        self.register(schema_name, true)
    }

    /// Registers a tenant whose schema was never created.
    pub fn add_unprovisioned_tenant(&self, schema_name: &str) -> Uuid {
        self.register(schema_name, false)
    }

    pub fn add_user(&self, tenant_id: Uuid, username: &str, hash: &str, status: &str) -> RegistryUser {
        let mut inner = self.inner.lock().unwrap();
        let schema_name = inner
            .tenants
            .iter()
            .find(|t| t.id == tenant_id)
            .map(|t| t.schema_name.clone())
            .expect("tenant registered");
        let user = RegistryUser {
            id: inner.next_id(),
            tenant_id,
            username: username.to_string(),
            password_hash: hash.to_string(),
            full_name: Some(capitalize(username)),
            email: Some(format!("{username}@example.com")),
            role: Some("member".into()),
            status: status.to_string(),
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
            schema_name,
        };
        inner.registry.push(user.clone());
        user
    }

    pub fn edit_registry_user(&self, username: &str, edit: impl FnOnce(&mut RegistryUser)) {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .registry
            .iter_mut()
            .find(|u| u.username == username)
            .expect("registry user exists");
        edit(user);
    }

    pub fn remove_registry_user(&self, username: &str) {
        self.inner
            .lock()
            .unwrap()
            .registry
            .retain(|u| u.username != username);
    }

    /// Places a row directly into a tenant schema, bypassing the registry.
    pub fn seed_tenant_user(&self, schema_name: &str, username: &str, hash: &str) {
        let mut inner = self.inner.lock().unwrap();
        let table = inner.schemas.get_mut(schema_name).expect("schema provisioned");
        table.insert(
            username.to_string(),
            TenantUser {
                id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: hash.to_string(),
                full_name: None,
                email: None,
                role: None,
                status: ACTIVE_STATUS.into(),
                created_at: OffsetDateTime::now_utc(),
                last_login: None,
                updated_at: None,
            },
        );
    }

    pub fn set_registry_down(&self, down: bool) {
        self.inner.lock().unwrap().registry_down = down;
    }

    pub fn tenant_user(&self, schema_name: &str, username: &str) -> Option<TenantUser> {
        let inner = self.inner.lock().unwrap();
        inner.schemas.get(schema_name)?.get(username).cloned()
    }

    /// Rows of one schema ordered by username.
    pub fn tenant_users(&self, schema_name: &str) -> Vec<TenantUser> {
        let inner = self.inner.lock().unwrap();
        inner
            .schemas
            .get(schema_name)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    fn with_table<T>(
        &self,
        schema: &TenantSchema,
        f: impl FnOnce(&mut BTreeMap<String, TenantUser>) -> T,
    ) -> Result<T, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let table = inner.schemas.get_mut(schema.as_str()).ok_or_else(|| {
            StoreError::Backend(format!("schema \"{schema}\" does not exist"))
        })?;
        Ok(f(table))
    }
}

#[async_trait]
impl RegistrySource for MemoryStore {
    async fn tenants(&self) -> Result<Vec<TenantRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.registry_down {
            return Err(StoreError::Backend("connection refused".into()));
        }
        Ok(inner.tenants.clone())
    }

    async fn candidates(
        &self,
        filter: StatusFilter,
        scope: &Scope,
    ) -> Result<Vec<RegistryUser>, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.registry_down {
            return Err(StoreError::Backend("connection refused".into()));
        }
        let mut rows: Vec<RegistryUser> = inner
            .registry
            .iter()
            .filter(|u| filter == StatusFilter::Any || u.is_active())
            .filter(|u| scope.username().map_or(true, |name| u.username == name))
            .cloned()
            .collect();
        rows.sort_by_key(|u| u.id);
        Ok(rows)
    }
}

#[async_trait]
impl TenantDirectory for MemoryStore {
    async fn find_user(
        &self,
        schema: &TenantSchema,
        username: &str,
    ) -> Result<Option<TenantUser>, StoreError> {
        self.with_table(schema, |table| table.get(username).cloned())
    }

    async fn upsert_user(
        &self,
        schema: &TenantSchema,
        user: &RegistryUser,
        insert: FieldSet,
        update: Option<FieldSet>,
    ) -> Result<UpsertResult, StoreError> {
        self.with_table(schema, |table| match table.get_mut(&user.username) {
            None => {
                table.insert(user.username.clone(), new_row(user, insert));
                UpsertResult::Inserted
            }
            Some(row) => match update {
                Some(fields) => {
                    if differs(row, user, fields) {
                        apply_update(row, user, fields);
                        UpsertResult::Updated
                    } else {
                        UpsertResult::Untouched
                    }
                }
                None => UpsertResult::Untouched,
            },
        })
    }

    async fn update_user(
        &self,
        schema: &TenantSchema,
        user: &RegistryUser,
        fields: FieldSet,
    ) -> Result<UpdateResult, StoreError> {
        self.with_table(schema, |table| match table.get_mut(&user.username) {
            None => UpdateResult::NotFound,
            Some(row) => {
                if differs(row, user, fields) {
                    apply_update(row, user, fields);
                    UpdateResult::Updated
                } else {
                    UpdateResult::Unchanged
                }
            }
        })
    }
}
