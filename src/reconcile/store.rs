use async_trait::async_trait;

use crate::db::StoreError;
use crate::reconcile::plan::{FieldSet, Scope, StatusFilter};
use crate::registry::repo_types::{RegistryUser, TenantRecord};
use crate::tenants::repo_types::TenantUser;
use crate::tenants::schema::TenantSchema;

/// Read side of the shared registry.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn tenants(&self) -> Result<Vec<TenantRecord>, StoreError>;

    /// Registry users joined with their tenant schema, ordered by user id.
    async fn candidates(
        &self,
        filter: StatusFilter,
        scope: &Scope,
    ) -> Result<Vec<RegistryUser>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    Inserted,
    Updated,
    Untouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    Updated,
    Unchanged,
    NotFound,
}

/// Per-tenant user tables. Every write is a single statement keyed by
/// username; nothing here deletes rows.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_user(
        &self,
        schema: &TenantSchema,
        username: &str,
    ) -> Result<Option<TenantUser>, StoreError>;

    /// Insert `insert` columns, or when the username exists and `update` is
    /// set, overwrite the `update` columns if any of them differ.
    async fn upsert_user(
        &self,
        schema: &TenantSchema,
        user: &RegistryUser,
        insert: FieldSet,
        update: Option<FieldSet>,
    ) -> Result<UpsertResult, StoreError>;

    async fn update_user(
        &self,
        schema: &TenantSchema,
        user: &RegistryUser,
        fields: FieldSet,
    ) -> Result<UpdateResult, StoreError>;
}

pub trait UserStore: RegistrySource + TenantDirectory {}

impl<T: RegistrySource + TenantDirectory> UserStore for T {}
