use async_trait::async_trait;
use tracing::debug;

use crate::db::{PgStore, StoreError};
use crate::reconcile::plan::{Scope, StatusFilter};
use crate::reconcile::store::RegistrySource;
use crate::registry::repo_types::{RegistryUser, TenantRecord, ACTIVE_STATUS};
use crate::tenants::schema::TenantSchema;

pub const REGISTRY_USERS_TABLE: &str = "users";
pub const REGISTRY_TENANTS_TABLE: &str = "tenants";

pub(crate) fn tenants_sql(registry: &TenantSchema) -> String {
    format!(
        r#"
        SELECT id, schema_name
        FROM {tenants}
        ORDER BY schema_name
        "#,
        tenants = registry.qualify(REGISTRY_TENANTS_TABLE),
    )
}

/// `$1` is the status filter (NULL = any), `$2` the username (NULL = all).
pub(crate) fn candidates_sql(registry: &TenantSchema) -> String {
    format!(
        r#"
        SELECT u.id, u.tenant_id, u.username, u.password_hash, u.full_name, u.email,
               u.role, u.status, u.created_at, u.last_login, t.schema_name
        FROM {users} u
        JOIN {tenants} t ON t.id = u.tenant_id
        WHERE ($1::text IS NULL OR u.status = $1)
          AND ($2::text IS NULL OR u.username = $2)
        ORDER BY u.id
        "#,
        users = registry.qualify(REGISTRY_USERS_TABLE),
        tenants = registry.qualify(REGISTRY_TENANTS_TABLE),
    )
}

#[async_trait]
impl RegistrySource for PgStore {
    async fn tenants(&self) -> Result<Vec<TenantRecord>, StoreError> {
        let sql = tenants_sql(&self.registry);
        let rows = sqlx::query_as::<_, TenantRecord>(&sql)
            .fetch_all(&self.db)
            .await?;
        debug!(tenants = rows.len(), "tenant registry loaded");
        Ok(rows)
    }

    async fn candidates(
        &self,
        filter: StatusFilter,
        scope: &Scope,
    ) -> Result<Vec<RegistryUser>, StoreError> {
        let status = match filter {
            StatusFilter::ActiveOnly => Some(ACTIVE_STATUS),
            StatusFilter::Any => None,
        };
        let sql = candidates_sql(&self.registry);
        let rows = sqlx::query_as::<_, RegistryUser>(&sql)
            .bind(status)
            .bind(scope.username())
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}
