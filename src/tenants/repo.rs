use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{PgStore, StoreError};
use crate::reconcile::plan::FieldSet;
use crate::reconcile::store::{TenantDirectory, UpdateResult, UpsertResult};
use crate::registry::repo::REGISTRY_USERS_TABLE;
use crate::registry::repo_types::RegistryUser;
use crate::tenants::repo_types::TenantUser;
use crate::tenants::schema::{TenantSchema, TENANT_USERS_TABLE};

fn join_mapped(cols: &[&str], f: impl Fn(&str) -> String) -> String {
    cols.iter().map(|c| f(c)).collect::<Vec<_>>().join(", ")
}

pub(crate) fn find_sql(schema: &TenantSchema) -> String {
    format!(
        r#"
        SELECT id, username, password_hash, full_name, email, role, status,
               created_at, last_login, updated_at
        FROM {users}
        WHERE username = $1
        "#,
        users = schema.qualify(TENANT_USERS_TABLE),
    )
}

pub(crate) fn exists_sql(schema: &TenantSchema) -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {users} WHERE username = $1)",
        users = schema.qualify(TENANT_USERS_TABLE),
    )
}

/// Insert-or-update keyed by username in one statement. The row is copied
/// from the registry by its id (`$1`). Returns `inserted = true` for a new
/// row, `false` for an update, and no row when nothing changed.
pub(crate) fn upsert_sql(
    schema: &TenantSchema,
    registry: &TenantSchema,
    insert: FieldSet,
    update: Option<FieldSet>,
) -> String {
    let cols = insert.insert_columns().join(", ");
    let on_conflict = match update {
        None => "DO NOTHING".to_string(),
        Some(fields) => {
            let cols = fields.update_columns();
            format!(
                "DO UPDATE SET {set}, updated_at = now()\n        WHERE ({old}) IS DISTINCT FROM ({new})",
                set = join_mapped(cols, |c| format!("{c} = EXCLUDED.{c}")),
                old = join_mapped(cols, |c| format!("t.{c}")),
                new = join_mapped(cols, |c| format!("EXCLUDED.{c}")),
            )
        }
    };
    format!(
        r#"
        INSERT INTO {users} AS t ({cols})
        SELECT {cols} FROM {registry} WHERE id = $1
        ON CONFLICT (username) {on_conflict}
        RETURNING (t.xmax = 0) AS inserted
        "#,
        users = schema.qualify(TENANT_USERS_TABLE),
        registry = registry.qualify(REGISTRY_USERS_TABLE),
    )
}

/// Update of an existing row from the registry row `$1`; returns the tenant
/// row id only when a column actually changed.
pub(crate) fn update_sql(schema: &TenantSchema, registry: &TenantSchema, fields: FieldSet) -> String {
    let cols = fields.update_columns();
    format!(
        r#"
        UPDATE {users} AS t
        SET {set}, updated_at = now()
        FROM {registry} AS r
        WHERE r.id = $1
          AND t.username = r.username
          AND ({old}) IS DISTINCT FROM ({new})
        RETURNING t.id
        "#,
        users = schema.qualify(TENANT_USERS_TABLE),
        registry = registry.qualify(REGISTRY_USERS_TABLE),
        set = join_mapped(cols, |c| format!("{c} = r.{c}")),
        old = join_mapped(cols, |c| format!("t.{c}")),
        new = join_mapped(cols, |c| format!("r.{c}")),
    )
}

#[async_trait]
impl TenantDirectory for PgStore {
    async fn find_user(
        &self,
        schema: &TenantSchema,
        username: &str,
    ) -> Result<Option<TenantUser>, StoreError> {
        let sql = find_sql(schema);
        let user = sqlx::query_as::<_, TenantUser>(&sql)
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn upsert_user(
        &self,
        schema: &TenantSchema,
        user: &RegistryUser,
        insert: FieldSet,
        update: Option<FieldSet>,
    ) -> Result<UpsertResult, StoreError> {
        let sql = upsert_sql(schema, &self.registry, insert, update);
        let inserted: Option<bool> = sqlx::query_scalar(&sql)
            .bind(user.id)
            .fetch_optional(&self.db)
            .await?;
        Ok(match inserted {
            Some(true) => UpsertResult::Inserted,
            Some(false) => UpsertResult::Updated,
            None => UpsertResult::Untouched,
        })
    }

    async fn update_user(
        &self,
        schema: &TenantSchema,
        user: &RegistryUser,
        fields: FieldSet,
    ) -> Result<UpdateResult, StoreError> {
        let sql = update_sql(schema, &self.registry, fields);
        let updated: Option<Uuid> = sqlx::query_scalar(&sql)
            .bind(user.id)
            .fetch_optional(&self.db)
            .await?;
        if updated.is_some() {
            return Ok(UpdateResult::Updated);
        }

        let sql = exists_sql(schema);
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(&user.username)
            .fetch_one(&self.db)
            .await?;
        Ok(if exists {
            UpdateResult::Unchanged
        } else {
            UpdateResult::NotFound
        })
    }
}
