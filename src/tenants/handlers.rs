use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::AppError,
    extractors::AdminAccess,
    reconcile::store::{RegistrySource, TenantDirectory},
    state::AppState,
    tenants::{repo_types::TenantUser, schema::SchemaAllowList},
};

pub fn tenant_routes() -> Router<AppState> {
    Router::new().route("/tenants/:schema/users/:username", get(get_tenant_user))
}

/// Current tenant-local projection of one user.
#[instrument(skip(state, _admin))]
pub async fn get_tenant_user(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path((schema, username)): Path<(String, String)>,
) -> Result<Json<TenantUser>, AppError> {
    let tenants = state.store.tenants().await?;
    let allow_list = SchemaAllowList::from_names(tenants.iter().map(|t| &t.schema_name));
    let schema = allow_list.resolve(&schema)?;

    match state.store.find_user(&schema, &username).await? {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::NotFound(format!(
            "user {username:?} not found in {schema}"
        ))),
    }
}
