use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    error::AppError,
    extractors::AdminAccess,
    reconcile::{
        outcome::Summary,
        plan::{Plan, Scope, Variant},
        services::Reconciler,
    },
    state::AppState,
};

pub fn reconcile_routes() -> Router<AppState> {
    Router::new()
        .route("/variants", get(list_variants))
        .route("/reconcile/:variant", post(run_variant))
}

#[derive(Debug, Serialize)]
pub struct VariantInfo {
    pub name: Variant,
    pub plan: Plan,
}

#[derive(Debug, Deserialize)]
pub struct RunParams {
    pub username: Option<String>,
}

pub async fn list_variants(_admin: AdminAccess) -> Json<Vec<VariantInfo>> {
    Json(
        Variant::ALL
            .into_iter()
            .map(|name| VariantInfo {
                name,
                plan: name.plan(),
            })
            .collect(),
    )
}

#[instrument(skip(state, _admin))]
pub async fn run_variant(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(variant): Path<String>,
    Query(params): Query<RunParams>,
) -> Result<Json<Summary>, AppError> {
    let variant: Variant = variant
        .parse()
        .map_err(|e: crate::reconcile::plan::UnknownVariant| AppError::NotFound(e.to_string()))?;
    let scope = Scope::from_username(params.username);

    let summary = Reconciler::new(state.store.as_ref())
        .reconcile(variant, &scope)
        .await?;

    info!(%variant, total = summary.total, failed = summary.failed, "reconcile request served");
    Ok(Json(summary))
}
