pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod schema;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::tenant_routes()
}
