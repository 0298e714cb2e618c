pub mod handlers;
#[cfg(test)]
pub(crate) mod memory;
pub mod outcome;
pub mod plan;
pub mod services;
pub mod store;

pub use outcome::{CandidateReport, Outcome, Summary};
pub use plan::{FieldSet, Plan, Scope, StatusFilter, Variant};
pub use services::{ReconcileError, Reconciler};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::reconcile_routes()
}
