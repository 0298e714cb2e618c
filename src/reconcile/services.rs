use tracing::{error, info, instrument};

use crate::db::StoreError;
use crate::reconcile::outcome::{CandidateReport, Outcome, Summary};
use crate::reconcile::plan::{Plan, Scope, Variant};
use crate::reconcile::store::{
    RegistrySource, TenantDirectory, UpdateResult, UpsertResult, UserStore,
};
use crate::registry::repo_types::RegistryUser;
use crate::tenants::schema::SchemaAllowList;

/// Failure that stops a run before any candidate is processed.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("registry unavailable: {0}")]
    Registry(#[source] StoreError),
}

/// Brings tenant-local user rows in line with the shared registry.
pub struct Reconciler<'a> {
    store: &'a dyn UserStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn UserStore) -> Self {
        Self { store }
    }

    /// Runs `variant` over `scope`. Candidates are processed one at a time
    /// in registry id order; a failing candidate is recorded and skipped.
    #[instrument(skip_all, fields(variant = %variant, scope = ?scope))]
    pub async fn reconcile(
        &self,
        variant: Variant,
        scope: &Scope,
    ) -> Result<Summary, ReconcileError> {
        let plan = variant.plan();

        let tenants = self.store.tenants().await.map_err(ReconcileError::Registry)?;
        let allow_list = SchemaAllowList::from_names(tenants.iter().map(|t| &t.schema_name));
        let candidates = self
            .store
            .candidates(plan.filter, scope)
            .await
            .map_err(ReconcileError::Registry)?;
        info!(
            tenants = allow_list.len(),
            candidates = candidates.len(),
            "reconciliation started"
        );

        let mut summary = Summary::new(variant);
        for user in &candidates {
            let report = match self.reconcile_one(&plan, &allow_list, user).await {
                Ok(outcome) => {
                    info!(
                        username = %user.username,
                        schema = %user.schema_name,
                        outcome = %outcome,
                        "candidate reconciled"
                    );
                    CandidateReport::new(user, outcome)
                }
                Err(e) => {
                    error!(
                        username = %user.username,
                        schema = %user.schema_name,
                        error = %e,
                        "candidate failed"
                    );
                    CandidateReport::failed(user, e.to_string())
                }
            };
            summary.record(report);
        }

        info!(
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            present = summary.present,
            missing = summary.missing,
            failed = summary.failed,
            "reconciliation finished"
        );
        Ok(summary)
    }

    async fn reconcile_one(
        &self,
        plan: &Plan,
        allow_list: &SchemaAllowList,
        user: &RegistryUser,
    ) -> Result<Outcome, StoreError> {
        let schema = allow_list.resolve(&user.schema_name)?;

        match (plan.create, plan.update) {
            (None, None) => {
                let found = self.store.find_user(&schema, &user.username).await?;
                Ok(if found.is_some() {
                    Outcome::Present
                } else {
                    Outcome::Missing
                })
            }
            (Some(insert), update) => {
                let res = self
                    .store
                    .upsert_user(&schema, user, insert, update)
                    .await?;
                Ok(match res {
                    UpsertResult::Inserted => Outcome::Created,
                    UpsertResult::Updated => Outcome::Updated,
                    UpsertResult::Untouched if update.is_some() => Outcome::Unchanged,
                    UpsertResult::Untouched => Outcome::Present,
                })
            }
            (None, Some(fields)) => {
                let res = self.store.update_user(&schema, user, fields).await?;
                Ok(match res {
                    UpdateResult::Updated => Outcome::Updated,
                    UpdateResult::Unchanged => Outcome::Unchanged,
                    UpdateResult::NotFound => Outcome::Missing,
                })
            }
        }
    }
}
