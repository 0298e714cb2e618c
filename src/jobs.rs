use std::process::ExitCode;

use tracing::{error, warn};

use crate::config::AppConfig;
use crate::db::{self, PgStore};
use crate::reconcile::store::UserStore;
use crate::reconcile::{Reconciler, Scope, Summary, Variant};
use crate::telemetry;

pub const EXIT_OK: u8 = 0;
/// Configuration, connection or registry failure; nothing was reconciled.
pub const EXIT_FATAL: u8 = 1;
/// Run completed but some candidates failed (strict mode only).
pub const EXIT_PARTIAL: u8 = 2;

pub fn exit_code(summary: &Summary, strict: bool) -> u8 {
    if strict && summary.has_failures() {
        EXIT_PARTIAL
    } else {
        EXIT_OK
    }
}

/// Reconciles once against `store`, prints the summary to stdout and returns
/// the process exit code.
pub async fn execute(store: &dyn UserStore, variant: Variant, scope: &Scope, strict: bool) -> u8 {
    let summary = match Reconciler::new(store).reconcile(variant, scope).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, %variant, "reconciliation aborted");
            return EXIT_FATAL;
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(report) => println!("{report}"),
        Err(e) => warn!(error = %e, "could not render summary"),
    }
    if summary.has_failures() {
        warn!(
            failed = summary.failed,
            strict, "some candidates were not reconciled"
        );
    }
    exit_code(&summary, strict)
}

/// Connects, runs one variant, and closes the pool.
pub async fn run_job(config: &AppConfig, variant: Variant, scope: Scope, strict: bool) -> ExitCode {
    let pool = match db::connect(config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %format!("{e:#}"), "cannot reach registry database");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let store = PgStore::new(pool.clone(), config.registry_schema.clone());
    let code = execute(&store, variant, &scope, strict).await;
    pool.close().await;
    ExitCode::from(code)
}

/// Entry point of the argument-less batch binaries.
pub async fn batch_main(variant: Variant) -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{e:#}"), "invalid configuration");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let strict = config.strict_exit;
    run_job(&config, variant, Scope::AllUsers, strict).await
}
