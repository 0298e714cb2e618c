use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tenant_sync::{
    app, config::AppConfig, jobs, reconcile::Scope, reconcile::Variant, state::AppState,
    telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "tenant-sync", version, about = "Keep tenant user tables in line with the registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the admin HTTP API.
    Serve,
    /// Run one reconciliation variant and exit.
    Run {
        /// check-users, sync-tenant-users, migrate-existing-users,
        /// emergency-password-sync or force-sync-password
        variant: Variant,
        /// Only reconcile this username.
        #[arg(long)]
        user: Option<String>,
        /// Exit with status 2 when any user failed to reconcile.
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init();

    let config = AppConfig::from_env().context("load configuration")?;

    match cli.command {
        Command::Serve => {
            let (state, pool) = AppState::init(config.clone()).await?;
            app::serve(app::build_app(state), &config).await?;
            pool.close().await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            variant,
            user,
            strict,
        } => {
            let strict = strict || config.strict_exit;
            Ok(jobs::run_job(&config, variant, Scope::from_username(user), strict).await)
        }
    }
}
