use std::process::ExitCode;

use tenant_sync::{jobs, reconcile::Variant};

#[tokio::main]
async fn main() -> ExitCode {
    jobs::batch_main(Variant::MigrateExistingUsers).await
}
