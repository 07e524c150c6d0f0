//! Database migration command.
//!
//! Applies `crates/server/migrations/` (embedded at build time).

use shopdesk_server::db::MIGRATOR;

use super::{CliError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
