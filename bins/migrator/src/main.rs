//! Database migration runner for GitMarket.
//!
//! Usage:
//!   migrator up [-n N]    - Run pending migrations (all, or the next N)
//!   migrator down [-n N]  - Roll back the last N migrations (default 1)
//!   migrator status       - Show migration status
//!   migrator fresh        - Drop all tables and re-run migrations
//!   migrator refresh      - Roll back everything, then re-apply
//!   migrator reset        - Roll back all applied migrations
//!
//! The database comes from `AppConfig` (`GITMARKET__DATABASE__URL`), not
//! from `DATABASE_URL`.

use anyhow::{Context, anyhow};
use clap::Parser;
use sea_orm_cli::MigrateSubcommands;
use sea_orm_migration::cli::run_migrate;
use tracing::info;

use gitmarket_db::connect;
use gitmarket_db::migration::Migrator;
use gitmarket_shared::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "migrator", version, about = "Apply GitMarket schema migrations")]
struct Cli {
    /// Show debug messages.
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<MigrateSubcommands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    // run_migrate installs its own tracing subscriber
    run_migrate(Migrator, &db, cli.command, cli.verbose)
        .await
        .map_err(|e| anyhow!("Migration failed: {e}"))?;
    info!("Migrations complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_up_all() {
        let cli = Cli::try_parse_from(["migrator"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parses_steps() {
        let cli = Cli::try_parse_from(["migrator", "up", "--num", "2"]).unwrap();
        assert_eq!(cli.command, Some(MigrateSubcommands::Up { num: Some(2) }));

        let cli = Cli::try_parse_from(["migrator", "down"]).unwrap();
        assert_eq!(cli.command, Some(MigrateSubcommands::Down { num: 1 }));

        let cli = Cli::try_parse_from(["migrator", "-v", "down", "-n", "3"]).unwrap();
        assert_eq!(cli.command, Some(MigrateSubcommands::Down { num: 3 }));
        assert!(cli.verbose);
    }

    #[test]
    fn test_rejects_unknown_input() {
        assert!(Cli::try_parse_from(["migrator", "sideways"]).is_err());
        assert!(Cli::try_parse_from(["migrator", "down", "--num", "many"]).is_err());
    }
}
