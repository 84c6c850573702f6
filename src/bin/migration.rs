use anyhow::Context;
use clap::{Parser, Subcommand};
use migrations::Migrator;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use stockroom_api::{config, db};

/// Schema migration runner for the stockroom database
#[derive(Parser, Debug)]
#[command(name = "migration", version, about)]
struct Cli {
    /// Database URL; falls back to DATABASE_URL, then the loaded configuration
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations
    Up {
        /// Only apply this many migrations
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Revert applied migrations (the last one by default)
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Print which migrations are applied
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let database_url = match cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
    {
        Some(url) => url,
        None => {
            config::load_config()
                .context("failed to load configuration")?
                .database_url
        }
    };
    config::init_tracing("info", false);

    let pool = db::establish_connection(&database_url)
        .await
        .context("failed to connect to the database")?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            db::rollback_migrations(&pool, Some(steps))
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            info!(steps, "Migrations reverted");
        }
        Command::Status => {
            Migrator::status(&pool).await?;
        }
        Command::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("Database rebuilt from scratch");
        }
    }

    Ok(())
}
