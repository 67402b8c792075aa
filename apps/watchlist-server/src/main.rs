use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use watch_list::{AccountService, AppServices, Migrator};
use watchlist_auth::TokenCodec;
use watchlist_db::Db;
use watchlist_security::CallerContext;

mod config;
mod logging;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "watchlist-server", version, about = "Personal watch-list tracker")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Apply pending schema migrations
    Migrate,
    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create a user account
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    logging::init(&config.logging)?;

    let db = Db::connect(&config.db)
        .await
        .context("failed to connect to the database")?;

    match cli.command {
        Command::Serve => serve(config, &db).await,
        Command::Migrate => {
            Migrator::up(db.connection(), None).await?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Command::CreateAdmin { username, password } => {
            let accounts = AccountService::new(db, TokenCodec::new(config.admin));
            let admin = accounts
                .create_admin(&username, &password)
                .await
                .context("failed to create admin")?;
            println!("Admin '{}' created.", admin.login);
            Ok(())
        }
        Command::CreateUser { email, password } => {
            let accounts = AccountService::new(db, TokenCodec::new(config.admin));
            let user = accounts
                .register_user(&CallerContext::internal(), &email, &password)
                .await
                .context("failed to create user")?;
            println!("User '{}' created.", user.login);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, db: &Db) -> anyhow::Result<()> {
    if config.app.migrate_on_start {
        Migrator::up(db.connection(), None).await?;
        tracing::info!("migrations applied");
    }

    let services = AppServices::new(db, TokenCodec::new(config.admin));
    let app = watch_list::router(&services);

    let listener = tokio::net::TcpListener::bind((config.app.host.as_str(), config.app.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.app.host, config.app.port))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
