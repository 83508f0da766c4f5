use anyhow::{bail, Context};
use clap::Subcommand;

use crate::app::{router, AppState};
use crate::auth::{generate_jwt, Claims};
use crate::config::{AppConfig, StorageBackend};
use crate::database::models::User;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user")]
    Create {
        #[arg(help = "User email")]
        email: String,
        #[arg(help = "Display name")]
        name: String,
        #[arg(long, help = "Grant platform-wide super admin")]
        super_admin: bool,
    },
}

pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    if config.security.jwt_secret.is_empty() {
        if crate::is_production!() {
            bail!("JWT_SECRET must be set in production");
        }
        bail!("JWT_SECRET is empty; tokens cannot be issued or verified");
    }

    let state = AppState::from_config(config).await?;
    let app = router(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Taskdeck API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

pub async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    require_postgres(config)?;
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    println!("Migrations applied");
    Ok(())
}

pub async fn reconcile(config: &AppConfig) -> anyhow::Result<()> {
    require_postgres(config)?;
    let state = AppState::from_config(config).await?;
    let repaired = state.services.cascade().reconcile().await?;
    println!("Reconciled {} dependent rows", repaired);
    Ok(())
}

pub async fn user(config: &AppConfig, cmd: UserCommands) -> anyhow::Result<()> {
    require_postgres(config)?;
    let state = AppState::from_config(config).await?;

    match cmd {
        UserCommands::Create { email, name, super_admin } => {
            let mut user = User::new(email, name);
            user.is_super_admin = super_admin;
            state.services.identity.insert_user(&user).await?;
            println!("{}", user.id);
        }
    }
    Ok(())
}

pub async fn token(config: &AppConfig, email: &str) -> anyhow::Result<()> {
    require_postgres(config)?;
    let state = AppState::from_config(config).await?;

    let user = state
        .services
        .identity
        .find_user_by_email(&email.trim().to_lowercase())
        .await?
        .with_context(|| format!("no user with email {}", email))?;
    if !user.is_active {
        bail!("user {} is not active", user.email);
    }
    println!("{}", generate_jwt(&Claims::for_user(&user))?);
    Ok(())
}

/// Offline commands are meaningless against a throwaway in-memory store
fn require_postgres(config: &AppConfig) -> anyhow::Result<()> {
    if config.database.backend == StorageBackend::Memory {
        bail!("this command needs DATABASE_BACKEND=postgres");
    }
    Ok(())
}
