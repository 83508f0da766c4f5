pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Taskdeck API - multi-tenant project management backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply embedded database migrations")]
    Migrate,

    #[command(about = "Finish cascades for deleted workspaces whose dependents are still live")]
    Reconcile,

    #[command(about = "Identity store management")]
    User {
        #[command(subcommand)]
        cmd: commands::UserCommands,
    },

    #[command(about = "Issue a bearer token for an existing user")]
    Token {
        #[arg(help = "User email")]
        email: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::config();
    tracing::info!("Starting Taskdeck in {:?} mode", config.environment);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve(config).await,
        Commands::Migrate => commands::migrate(config).await,
        Commands::Reconcile => commands::reconcile(config).await,
        Commands::User { cmd } => commands::user(config, cmd).await,
        Commands::Token { email } => commands::token(config, &email).await,
    }
}
