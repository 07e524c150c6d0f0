//! shopdesk CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! shopdesk-cli migrate
//!
//! # Create the first admin (password from --password or SHOPDESK_NEW_USER_PASSWORD)
//! shopdesk-cli user create --username root --email root@example.com \
//!     --first-name Store --last-name Owner --role admin
//!
//! # Insert the demo catalog (safe to re-run)
//! shopdesk-cli seed
//! ```
//!
//! All commands read `SHOPDESK_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use shopdesk_core::UserRole;

mod commands;

#[derive(Parser)]
#[command(name = "shopdesk-cli")]
#[command(author, version, about = "shopdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Insert a small demo catalog (idempotent by product name)
    Seed,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user with any role
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// `admin` or `customer`
        #[arg(long, default_value = "admin")]
        role: UserRole,

        #[arg(long, env = "SHOPDESK_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                first_name,
                last_name,
                role,
                password,
            } => {
                let details = commands::user::NewUserArgs {
                    username,
                    email,
                    first_name,
                    last_name,
                    role,
                    password,
                };
                commands::user::create(details).await?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
