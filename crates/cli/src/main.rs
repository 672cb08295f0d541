//! Loomline CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! loomline-cli migrate
//!
//! # Create or promote an admin (password from LOOMLINE_ADMIN_PASSWORD)
//! loomline-cli admin create -e owner@loomline.in -p 9876543210 -n "Owner" \
//!     --business-name "Loomline Wholesale" --address "Ring Road, Surat"
//!
//! # Load demo categories, products, banners and UPI details
//! loomline-cli seed catalog
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "loomline-cli")]
#[command(author, version, about = "Loomline Wholesale CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with demo data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin user, or promote an existing account with this email
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin phone number
        #[arg(short, long)]
        phone: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        #[arg(long, default_value = "Loomline Wholesale")]
        business_name: String,

        #[arg(long, default_value = "Surat, Gujarat")]
        address: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Categories, products, a hero banner and UPI payment details
    Catalog,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                phone,
                name,
                business_name,
                address,
            } => {
                commands::admin::create_user(commands::admin::NewAdmin {
                    email,
                    phone,
                    name,
                    business_name,
                    address,
                })
                .await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog => commands::seed::catalog().await?,
        },
    }
    Ok(())
}
