//! Load or clear the development module fixtures.

use clap::{Parser, Subcommand};
use petfeed_relay::config::Config;
use petfeed_relay::db::RegistryStore;
use petfeed_relay::seed;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "petfeed-seed")]
#[command(about = "Seed or clear sample registered modules")]
struct Cli {
    /// Overrides PETFEED_BASIC__DATABASE_URL
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert the three sample modules (duplicates on repeat)
    Up,
    /// Delete every registered module
    Down,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = Config::load()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone())),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let database_url = cli.database_url.unwrap_or(cfg.basic.database_url);
    let store = RegistryStore::connect(&database_url).await?;

    match cli.command {
        Commands::Up => {
            seed::up(&store).await?;
        }
        Commands::Down => {
            let deleted = seed::down(&store).await?;
            println!("{deleted}");
        }
    }
    Ok(())
}
