mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod services;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "pickem")]
#[command(about = "Weekly SEC pick'em: lines, picks, grading and standings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Initialize the database
    InitDb,
    /// Load the week one slate into an empty database
    Seed,
    /// Fetch a week's lines from the odds feed and store them
    FetchGames {
        #[arg(short, long)]
        week: Option<u32>,
    },
    /// Enter or correct a game's score
    RecordResult {
        #[arg(long)]
        game_id: String,
        #[arg(long)]
        home_score: u32,
        #[arg(long)]
        away_score: u32,
        /// Record the score as provisional instead of final
        #[arg(long)]
        pending: bool,
    },
    /// Print standings for a week (default: current) or the season
    Standings {
        #[arg(short, long, conflicts_with = "season")]
        week: Option<u32>,
        #[arg(short, long)]
        season: bool,
        /// Also write the table to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show how every pick on a game grades
    Grade {
        #[arg(long)]
        game_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting pick'em API server on port {}", port);
            api::serve(port, settings).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            cli::init_db(&settings).await?;
        }
        Some(Commands::Seed) => {
            cli::seed(&settings).await?;
        }
        Some(Commands::FetchGames { week }) => {
            tracing::info!("Fetching games for week {:?}", week);
            cli::fetch_games(&settings, week).await?;
        }
        Some(Commands::RecordResult {
            game_id,
            home_score,
            away_score,
            pending,
        }) => {
            cli::enter_result(&settings, &game_id, home_score, away_score, !pending).await?;
        }
        Some(Commands::Standings { week, season, csv }) => {
            cli::show_standings(&settings, week, season, csv.as_deref()).await?;
        }
        Some(Commands::Grade { game_id }) => {
            cli::grade_game(&settings, &game_id).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting pick'em API server on port 3000");
            api::serve(3000, settings).await?;
        }
    }

    Ok(())
}
