//! CLI frontend for the Saloon game host.

mod commands;
mod roster;
mod terminal;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "saloon",
    about = "Saloon: revolver duels and a daily lottery for group chats",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play in a simulated chat, reading `<username> <command>` lines from stdin
    Play {
        /// Roster file describing the chat, its members, and game settings
        #[arg(short, long)]
        config: PathBuf,

        /// RNG seed for reproducible games
        #[arg(short, long)]
        seed: Option<u64>,

        /// Skip every narration pause
        #[arg(short, long)]
        fast: bool,

        /// Load and save scores, pool, and picks from this JSON file
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Run many duels offline and report how they played out
    Simulate {
        /// Number of duels to simulate
        #[arg(short, long, default_value = "1000")]
        duels: u32,

        /// RNG seed for deterministic simulation
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Print the lottery rules
    Rules,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            config,
            seed,
            fast,
            state,
        } => commands::play::run(&config, seed, fast, state.as_deref()).await,
        Commands::Simulate { duels, seed } => commands::simulate::run(duels, seed),
        Commands::Rules => commands::rules::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
