use anyhow::Result;
use clap::{Parser, Subcommand};

use kiosk_infrastructure::{AppConfig, CONFIG_ENV};

#[derive(Parser, Debug)]
#[command(name = "ecosort")]
#[command(about = "EcoSort waste sorting kiosk", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the kiosk HTTP API
    Serve,
    /// Run one interactive cycle: tare, capture, classify, sort, weigh, reward
    Run,
    /// Issue a reward for an operator-entered category and weight
    Manual {
        /// dry or wet
        #[arg(long)]
        waste_type: String,
        /// Item weight in grams
        #[arg(long)]
        weight: f64,
    },
    /// Capture, classify and drive the sorter without weighing
    Sort,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_ENV, config);
    }

    let config = AppConfig::load().await?;
    let _log_guard = kiosk_bootstrap::init_tracing(config.log_dir.as_deref());
    config.log_source();

    match args.command {
        Command::Serve => kiosk_bootstrap::run_standalone(&config).await,
        Command::Run => kiosk_bootstrap::run_interactive(&config).await,
        Command::Manual { waste_type, weight } => {
            kiosk_bootstrap::run_manual(&config, &waste_type, weight).await
        }
        Command::Sort => kiosk_bootstrap::run_sort(&config).await,
    }
}
