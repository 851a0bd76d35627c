mod discover;
mod logging;
mod records;
mod scrape;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pricewatch")]
#[command(about = "MercadoLibre price monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the marketplace for a keyword and add the products found to the target list
    Discover {
        /// Search keyword, e.g. "smart tv 50"
        keyword: String,
        /// Maximum number of products to add
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=20))]
        limit: u8,
        /// Replace the target list instead of appending to it
        #[arg(long)]
        replace: bool,
    },
    /// Scrape prices for the target list, or for the given URLs only
    Scrape {
        /// Product URL to scrape instead of the target list (repeatable)
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,
    },
    /// Inspect or reset the target list
    Targets {
        #[command(subcommand)]
        command: TargetsCommands,
    },
    /// Inspect or reset the price history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Print the most recent lines of the activity log
    Log {
        /// Number of lines to print
        #[arg(long, default_value_t = 10)]
        lines: usize,
    },
}

#[derive(Debug, Subcommand)]
enum TargetsCommands {
    /// Print every URL in the target list
    List,
    /// Empty the target list
    Clear,
}

#[derive(Debug, Subcommand)]
enum HistoryCommands {
    /// Print the latest snapshot and its headline numbers
    Show,
    /// Delete the price history
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = pricewatch_core::load_app_config()?;
    config.ensure_dirs()?;
    let _log_guard = logging::init(&config)?;

    match cli.command {
        Commands::Discover {
            keyword,
            limit,
            replace,
        } => discover::run_discover(&config, &keyword, usize::from(limit), replace).await,
        Commands::Scrape { urls } => scrape::run_scrape(&config, urls).await,
        Commands::Targets { command } => match command {
            TargetsCommands::List => records::list_targets(&config),
            TargetsCommands::Clear => records::clear_targets(&config),
        },
        Commands::History { command } => match command {
            HistoryCommands::Show => records::show_history(&config),
            HistoryCommands::Clear => records::clear_history(&config),
        },
        Commands::Log { lines } => records::show_log(&config, lines),
    }
}
