use clap::{Parser, Subcommand};
use search_export::cli::search::SearchArgs;
use search_export::config::resolve_config_path;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "search-export")]
#[command(about = "Stream search results from a remote search service", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search and print every result once the job is complete
    Search(SearchArgs),
    /// Print server information
    Info,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Search(args) => {
            search_export::cli::search::run(config_path, args).await?;
        }
        Commands::Info => {
            search_export::cli::info::run(config_path).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { stdout } => {
                search_export::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                search_export::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}
