use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod catalog;
mod config;
mod data;
mod flow;
mod gateway;
mod orchestrator;
mod scoring;
mod server;
mod storage;
mod visibility;

use config::{AdvisorConfig, RecommendationSource};
use data::Category;
use orchestrator::Advisor;
use storage::FileSessionStore;

#[derive(Parser)]
#[command(name = "plan-advisor")]
#[command(about = "Plan Advisor - guided insurance questionnaire and plan recommendations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List insurance categories
    Categories,

    /// Show the question catalog for a category
    Questions {
        /// Category (health, term or vehicle)
        #[arg(long)]
        category: Category,
    },

    /// Answer the questionnaire and view recommended plans
    Start {
        /// Category (health, term or vehicle)
        #[arg(long)]
        category: Category,
    },

    /// Show recommendations for the stored answers
    Results {
        /// Only accept answers stored for this category
        #[arg(long)]
        category: Option<Category>,
    },

    /// Score an answers JSON file and print offers as JSON
    Score {
        /// Insurance type; unrecognized types get the generic offer
        #[arg(long)]
        category: String,

        /// JSON object of question id to answer
        #[arg(long)]
        answers: PathBuf,
    },

    /// Clear the stored answers and start over
    Reset,

    /// Run the HTTP recommendation service
    Serve {
        /// Bind address (overrides ADVISOR_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides ADVISOR_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AdvisorConfig::load()?;

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let store = FileSessionStore::new(&config.session_dir);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    match cli.command {
        Commands::Categories => {
            orchestrator::list_categories(&mut out)?;
        }
        Commands::Questions { category } => {
            orchestrator::show_questions(category, &mut out)?;
        }
        Commands::Start { category } => {
            tracing::info!(%category, "Starting questionnaire");
            let gateway = gateway::from_config(&config.gateway)?;
            Advisor::new(&store, gateway.as_ref()).start(category, &mut input, &mut out)?;
        }
        Commands::Results { category } => {
            tracing::info!(category = ?category, "Showing results");
            let gateway = gateway::from_config(&config.gateway)?;
            Advisor::new(&store, gateway.as_ref()).results(category, &mut input, &mut out)?;
        }
        Commands::Score { category, answers } => {
            tracing::info!(%category, answers = %answers.display(), "Scoring answers file");
            orchestrator::score_file(&category, &answers, &mut out)?;
        }
        Commands::Reset => {
            orchestrator::reset(&store, &mut out)?;
        }
        Commands::Serve { host, port } => {
            if config.gateway.source == RecommendationSource::Remote {
                anyhow::bail!(
                    "the service answers requests itself; set ADVISOR_SOURCE to scoring or fixture"
                );
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = config.server.socket_addr()?;
            let gateway: Arc<dyn gateway::RecommendationGateway> =
                Arc::from(gateway::from_config(&config.gateway)?);
            let state = server::AppState::new(gateway, config.gateway.api_key.clone());
            tokio::runtime::Runtime::new()?.block_on(server::run(addr, state))?;
        }
    }

    Ok(())
}
