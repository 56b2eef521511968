use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use stock_agent::app::{ComponentStatus, Components};
use stock_agent::cli::{Console, ConsoleRenderer};
use stock_agent::config::{self, AppConfig, DEFAULT_WEB_BIND};
use stock_agent::core::FrameworkError;
use stock_agent::logging;
use stock_agent::mcp::MCPServerConfig;
use stock_agent::web::{self, AppState};

/// Fi Money stock transactions agent
#[derive(Parser, Debug)]
#[command(name = "stock-agent", version, about = "Fetch and summarize Fi Money stock transactions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the agent in the terminal
    Console {
        /// Run a single turn with this message and exit
        #[arg(long)]
        once: Option<String>,

        /// Save each raw response as a timestamped text file here
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Hide tool calls and other intermediate events
        #[arg(long)]
        quiet: bool,
    },
    /// Serve the web UI
    Web {
        /// Address to listen on (overrides WEB_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let web_mode = matches!(cli.command, Commands::Web { .. });
    let _guard = logging::init_logging(&config::log_dir(), web_mode)?;

    tracing::info!("=== Stock Transactions Agent Starting ===");

    let config = AppConfig::from_env().map_err(FrameworkError::from);

    match cli.command {
        Commands::Console {
            once,
            save_dir,
            quiet,
        } => run_console(config, once, save_dir, quiet).await,
        Commands::Web { bind } => run_web(config, bind).await.map(|()| ExitCode::SUCCESS),
    }
}

async fn run_console(
    config: Result<AppConfig, FrameworkError>,
    once: Option<String>,
    save_dir: Option<PathBuf>,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let console = Console::new().show_events(!quiet);

    let components = match config {
        Ok(config) => Components::initialize(config).await,
        Err(e) => Err(e),
    };
    let components = match components {
        Ok(components) => Arc::new(components),
        Err(e) => {
            tracing::error!("Initialization failed: {}", e);
            console.print_status(&failed_status(&e));
            console.print_error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut renderer = ConsoleRenderer::new(components).with_console(console);
    if let Some(dir) = save_dir {
        renderer = renderer.with_save_dir(dir);
    }

    match once {
        Some(message) => {
            renderer.print_intro().await;
            renderer.console().print_user(&message);
            if !renderer.run_turn(&message).await {
                tracing::info!("=== Stock Transactions Agent Exiting (no response) ===");
                return Ok(ExitCode::FAILURE);
            }
        }
        None => renderer.run().await?,
    }

    tracing::info!("=== Stock Transactions Agent Exiting ===");
    Ok(ExitCode::SUCCESS)
}

async fn run_web(
    config: Result<AppConfig, FrameworkError>,
    bind: Option<SocketAddr>,
) -> anyhow::Result<()> {
    let (state, configured_bind) = match config {
        Ok(config) => {
            let web_bind = config.web_bind;
            match Components::initialize(config).await {
                Ok(components) => (AppState::initialized(Arc::new(components)).await, Some(web_bind)),
                Err(e) => {
                    tracing::error!("Initialization failed: {}", e);
                    (AppState::failed(failed_status(&e)), Some(web_bind))
                }
            }
        }
        Err(e) => {
            tracing::error!("Initialization failed: {}", e);
            (AppState::failed(failed_status(&e)), None)
        }
    };

    let addr = match bind.or(configured_bind) {
        Some(addr) => addr,
        None => DEFAULT_WEB_BIND.parse()?,
    };

    web::serve(Arc::new(state), addr).await
}

fn failed_status(error: &FrameworkError) -> ComponentStatus {
    let server = MCPServerConfig::new("", config::mcp_server_url());
    ComponentStatus::failed(error, server.authority())
}
