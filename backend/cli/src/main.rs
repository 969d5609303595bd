mod analytics_cmd;
mod api;
mod bootstrap;
mod chat_cmd;
mod stats_cmd;
mod terminal_output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use routeforge_analytics::{spawn_recorder, AnalyticsStore};
use routeforge_config::RouteForgeConfig;
use routeforge_core::{OutcomeReporter, ProviderId, TaskCategory};
use routeforge_routing::{ChannelReporter, FanoutReporter, TracingReporter};

use api::AppState;

/// Capacity of the outcome channel feeding the analytics recorder.
const OUTCOME_CHANNEL_CAPACITY: usize = 1024;

#[derive(Parser)]
#[command(name = "routeforge")]
#[command(about = "RouteForge — task-aware routing across AI chat providers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one prompt through the router and print the answer
    Chat {
        prompt: String,
        /// Task category: code, chat, search, analysis, creative
        #[arg(short, long, default_value = "chat")]
        category: TaskCategory,
        /// Use exactly this provider, with no fallback
        #[arg(short, long)]
        provider: Option<ProviderId>,
        /// System instruction prepended to the conversation
        #[arg(short, long)]
        system: Option<String>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Show provider availability, models and routing policy
    Stats,
    /// Show recent routing outcomes and per-provider totals
    Analytics {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = RouteForgeConfig::from_env()?;

    let _log_guard = routeforge_logging::init_logger(&config.log_level, config.log_dir.as_deref());
    config.apply_policy_file().await?;

    let report = routeforge_config::validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if let Some(error) = report.errors.into_iter().next() {
        return Err(error).context("Configuration is invalid");
    }

    match cli.command {
        Commands::Serve { port } => {
            let config = RouteForgeConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Chat {
            prompt,
            category,
            provider,
            system,
            max_tokens,
            temperature,
        } => {
            let args = chat_cmd::ChatArgs {
                prompt,
                category,
                provider,
                system,
                max_tokens,
                temperature,
            };
            chat_cmd::run(&config, args).await?;
        }
        Commands::Stats => stats_cmd::run(&config).await?,
        Commands::Analytics { limit } => analytics_cmd::run(&config, limit)?,
    }

    Ok(())
}

/// Reporter that logs every outcome and forwards it to the analytics store.
///
/// Returns the recorder handle so the caller can wait for pending writes.
pub(crate) fn analytics_reporter(
    config: &RouteForgeConfig,
) -> Result<(Arc<dyn OutcomeReporter>, tokio::task::JoinHandle<AnalyticsStore>)> {
    let db_path = config.db_path.to_string_lossy();
    let store = AnalyticsStore::open(&db_path)?;
    let (channel, rx) = ChannelReporter::channel(OUTCOME_CHANNEL_CAPACITY);
    let recorder = spawn_recorder(store, rx);

    let reporter = FanoutReporter::new()
        .with(Arc::new(TracingReporter))
        .with(Arc::new(channel));
    Ok((Arc::new(reporter), recorder))
}

async fn run_server(config: RouteForgeConfig) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        db = %config.db_path.display(),
        config = %config.redacted(),
        "Starting RouteForge"
    );

    let (reporter, _recorder) = analytics_reporter(&config)?;
    let router = Arc::new(bootstrap::build_router(&config, reporter).await?);

    let app = api::build_router(Arc::new(AppState { router }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
