//! Cern chat API server binary.
//!
//! Builds the store and reply generator once, injects them into the turn
//! service, and serves `/api/chat` until Ctrl-C.

use std::sync::Arc;

use cern_api::config::{ApiConfig, DEFAULT_DATABASE_URL, DEFAULT_PORT};
use cern_core::reply::{CannedReply, Guardrail, RemoteReply, ReplyGenerator};
use cern_core::store::{ConversationStore, MemoryConversationStore, PgConversationStore};
use cern_core::turn::ConversationService;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "cern_api_server", about = "Cern chat API server")]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep conversations in memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    in_memory: bool,

    /// Base URL of an inference service. Without it every reply is the
    /// canned test response.
    #[arg(long, env = "INFERENCE_URL")]
    inference_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cern_api=debug,cern_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig::new(&args.host, args.port, args.database_url, args.inference_url);

    let store: Arc<dyn ConversationStore> = if args.in_memory {
        warn!("using in-memory store; conversations are lost on exit");
        Arc::new(MemoryConversationStore::new())
    } else {
        info!(max_connections = args.max_connections, "connecting to PostgreSQL");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&config.database_url)
            .await?;

        let store = PgConversationStore::new(pool);
        info!("running database migrations");
        store.migrate().await?;
        Arc::new(store)
    };

    let replies: Arc<dyn ReplyGenerator> = match &config.inference_url {
        Some(url) => {
            info!(inference_url = %url, "replies from inference service");
            Arc::new(Guardrail::new(RemoteReply::new(reqwest::Client::new(), url)?))
        }
        None => {
            info!("replies from canned responder");
            Arc::new(CannedReply)
        }
    };

    let state = cern_api::AppState {
        service: Arc::new(ConversationService::new(store, replies)),
    };
    let app = cern_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "server is running on http://{local_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
