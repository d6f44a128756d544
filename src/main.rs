use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use axum::Router;
use tokio::net::TcpListener;

use menu_rag::core;
use menu_rag::models::StoreId;
use menu_rag::rag::load_records;
use menu_rag::server;
use menu_rag::state::AppState;

const USAGE: &str = "usage: menu-rag [serve | ingest [<records.json>] | reembed <restaurant-id>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().await?;
    core::logging::init(&state.paths);
    tracing::debug!(
        "Effective configuration: {}",
        state.config.redact_sensitive_values(&state.config.load_config())
    );

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve(state).await,
        Some("ingest") => {
            let path = args
                .get(1)
                .map(PathBuf::from)
                .or_else(|| state.settings.ingest.source_path.clone())
                .context("no records file given and ingest.source_path is not set")?;
            let records = load_records(&path)?;
            let report = state.ingestion.ingest(records).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Some("reembed") => {
            let raw = args.get(1).context(USAGE)?;
            let id = StoreId::parse(raw)?;
            let text = state.ingestion.reembed_restaurant(&id).await?;
            println!("{}", text);
            Ok(())
        }
        Some(other) => bail!("unknown command {:?}\n{}", other, USAGE),
    }
}

async fn serve(state: std::sync::Arc<AppState>) -> anyhow::Result<()> {
    let bind_addr = format!("127.0.0.1:{}", state.settings.server.port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("MENU_RAG_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
