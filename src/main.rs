use axum::{
    routing::get,
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use xjoin_search::join::coordinator::JoinCoordinator;
use xjoin_search::merge::types::ResultDocument;
use xjoin_search::provider::registry::{ProviderConfig, ProviderRegistry};
use xjoin_search::search::engine::DocumentStore;
use xjoin_search::search::handlers::{handle_health, handle_select, SearchState};

/// Node configuration file: the join components to wire up and an optional
/// set of seed documents for the in-memory store.
#[derive(Debug, Serialize, Deserialize)]
struct NodeConfig {
    joins: Vec<JoinConfig>,
    #[serde(default)]
    documents: Vec<ResultDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JoinConfig {
    /// Component name; also the request flag and response section name.
    name: String,
    /// Provider kind in the registry ("sequence", "ontology").
    kind: String,
    /// Document field joined against the external results.
    #[serde(rename = "joinField")]
    join_field: String,
    /// Provider initialisation parameters.
    provider: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 5 {
        eprintln!("Usage: {} --bind <addr:port> --config <file>", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:8983 --config node.json",
            args[0]
        );
        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--config" => {
                config_path = Some(args[i + 1].clone());
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");
    let config_path = config_path.expect("--config is required");

    let raw = std::fs::read_to_string(&config_path)?;
    let config: NodeConfig = serde_json::from_str(&raw)?;

    // 1. Providers: constructed fail-fast, so a misconfigured join prevents
    //    the node from serving any query at all.
    let registry = ProviderRegistry::with_builtins();

    let mut joins = Vec::new();
    for join_config in &config.joins {
        let provider_config = ProviderConfig::from(join_config.provider.clone());
        let provider = registry.build(&join_config.kind, &provider_config)?;
        tracing::info!(
            "Configured join {} (kind {}, field {})",
            join_config.name,
            join_config.kind,
            join_config.join_field
        );
        joins.push(Arc::new(JoinCoordinator::new(
            join_config.name.clone(),
            join_config.join_field.clone(),
            provider,
        )));
    }

    // 2. Document store:
    let mut store = DocumentStore::new();
    for doc in config.documents {
        store.add(doc);
    }
    tracing::info!("Loaded {} seed document(s)", store.len());

    let state = Arc::new(SearchState { store, joins });

    // 3. HTTP Router:
    let app = Router::new()
        .route("/select", get(handle_select))
        .route("/healthz", get(handle_health))
        .layer(Extension(state));

    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
