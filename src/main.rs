use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use intent_gate::api::{self, AppState};
use intent_gate::azure::chat::AzureChatClient;
use intent_gate::azure::embeddings::AzureEmbeddingClient;
use intent_gate::config::Settings;
use intent_gate::manager::ModelManager;
use intent_gate::pipeline::IntentPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🚀 Starting intent-gate server...");

    // -----------------------------
    // Shared state / Dependencies
    // -----------------------------
    let settings = Settings::from_env()?;

    let embedder = Arc::new(AzureEmbeddingClient::new(&settings.embedding));
    let fallback = Arc::new(AzureChatClient::new(&settings.chat));
    let manager = ModelManager::new(settings.artifacts.clone());

    // Artifacts load lazily on the first prediction, not here.
    let pipeline = Arc::new(IntentPipeline::new(
        manager,
        embedder,
        fallback,
        settings.policy,
    ));

    let state = AppState { pipeline };

    // -----------------------------
    // Routers
    // -----------------------------
    let app = Router::new()
        .merge(api::router())
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let addr = settings.bind_addr;

    println!("🌐 HTTP listening on http://{addr}");
    println!("🎯 Predictions at http://{addr}/predict");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
