use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{RawQuery, State},
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::model::RecipesResponse;
use crate::router::RecipeQuery;

/// Routes of the gateway service
pub fn app(gateway: Arc<Gateway>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/recipes", get(recipes_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(gateway)
}

/// Always 200; failures are carried in the envelope
async fn recipes_handler(
    State(gateway): State<Arc<Gateway>>,
    RawQuery(query): RawQuery,
) -> Json<RecipesResponse> {
    let query = RecipeQuery::parse(query.as_deref().unwrap_or_default());
    Json(gateway.respond(&query).await)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM
pub async fn start_server(config: GatewayConfig) -> Result<(), GatewayError> {
    let gateway = Arc::new(Gateway::from_config(&config)?);

    let address = format!("{}:{}", config.server.host, config.server.port);
    info!("Binding to {}", address);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {}", address);

    axum::serve(listener, app(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
