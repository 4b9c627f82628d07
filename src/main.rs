mod config;
mod forms;
mod gateway;
mod render;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use gateway::IdentityGateway;
use gateway::memory::MemoryGateway;
use gateway::supabase::SupabaseGateway;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let gateway: Arc<dyn IdentityGateway> = match &config.gateway {
        Some(gateway_config) => {
            tracing::info!(url = %gateway_config.url, "using hosted identity gateway");
            Arc::new(SupabaseGateway::new(gateway_config).expect("gateway client init failed"))
        }
        None => {
            tracing::warn!("SUPABASE_* not set; using in-memory identity gateway");
            Arc::new(MemoryGateway::new())
        }
    };
    let state = state::AppState::new(gateway, config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "storefront listening");
    axum::serve(listener, app).await.expect("server failed");
}
