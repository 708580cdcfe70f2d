use clap::Parser;
use patient_sim_service::{AppState, Config, GeminiModelClient, build_router, telemetry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();
    telemetry::init_tracing(&config.log_format);

    // Nothing is served without a key
    let api_key = match config.api_key() {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            std::process::exit(1);
        }
    };

    let model = GeminiModelClient::new(api_key, config.model.clone());
    info!(model = %model.model(), "Model client initialized");

    let app = build_router(AppState::new(Arc::new(model)));

    let listener = TcpListener::bind(config.bind_address()).await?;
    let addr = listener.local_addr()?;

    info!("Server is running on http://{}", addr);
    info!("Chat endpoint: POST http://{}/api/chat", addr);
    info!("Evaluation endpoint: POST http://{}/api/evaluate", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
