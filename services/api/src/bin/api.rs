//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, DisabledVisionAdapter, HttpDirectionsAdapter, MemoryStore, OpenAiVisionAdapter,
        OpenFoodFactsAdapter,
    },
    config::Config,
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::Router;
use carbon_lens_core::{CarbonTracker, Collaborators, ScanStore, SystemClock, VisionAnalysisService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Scan Store ---
    let store: Arc<dyn ScanStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; scan history will be kept in memory only.");
            Arc::new(MemoryStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let vision: Arc<dyn VisionAnalysisService> = match &config.openai_api_key {
        Some(api_key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            Arc::new(OpenAiVisionAdapter::new(openai_client, config.vision_model.clone()))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; image scans will detect nothing.");
            Arc::new(DisabledVisionAdapter)
        }
    };

    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let barcodes = Arc::new(OpenFoodFactsAdapter::new(
        http_client.clone(),
        config.barcode_api_url.clone(),
    ));
    if config.directions_api_key.is_none() {
        warn!("DIRECTIONS_API_KEY is not set; trips will use the fallback distance.");
    }
    let directions = Arc::new(HttpDirectionsAdapter::new(
        http_client,
        config.directions_api_url.clone(),
        config.directions_api_key.clone(),
    ));

    // --- 4. Build and Start the Tracker ---
    let tracker = Arc::new(CarbonTracker::new(
        store,
        Arc::new(SystemClock),
        Collaborators {
            vision,
            barcodes,
            directions,
        },
        config.display_name.clone(),
    ));
    tracker.initialize().await?;

    let app_state = Arc::new(AppState {
        tracker: tracker.clone(),
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracker.shutdown().await;
    info!("Server stopped.");
    Ok(())
}
