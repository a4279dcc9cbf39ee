pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post, put},
    Router,
};
use rest::*;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Uploaded photos are capped at 10 MiB.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the REST router with its CORS and body-size layers.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/scans", get(list_scans_handler).post(record_scan_handler).delete(clear_scans_handler))
        .route("/scans/image", post(scan_image_handler))
        .route("/scans/barcode", post(scan_barcode_handler))
        .route("/scans/refresh", post(refresh_handler))
        .route("/scans/{id}", get(get_scan_handler).delete(delete_scan_handler))
        .route("/summary", get(overview_handler))
        .route("/profile", get(get_profile_handler))
        .route("/profile/settings", put(update_settings_handler))
        .route("/profile/name", put(rename_handler))
        .route("/profile/reset", post(reset_profile_handler))
        .route("/trips", post(log_trip_handler))
        .route("/trips/estimate", post(estimate_trip_handler))
        .route("/trips/alternatives", get(alternatives_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(app_state)
}
