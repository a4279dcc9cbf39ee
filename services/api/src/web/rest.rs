//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use carbon_lens_core::domain::{AnalyzedObject, ScanKind, Symbology, TransportMode};
use carbon_lens_core::estimation::compare_alternatives;
use carbon_lens_core::{
    BudgetStatus, CoreError, HistorySummary, ScanOutcome, TripEstimate, UserLevel, UserSettings,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

type HandlerError = (StatusCode, String);

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        scan_image_handler,
        scan_barcode_handler,
        record_scan_handler,
        list_scans_handler,
        get_scan_handler,
        delete_scan_handler,
        clear_scans_handler,
        refresh_handler,
        overview_handler,
        get_profile_handler,
        update_settings_handler,
        rename_handler,
        reset_profile_handler,
        estimate_trip_handler,
        log_trip_handler,
        alternatives_handler,
    ),
    components(
        schemas(HealthResponse, BarcodeRequest, ManualScanRequest, RenameRequest, TripRequest)
    ),
    tags(
        (name = "Carbon Lens API", description = "Scan history, carbon summaries, profile and trip estimates.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    ready: bool,
    storage: String,
    vision_configured: bool,
    directions_configured: bool,
}

/// A barcode read by the client's scanner.
#[derive(Deserialize, ToSchema)]
pub struct BarcodeRequest {
    code: String,
    #[schema(value_type = Option<String>, example = "ean13")]
    symbology: Option<Symbology>,
}

/// Objects the client already knows, recorded as one scan.
#[derive(Deserialize, ToSchema)]
pub struct ManualScanRequest {
    #[schema(value_type = Option<String>, example = "manual")]
    kind: Option<ScanKind>,
    #[schema(value_type = Vec<Object>)]
    objects: Vec<AnalyzedObject>,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameRequest {
    display_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TripRequest {
    origin: String,
    destination: String,
    /// Unknown modes are treated as `car`.
    #[schema(example = "bus")]
    mode: String,
}

#[derive(Deserialize)]
pub struct AlternativesQuery {
    distance_km: f64,
    exclude: Option<String>,
}

#[derive(Serialize)]
pub struct OverviewResponse {
    summary: HistorySummary,
    level: UserLevel,
    budget: BudgetStatus,
}

#[derive(Serialize)]
pub struct LoggedTripResponse {
    trip: TripEstimate,
    #[serde(flatten)]
    outcome: ScanOutcome,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn core_error(e: CoreError) -> HandlerError {
    match e {
        CoreError::NotInitialized => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        CoreError::InvalidSettings(_) | CoreError::InvalidScan(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        CoreError::Persistence(_) => {
            error!("Persistence failure: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save changes".to_string())
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Report readiness and which collaborators are configured.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service status", body = HealthResponse))
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = &app_state.config;
    Json(HealthResponse {
        ready: app_state.tracker.is_ready().await,
        storage: if config.database_url.is_some() { "postgres" } else { "memory" }.to_string(),
        vision_configured: config.openai_api_key.is_some(),
        directions_configured: config.directions_api_key.is_some(),
    })
}

/// Analyze a photo and record the detected items.
///
/// Accepts a multipart/form-data request with an `image` file part and an
/// optional `kind` text part (`product`, `meal` or `receipt`).
#[utoipa::path(
    post,
    path = "/scans/image",
    request_body(content_type = "multipart/form-data", description = "The photo to analyze."),
    responses(
        (status = 201, description = "Scan recorded"),
        (status = 400, description = "Bad request (e.g., missing image)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn scan_image_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let mut image: Option<Bytes> = None;
    let mut kind = ScanKind::Product;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, format!("Failed to read multipart data: {}", e))
    })? {
        match field.name() {
            Some("image") => {
                let data = field.bytes().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read image bytes: {}", e))
                })?;
                image = Some(data);
            }
            Some("kind") => {
                let text = field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read scan kind: {}", e))
                })?;
                kind = text.parse().map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;
            }
            _ => {}
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Multipart form must include an image".to_string()))?;

    let outcome = app_state.tracker.scan_image(&image, kind).await.map_err(core_error)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Look up a barcode and record the matching product.
#[utoipa::path(
    post,
    path = "/scans/barcode",
    request_body = BarcodeRequest,
    responses((status = 201, description = "Scan recorded"))
)]
pub async fn scan_barcode_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<BarcodeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let symbology = request.symbology.unwrap_or(Symbology::Ean13);
    let outcome = app_state
        .tracker
        .scan_barcode(&request.code, symbology)
        .await
        .map_err(core_error)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Record already-analyzed objects as a scan.
#[utoipa::path(
    post,
    path = "/scans",
    request_body = ManualScanRequest,
    responses(
        (status = 201, description = "Scan recorded"),
        (status = 422, description = "An object's carbon estimate is implausibly large")
    )
)]
pub async fn record_scan_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ManualScanRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let kind = request.kind.unwrap_or(ScanKind::Manual);
    let objects = request
        .objects
        .into_iter()
        .map(|mut object| {
            object.carbon_kg = object.carbon_kg.max(Decimal::ZERO);
            object
        })
        .collect();
    let outcome = app_state
        .tracker
        .record_scan(kind, objects)
        .await
        .map_err(core_error)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List the scan history, newest first.
#[utoipa::path(get, path = "/scans", responses((status = 200, description = "Scan history")))]
pub async fn list_scans_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let records = app_state.tracker.history().await.map_err(core_error)?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/scans/{id}",
    params(("id" = Uuid, Path, description = "The scan id.")),
    responses(
        (status = 200, description = "The scan"),
        (status = 404, description = "No scan with this id")
    )
)]
pub async fn get_scan_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let record = app_state.tracker.find_scan(id).await.map_err(core_error)?;
    record
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Scan {} not found", id)))
}

/// Delete a scan. Deleting an unknown id succeeds without effect.
#[utoipa::path(
    delete,
    path = "/scans/{id}",
    params(("id" = Uuid, Path, description = "The scan id.")),
    responses((status = 204, description = "Scan deleted"))
)]
pub async fn delete_scan_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    app_state.tracker.remove_scan(id).await.map_err(core_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the whole scan history.
#[utoipa::path(delete, path = "/scans", responses((status = 204, description = "History cleared")))]
pub async fn clear_scans_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, HandlerError> {
    app_state.tracker.clear_history().await.map_err(core_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reload history and profile from storage.
#[utoipa::path(post, path = "/scans/refresh", responses((status = 204, description = "Reloaded")))]
pub async fn refresh_handler(State(app_state): State<Arc<AppState>>) -> Result<StatusCode, HandlerError> {
    app_state.tracker.refresh().await.map_err(core_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Totals, level and budget status.
#[utoipa::path(get, path = "/summary", responses((status = 200, description = "Aggregated history")))]
pub async fn overview_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let tracker = &app_state.tracker;
    let summary = tracker.summary().await.map_err(core_error)?;
    let level = tracker.level().await.map_err(core_error)?;
    let budget = tracker.budget_status().await.map_err(core_error)?;
    Ok(Json(OverviewResponse { summary, level, budget }))
}

#[utoipa::path(get, path = "/profile", responses((status = 200, description = "The user profile")))]
pub async fn get_profile_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let profile = app_state.tracker.profile().await.map_err(core_error)?;
    Ok(Json(profile))
}

/// Replace the user's goals and defaults.
#[utoipa::path(
    put,
    path = "/profile/settings",
    request_body(content_type = "application/json", description = "The complete settings object."),
    responses(
        (status = 200, description = "Updated profile"),
        (status = 422, description = "Settings failed validation")
    )
)]
pub async fn update_settings_handler(
    State(app_state): State<Arc<AppState>>,
    Json(settings): Json<UserSettings>,
) -> Result<impl IntoResponse, HandlerError> {
    let profile = app_state.tracker.update_settings(settings).await.map_err(core_error)?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/profile/name",
    request_body = RenameRequest,
    responses((status = 200, description = "Updated profile"))
)]
pub async fn rename_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<RenameRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let profile = app_state.tracker.rename(&request.display_name).await.map_err(core_error)?;
    Ok(Json(profile))
}

/// Reset goals, streaks and achievements. History is kept.
#[utoipa::path(post, path = "/profile/reset", responses((status = 200, description = "Reset profile")))]
pub async fn reset_profile_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let profile = app_state.tracker.reset_profile().await.map_err(core_error)?;
    Ok(Json(profile))
}

/// Estimate a trip without recording it.
#[utoipa::path(
    post,
    path = "/trips/estimate",
    request_body = TripRequest,
    responses((status = 200, description = "Trip estimate with alternatives"))
)]
pub async fn estimate_trip_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<TripRequest>,
) -> Json<TripEstimate> {
    let mode = TransportMode::parse_lossy(&request.mode);
    Json(
        app_state
            .tracker
            .plan_trip(&request.origin, &request.destination, mode)
            .await,
    )
}

/// Estimate a trip and record it in the history.
#[utoipa::path(
    post,
    path = "/trips",
    request_body = TripRequest,
    responses((status = 201, description = "Trip recorded"))
)]
pub async fn log_trip_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<TripRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mode = TransportMode::parse_lossy(&request.mode);
    let (trip, outcome) = app_state
        .tracker
        .log_trip(&request.origin, &request.destination, mode)
        .await
        .map_err(core_error)?;
    Ok((StatusCode::CREATED, Json(LoggedTripResponse { trip, outcome })))
}

/// Compare transport modes over a distance, cheapest first.
#[utoipa::path(
    get,
    path = "/trips/alternatives",
    params(
        ("distance_km" = f64, Query, description = "Trip distance in kilometres."),
        ("exclude" = Option<String>, Query, description = "Mode to leave out.")
    ),
    responses(
        (status = 200, description = "Alternatives sorted by carbon"),
        (status = 400, description = "Distance is not a usable number")
    )
)]
pub async fn alternatives_handler(Query(query): Query<AlternativesQuery>) -> Result<impl IntoResponse, HandlerError> {
    let distance = Decimal::try_from(query.distance_km)
        .ok()
        .filter(|d| *d >= Decimal::ZERO)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "distance_km must be a non-negative number".to_string()))?;
    let excluded = query
        .exclude
        .as_deref()
        .map_or(TransportMode::Plane, TransportMode::parse_lossy);
    Ok(Json(compare_alternatives(distance.round_dp(3), excluded)))
}
