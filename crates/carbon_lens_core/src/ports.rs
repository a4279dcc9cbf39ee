//! crates/carbon_lens_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, so the core
//! stays independent of the concrete store, vision model, barcode database and
//! mapping provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{AnalyzedObject, HistorySummary, ScanRecord, Symbology, TransportMode, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistent Store
//=========================================================================================

/// Key-based persistence for scan records, the summary cache and the profile.
///
/// Record writes carry the summary that results from them so an adapter can
/// commit both in one transaction.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// All records, newest first.
    async fn get_scan_history(&self) -> PortResult<Vec<ScanRecord>>;

    async fn save_scan_record(&self, record: &ScanRecord, summary: &HistorySummary) -> PortResult<()>;

    /// Deleting an unknown id is not an error.
    async fn delete_scan_record(&self, id: Uuid, summary: &HistorySummary) -> PortResult<()>;

    /// Removes every record and resets the stored summary.
    async fn clear_scan_history(&self) -> PortResult<()>;

    async fn get_history_summary(&self) -> PortResult<Option<HistorySummary>>;

    async fn get_user_profile(&self) -> PortResult<Option<UserProfile>>;

    async fn save_user_profile(&self, profile: &UserProfile) -> PortResult<()>;
}

//=========================================================================================
// Analysis Services
//=========================================================================================

#[async_trait]
pub trait VisionAnalysisService: Send + Sync {
    /// Identifies the objects in a base64-encoded image according to `instruction`.
    async fn analyze(&self, image_base64: &str, instruction: &str) -> PortResult<Vec<AnalyzedObject>>;
}

#[async_trait]
pub trait BarcodeLookupService: Send + Sync {
    /// Looks up a scanned code. Zero matches is a valid, empty answer.
    async fn lookup(&self, code: &str, symbology: Symbology) -> PortResult<Vec<AnalyzedObject>>;
}

//=========================================================================================
// Mapping Service
//=========================================================================================

/// A route as reported by the mapping provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub distance_km: Decimal,
    pub duration_min: u32,
    pub origin_address: String,
    pub destination_address: String,
}

/// Either a route, or the signal that the provider is not configured or failed.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectionsOutcome {
    Route(RouteInfo),
    Unavailable,
}

#[async_trait]
pub trait DirectionsService: Send + Sync {
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        mode: TransportMode,
    ) -> PortResult<DirectionsOutcome>;
}

//=========================================================================================
// Clock
//=========================================================================================

/// Source of "now", injectable so streaks can be tested against fixed dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
