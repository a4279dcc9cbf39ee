pub mod analysis;
pub mod domain;
pub mod error;
pub mod estimation;
pub mod gamification;
pub mod history;
pub mod ports;
pub mod tracker;
pub mod trips;

#[cfg(test)]
mod testing;

pub use domain::{
    Achievement, AnalyzedObject, Category, EstimateSource, HistorySummary, ModeEstimate, ScanKind, ScanRecord,
    Symbology, TransportMode, TripEstimate, UserLevel, UserProfile, UserSettings,
};
pub use error::{CoreError, CoreResult};
pub use ports::{
    BarcodeLookupService, Clock, DirectionsOutcome, DirectionsService, PortError, PortResult, RouteInfo, ScanStore,
    SystemClock, VisionAnalysisService,
};
pub use tracker::{BudgetStatus, CarbonTracker, Collaborators, ScanOutcome};
