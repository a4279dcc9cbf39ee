//! crates/carbon_lens_core/src/tracker.rs
//!
//! The application-facing service. One `CarbonTracker` is constructed at
//! startup with its collaborators, initialized once, and shared by reference.
//! Every history or profile operation is rejected with
//! `CoreError::NotInitialized` until `initialize()` has completed.

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::{analyze_image, lookup_barcode};
use crate::domain::{
    add_carbon, round2, Achievement, AnalyzedObject, HistorySummary, ScanKind, ScanRecord, Symbology, TransportMode,
    TripEstimate, UserLevel, UserProfile, UserSettings, MAX_OBJECT_CARBON_KG,
};
use crate::error::{CoreError, CoreResult};
use crate::gamification::{apply_scan, carbon_on, derive_level, refresh_achievements};
use crate::history::HistoryEngine;
use crate::ports::{BarcodeLookupService, Clock, DirectionsService, ScanStore, VisionAnalysisService};
use crate::trips::{plan_trip, trip_object};

/// The external services the tracker talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub vision: Arc<dyn VisionAnalysisService>,
    pub barcodes: Arc<dyn BarcodeLookupService>,
    pub directions: Arc<dyn DirectionsService>,
}

/// Everything a caller needs to refresh its view after a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub record: ScanRecord,
    pub summary: HistorySummary,
    pub level: UserLevel,
    pub unlocked: Vec<Achievement>,
}

/// Carbon logged against the user's budgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub today_kg: Decimal,
    pub daily_budget_kg: Decimal,
    pub last_7_days_kg: Decimal,
    pub weekly_budget_kg: Decimal,
    pub over_daily_budget: bool,
    pub over_weekly_budget: bool,
}

pub struct CarbonTracker {
    store: Arc<dyn ScanStore>,
    clock: Arc<dyn Clock>,
    collaborators: Collaborators,
    history: HistoryEngine,
    default_display_name: String,
    /// `None` until initialized.
    profile: Mutex<Option<UserProfile>>,
    /// Serializes every mutating flow so history and profile move together.
    ops: Mutex<()>,
}

impl CarbonTracker {
    pub fn new(
        store: Arc<dyn ScanStore>,
        clock: Arc<dyn Clock>,
        collaborators: Collaborators,
        default_display_name: impl Into<String>,
    ) -> Self {
        Self {
            history: HistoryEngine::new(store.clone(), clock.clone()),
            store,
            clock,
            collaborators,
            default_display_name: default_display_name.into(),
            profile: Mutex::new(None),
            ops: Mutex::new(()),
        }
    }

    //=====================================================================================
    // Lifecycle
    //=====================================================================================

    /// Loads history and profile, creating the profile on first use.
    pub async fn initialize(&self) -> CoreResult<()> {
        let _guard = self.ops.lock().await;
        self.history.initialize().await?;

        // History is only ready together with the profile.
        let profile = match self.load_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                error!("Failed to load the user profile: {}", e);
                self.history.shutdown().await;
                return Err(e);
            }
        };

        *self.profile.lock().await = Some(profile);
        info!("Carbon tracker initialized.");
        Ok(())
    }

    async fn load_profile(&self) -> CoreResult<UserProfile> {
        let mut profile = match self.store.get_user_profile().await? {
            Some(profile) => profile,
            None => {
                info!("No stored profile; creating one.");
                UserProfile::new(self.default_display_name.clone(), self.clock.now())
            }
        };
        let book = self.history.snapshot().await?;
        refresh_achievements(&mut profile, book.summary(), book.records(), self.clock.now());
        self.store.save_user_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn shutdown(&self) {
        let _guard = self.ops.lock().await;
        self.history.shutdown().await;
        *self.profile.lock().await = None;
        info!("Carbon tracker shut down.");
    }

    pub async fn is_ready(&self) -> bool {
        self.profile.lock().await.is_some()
    }

    /// Reloads history and profile from the store.
    pub async fn refresh(&self) -> CoreResult<()> {
        let _guard = self.ops.lock().await;
        let mut slot = self.profile.lock().await;
        ensure_ready(&slot)?;
        self.history.refresh().await?;
        if let Some(stored) = self.store.get_user_profile().await? {
            *slot = Some(stored);
        }
        Ok(())
    }

    //=====================================================================================
    // Scanning
    //=====================================================================================

    /// Analyzes an image and records whatever was found.
    pub async fn scan_image(&self, image: &[u8], kind: ScanKind) -> CoreResult<ScanOutcome> {
        self.profile().await?;
        let objects = analyze_image(self.collaborators.vision.as_ref(), image, kind).await;
        self.record_scan(kind, objects).await
    }

    /// Looks up a barcode and records the matching products.
    pub async fn scan_barcode(&self, code: &str, symbology: Symbology) -> CoreResult<ScanOutcome> {
        self.profile().await?;
        let objects = lookup_barcode(self.collaborators.barcodes.as_ref(), code, symbology).await;
        self.record_scan(ScanKind::Barcode, objects).await
    }

    /// Records already-analyzed objects and updates the profile.
    pub async fn record_scan(&self, kind: ScanKind, objects: Vec<AnalyzedObject>) -> CoreResult<ScanOutcome> {
        validate_objects(&objects)?;
        let _guard = self.ops.lock().await;
        let mut slot = self.profile.lock().await;
        let mut profile = ensure_ready(&slot)?.clone();

        let record = self.history.add_scan(kind, objects).await?;
        let book = self.history.snapshot().await?;
        let unlocked = apply_scan(&mut profile, &record, book.summary(), book.records(), self.clock.now());
        if let Err(e) = self.store.save_user_profile(&profile).await {
            warn!(id = %record.id, "Scan saved but profile update failed: {}", e);
            return Err(e.into());
        }

        for achievement in &unlocked {
            info!(id = %achievement.id, "Achievement unlocked.");
        }
        *slot = Some(profile);
        Ok(ScanOutcome {
            level: derive_level(book.summary().total_scans),
            summary: book.summary().clone(),
            record,
            unlocked,
        })
    }

    //=====================================================================================
    // Trips
    //=====================================================================================

    /// Estimates a trip without recording it.
    pub async fn plan_trip(&self, origin: &str, destination: &str, mode: TransportMode) -> TripEstimate {
        plan_trip(self.collaborators.directions.as_ref(), origin, destination, mode).await
    }

    /// Estimates a trip and records it as a transport scan.
    pub async fn log_trip(
        &self,
        origin: &str,
        destination: &str,
        mode: TransportMode,
    ) -> CoreResult<(TripEstimate, ScanOutcome)> {
        self.profile().await?;
        let trip = self.plan_trip(origin, destination, mode).await;
        let outcome = self.record_scan(ScanKind::Trip, vec![trip_object(&trip)]).await?;
        Ok((trip, outcome))
    }

    //=====================================================================================
    // History
    //=====================================================================================

    /// Deletes a scan. Unknown ids are a no-op.
    pub async fn remove_scan(&self, id: Uuid) -> CoreResult<Option<ScanRecord>> {
        let _guard = self.ops.lock().await;
        let mut slot = self.profile.lock().await;
        let mut profile = ensure_ready(&slot)?.clone();

        let removed = self.history.remove_scan(id).await?;
        if removed.is_some() {
            self.settle_profile(&mut profile).await?;
            *slot = Some(profile);
        }
        Ok(removed)
    }

    pub async fn clear_history(&self) -> CoreResult<()> {
        let _guard = self.ops.lock().await;
        let mut slot = self.profile.lock().await;
        let mut profile = ensure_ready(&slot)?.clone();

        self.history.clear_all().await?;
        self.settle_profile(&mut profile).await?;
        *slot = Some(profile);
        Ok(())
    }

    pub async fn history(&self) -> CoreResult<Vec<ScanRecord>> {
        self.history.records().await
    }

    pub async fn find_scan(&self, id: Uuid) -> CoreResult<Option<ScanRecord>> {
        self.history.find(id).await
    }

    pub async fn summary(&self) -> CoreResult<HistorySummary> {
        self.history.summary().await
    }

    pub async fn level(&self) -> CoreResult<UserLevel> {
        Ok(derive_level(self.history.summary().await?.total_scans))
    }

    /// Today's and the trailing week's carbon against the configured budgets.
    pub async fn budget_status(&self) -> CoreResult<BudgetStatus> {
        let settings = self.profile().await?.settings;
        let now = self.clock.now();
        let today_kg = carbon_on(&self.history.records().await?, now.date_naive());
        let week = self
            .history
            .records_since(now - Duration::days(7))
            .await?
            .iter()
            .fold(Decimal::ZERO, |acc, r| add_carbon(acc, r.total_carbon_kg));
        let last_7_days_kg = round2(week);
        Ok(BudgetStatus {
            over_daily_budget: today_kg > settings.daily_carbon_budget_kg,
            over_weekly_budget: last_7_days_kg > settings.weekly_carbon_budget_kg,
            today_kg,
            daily_budget_kg: settings.daily_carbon_budget_kg,
            last_7_days_kg,
            weekly_budget_kg: settings.weekly_carbon_budget_kg,
        })
    }

    //=====================================================================================
    // Profile
    //=====================================================================================

    pub async fn profile(&self) -> CoreResult<UserProfile> {
        let slot = self.profile.lock().await;
        ensure_ready(&slot).cloned()
    }

    pub async fn update_settings(&self, settings: UserSettings) -> CoreResult<UserProfile> {
        validate_settings(&settings)?;
        self.mutate_profile(|profile| {
            profile.settings = settings;
            Ok(())
        })
        .await
    }

    pub async fn rename(&self, display_name: &str) -> CoreResult<UserProfile> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidSettings("display name cannot be empty".to_string()));
        }
        let name = name.to_string();
        self.mutate_profile(move |profile| {
            profile.display_name = name;
            Ok(())
        })
        .await
    }

    /// Resets goals, streaks, totals and achievements. History is untouched.
    pub async fn reset_profile(&self) -> CoreResult<UserProfile> {
        self.mutate_profile(|profile| {
            profile.reset();
            Ok(())
        })
        .await
    }

    async fn mutate_profile<F>(&self, change: F) -> CoreResult<UserProfile>
    where
        F: FnOnce(&mut UserProfile) -> CoreResult<()>,
    {
        let _guard = self.ops.lock().await;
        let mut slot = self.profile.lock().await;
        let mut profile = ensure_ready(&slot)?.clone();
        change(&mut profile)?;
        self.store.save_user_profile(&profile).await?;
        *slot = Some(profile.clone());
        Ok(profile)
    }

    /// Re-evaluates achievements after history shrank and persists the profile.
    async fn settle_profile(&self, profile: &mut UserProfile) -> CoreResult<()> {
        let book = self.history.snapshot().await?;
        refresh_achievements(profile, book.summary(), book.records(), self.clock.now());
        self.store.save_user_profile(profile).await?;
        Ok(())
    }
}

fn ensure_ready(slot: &Option<UserProfile>) -> CoreResult<&UserProfile> {
    slot.as_ref().ok_or_else(|| {
        error!("Carbon tracker used before initialization.");
        CoreError::NotInitialized
    })
}

fn validate_objects(objects: &[AnalyzedObject]) -> CoreResult<()> {
    let cap = Decimal::from(MAX_OBJECT_CARBON_KG);
    match objects.iter().find(|o| o.carbon_kg > cap) {
        Some(object) => Err(CoreError::InvalidScan(format!(
            "'{}' exceeds {} kg CO2e",
            object.name, MAX_OBJECT_CARBON_KG
        ))),
        None => Ok(()),
    }
}

fn validate_settings(settings: &UserSettings) -> CoreResult<()> {
    if settings.daily_carbon_budget_kg < Decimal::ZERO || settings.weekly_carbon_budget_kg < Decimal::ZERO {
        return Err(CoreError::InvalidSettings("carbon budgets cannot be negative".to_string()));
    }
    if settings.reduction_target_percent > 100 {
        return Err(CoreError::InvalidSettings("reduction target must be between 0 and 100".to_string()));
    }
    if settings.streak_goal_days == 0 {
        return Err(CoreError::InvalidSettings("streak goal must be at least one day".to_string()));
    }
    if settings.home_energy.household_size == 0 {
        return Err(CoreError::InvalidSettings("household size must be at least one".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, EstimateSource};
    use crate::ports::DirectionsOutcome;
    use crate::testing::{food, kg, noon, FakeStore, FixedClock, ScriptedAnalyzer, ScriptedDirections};

    struct Harness {
        store: Arc<FakeStore>,
        clock: Arc<FixedClock>,
        tracker: CarbonTracker,
    }

    fn harness_with(vision: ScriptedAnalyzer) -> Harness {
        let store = Arc::new(FakeStore::default());
        let clock = Arc::new(FixedClock::at(noon(2026, 4, 1)));
        let collaborators = Collaborators {
            vision: Arc::new(vision),
            barcodes: Arc::new(ScriptedAnalyzer::answering(vec![AnalyzedObject::new(
                "Oat milk",
                Category::Beverage,
                kg(9, 1),
            )])),
            directions: Arc::new(ScriptedDirections(Some(DirectionsOutcome::Unavailable))),
        };
        let tracker = CarbonTracker::new(store.clone(), clock.clone(), collaborators, "Eco Friend");
        Harness { store, clock, tracker }
    }

    fn harness() -> Harness {
        harness_with(ScriptedAnalyzer::answering(vec![
            food("Burger", kg(35, 1)),
            food("Fries", kg(6, 1)),
        ]))
    }

    async fn ready() -> Harness {
        let h = harness();
        h.tracker.initialize().await.unwrap();
        h
    }

    #[tokio::test]
    async fn rejects_use_before_initialize() {
        let h = harness();
        assert!(!h.tracker.is_ready().await);
        assert!(matches!(h.tracker.profile().await, Err(CoreError::NotInitialized)));
        assert!(matches!(
            h.tracker.scan_image(b"img", ScanKind::Meal).await,
            Err(CoreError::NotInitialized)
        ));
        assert!(matches!(h.tracker.summary().await, Err(CoreError::NotInitialized)));
        assert!(matches!(h.tracker.clear_history().await, Err(CoreError::NotInitialized)));
        assert!(h.store.stored_records().is_empty());
    }

    #[tokio::test]
    async fn initialize_creates_and_persists_profile() {
        let h = ready().await;
        let profile = h.tracker.profile().await.unwrap();
        assert_eq!(profile.display_name, "Eco Friend");
        assert_eq!(profile.joined_at, noon(2026, 4, 1));
        assert_eq!(h.store.stored_profile(), Some(profile));
    }

    #[tokio::test]
    async fn image_scan_flows_into_profile() {
        let h = ready().await;
        let outcome = h.tracker.scan_image(b"jpeg-bytes", ScanKind::Meal).await.unwrap();

        assert_eq!(outcome.record.total_carbon_kg, kg(41, 1));
        assert_eq!(outcome.summary.total_objects, 2);
        assert_eq!(outcome.level.level, 1);
        assert_eq!(outcome.unlocked.len(), 1);
        assert_eq!(outcome.unlocked[0].id, "first_scan");

        let profile = h.tracker.profile().await.unwrap();
        assert_eq!(profile.current_streak, 1);
        assert_eq!(profile.lifetime_scans, 1);
        assert_eq!(h.store.stored_profile(), Some(profile));
    }

    #[tokio::test]
    async fn vision_failure_records_an_empty_scan() {
        let h = harness_with(ScriptedAnalyzer::failing());
        h.tracker.initialize().await.unwrap();
        let outcome = h.tracker.scan_image(b"jpeg", ScanKind::Product).await.unwrap();
        assert!(outcome.record.objects.is_empty());
        assert_eq!(outcome.record.total_carbon_kg, Decimal::ZERO);
    }

    #[tokio::test]
    async fn barcode_scan_is_recorded() {
        let h = ready().await;
        let outcome = h.tracker.scan_barcode("5000000000001", Symbology::Ean13).await.unwrap();
        assert_eq!(outcome.record.kind, ScanKind::Barcode);
        assert_eq!(outcome.summary.category_totals[&Category::Beverage], kg(9, 1));
    }

    #[tokio::test]
    async fn streak_grows_across_days_and_resets_after_gap() {
        let h = ready().await;
        for _ in 0..3 {
            h.tracker.record_scan(ScanKind::Manual, vec![food("tea", kg(1, 1))]).await.unwrap();
            h.clock.advance_days(1);
        }
        assert_eq!(h.tracker.profile().await.unwrap().current_streak, 3);

        h.clock.advance_days(2);
        h.tracker.record_scan(ScanKind::Manual, vec![food("tea", kg(1, 1))]).await.unwrap();
        let profile = h.tracker.profile().await.unwrap();
        assert_eq!(profile.current_streak, 1);
        assert_eq!(profile.longest_streak, 3);
    }

    #[tokio::test]
    async fn removing_scans_keeps_unlocks_and_lifetime_totals() {
        let h = ready().await;
        let outcome = h.tracker.record_scan(ScanKind::Manual, vec![food("tea", kg(1, 1))]).await.unwrap();
        h.tracker.remove_scan(outcome.record.id).await.unwrap();

        let profile = h.tracker.profile().await.unwrap();
        assert_eq!(h.tracker.summary().await.unwrap().total_scans, 0);
        assert_eq!(profile.lifetime_scans, 1);
        assert!(profile.achievements.iter().find(|a| a.id == "first_scan").unwrap().unlocked);

        h.tracker.clear_history().await.unwrap();
        assert!(h.tracker.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_trip_falls_back_and_enters_history() {
        let h = ready().await;
        let (trip, outcome) = h.tracker.log_trip("home", "gym", TransportMode::Bus).await.unwrap();
        assert_eq!(trip.source, EstimateSource::Fallback);
        assert_eq!(outcome.record.kind, ScanKind::Trip);
        assert_eq!(outcome.record.total_carbon_kg, kg(89, 2));
        assert_eq!(outcome.summary.category_totals[&Category::Transport], kg(89, 2));
    }

    #[tokio::test]
    async fn failed_history_write_changes_nothing() {
        let h = ready().await;
        let before = h.tracker.profile().await.unwrap();
        h.store.set_fail_writes(true);

        assert!(h.tracker.record_scan(ScanKind::Manual, Vec::new()).await.is_err());
        assert!(h.tracker.rename("Robin").await.is_err());
        assert_eq!(h.tracker.profile().await.unwrap(), before);
        assert!(h.tracker.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_profile_write_keeps_scan_and_cached_profile() {
        let h = ready().await;
        let before = h.tracker.profile().await.unwrap();
        h.store.set_fail_profile_writes(true);

        let err = h
            .tracker
            .record_scan(ScanKind::Manual, vec![food("Tea", kg(2, 1))])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));

        let history = h.tracker.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(h.store.stored_records(), history);
        assert_eq!(h.tracker.profile().await.unwrap(), before);
        assert_eq!(h.store.stored_profile(), Some(before));

        h.store.set_fail_profile_writes(false);
        let outcome = h.tracker.record_scan(ScanKind::Manual, Vec::new()).await.unwrap();
        assert_eq!(outcome.summary.total_scans, 2);
        assert_eq!(h.tracker.profile().await.unwrap().lifetime_scans, 1);
    }

    #[tokio::test]
    async fn failed_profile_load_leaves_tracker_uninitialized() {
        let h = harness();
        h.store.set_fail_profile_writes(true);

        assert!(matches!(h.tracker.initialize().await, Err(CoreError::Persistence(_))));
        assert!(!h.tracker.is_ready().await);
        assert!(matches!(h.tracker.summary().await, Err(CoreError::NotInitialized)));
        assert!(matches!(h.tracker.history().await, Err(CoreError::NotInitialized)));
        assert!(matches!(h.tracker.level().await, Err(CoreError::NotInitialized)));
        assert!(matches!(
            h.tracker.find_scan(Uuid::new_v4()).await,
            Err(CoreError::NotInitialized)
        ));

        h.store.set_fail_profile_writes(false);
        h.tracker.initialize().await.unwrap();
        assert!(h.tracker.is_ready().await);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_loaded_state() {
        let h = ready().await;
        h.tracker.record_scan(ScanKind::Manual, vec![food("Tea", kg(2, 1))]).await.unwrap();
        let history = h.tracker.history().await.unwrap();
        let profile = h.tracker.profile().await.unwrap();

        h.store.set_fail_reads(true);
        assert!(matches!(h.tracker.refresh().await, Err(CoreError::Persistence(_))));
        assert!(h.tracker.is_ready().await);
        assert_eq!(h.tracker.history().await.unwrap(), history);
        assert_eq!(h.tracker.profile().await.unwrap(), profile);
    }

    #[tokio::test]
    async fn implausible_carbon_is_rejected_before_writing() {
        let h = ready().await;
        let huge = Decimal::from_i128_with_scale(5 * 10i128.pow(28), 0);
        let err = h
            .tracker
            .record_scan(ScanKind::Manual, vec![food("a", huge), food("b", huge)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidScan(_)));
        assert!(h.tracker.history().await.unwrap().is_empty());
        assert!(h.store.stored_records().is_empty());
    }

    #[tokio::test]
    async fn settings_are_validated_and_persisted() {
        let h = ready().await;
        let mut settings = UserSettings::default();
        settings.reduction_target_percent = 150;
        assert!(matches!(
            h.tracker.update_settings(settings.clone()).await,
            Err(CoreError::InvalidSettings(_))
        ));

        settings.reduction_target_percent = 30;
        settings.default_transport = TransportMode::Train;
        let profile = h.tracker.update_settings(settings.clone()).await.unwrap();
        assert_eq!(profile.settings, settings);
        assert_eq!(h.store.stored_profile().unwrap().settings, settings);

        assert!(h.tracker.rename("   ").await.is_err());
        assert_eq!(h.tracker.rename(" Robin ").await.unwrap().display_name, "Robin");
    }

    #[tokio::test]
    async fn reset_profile_keeps_history() {
        let h = ready().await;
        h.tracker.record_scan(ScanKind::Manual, vec![food("tea", kg(1, 1))]).await.unwrap();
        let profile = h.tracker.reset_profile().await.unwrap();
        assert_eq!(profile.lifetime_scans, 0);
        assert!(profile.achievements.iter().all(|a| !a.unlocked));
        assert_eq!(h.tracker.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn budget_status_compares_against_settings() {
        let h = ready().await;
        h.tracker.record_scan(ScanKind::Manual, vec![food("steak", kg(9, 0))]).await.unwrap();
        let status = h.tracker.budget_status().await.unwrap();
        assert_eq!(status.today_kg, kg(9, 0));
        assert!(status.over_daily_budget);
        assert!(!status.over_weekly_budget);
    }

    #[tokio::test]
    async fn concurrent_scans_are_serialized() {
        let h = ready().await;
        let scans = (0..8).map(|_| h.tracker.record_scan(ScanKind::Manual, vec![food("tea", kg(25, 2))]));
        let results = futures::future::join_all(scans).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let summary = h.tracker.summary().await.unwrap();
        assert_eq!(summary.total_scans, 8);
        assert_eq!(summary.total_carbon_kg, kg(2, 0));
        assert_eq!(h.tracker.profile().await.unwrap().lifetime_scans, 8);
    }

    #[tokio::test]
    async fn refresh_reloads_profile_and_shutdown_blocks_use() {
        let h = ready().await;
        h.tracker.record_scan(ScanKind::Manual, vec![food("tea", kg(1, 1))]).await.unwrap();
        h.tracker.refresh().await.unwrap();
        assert_eq!(h.tracker.profile().await.unwrap().lifetime_scans, 1);

        h.tracker.shutdown().await;
        assert!(matches!(h.tracker.level().await, Err(CoreError::NotInitialized)));
        h.tracker.initialize().await.unwrap();
        assert_eq!(h.tracker.history().await.unwrap().len(), 1);
    }
}
