//! History aggregation engine.
//!
//! Owns the in-memory, newest-first view of the scan history and the
//! `HistorySummary` cache derived from it. Every mutation is persisted first
//! and only applied in memory once the store accepted it.
//!
//! Adding a scan updates the summary incrementally. Removing a scan recomputes
//! the summary from scratch over the remaining records instead of subtracting,
//! so repeated add/remove cycles can never drift away from
//! `compute_summary(records)`. Keep that asymmetry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{add_carbon, round2, AnalyzedObject, HistorySummary, ObjectFrequency, ScanKind, ScanRecord};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, ScanStore};

/// Number of entries kept in `HistorySummary::top_objects`.
pub const TOP_OBJECTS: usize = 5;

//=========================================================================================
// Pure Aggregation
//=========================================================================================

/// Aggregates the full record collection from scratch.
pub fn compute_summary(records: &[ScanRecord]) -> HistorySummary {
    let mut summary = HistorySummary::default();
    for record in records {
        accumulate(&mut summary, record);
    }
    finalize(&mut summary);
    summary
}

/// The summary after adding `record` to a history summarized by `summary`.
pub fn summary_with(summary: &HistorySummary, record: &ScanRecord) -> HistorySummary {
    let mut next = summary.clone();
    accumulate(&mut next, record);
    finalize(&mut next);
    next
}

fn accumulate(summary: &mut HistorySummary, record: &ScanRecord) {
    summary.total_scans += 1;
    summary.total_objects += record.objects.len() as u32;
    summary.total_carbon_kg = round2(add_carbon(summary.total_carbon_kg, record.total_carbon_kg));
    for object in &record.objects {
        let total = summary.category_totals.entry(object.category).or_insert(Decimal::ZERO);
        *total = add_carbon(*total, object.carbon_kg);
        *summary.object_frequencies.entry(normalize_name(&object.name)).or_insert(0) += 1;
    }
}

fn finalize(summary: &mut HistorySummary) {
    summary.average_carbon_per_scan = if summary.total_scans == 0 {
        Decimal::ZERO
    } else {
        (summary.total_carbon_kg / Decimal::from(summary.total_scans)).normalize()
    };

    let mut ranked: Vec<ObjectFrequency> = summary
        .object_frequencies
        .iter()
        .map(|(name, count)| ObjectFrequency { name: name.clone(), count: *count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_OBJECTS);
    summary.top_objects = ranked;
}

/// Compares the persisted fields at stored precision. Averages and rankings
/// follow from these, and float round-trips may perturb the exact decimals.
fn agrees(stored: &HistorySummary, derived: &HistorySummary) -> bool {
    stored.total_scans == derived.total_scans
        && stored.total_objects == derived.total_objects
        && stored.total_carbon_kg.round_dp(2) == derived.total_carbon_kg
        && stored.object_frequencies == derived.object_frequencies
        && stored.rounded_category_totals() == derived.rounded_category_totals()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

//=========================================================================================
// In-Memory Book
//=========================================================================================

/// The records and their summary, as held while the engine is ready.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryBook {
    records: Vec<ScanRecord>,
    summary: HistorySummary,
}

impl HistoryBook {
    /// Builds a book from stored state. A missing or stale stored summary is
    /// replaced by one derived from the records.
    pub fn from_stored(records: Vec<ScanRecord>, stored: Option<HistorySummary>) -> Self {
        let summary = compute_summary(&records);
        if stored.is_some_and(|stored| !agrees(&stored, &summary)) {
            warn!("Stored history summary diverged from the records; using the recomputed one.");
        }
        Self { records, summary }
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn summary(&self) -> &HistorySummary {
        &self.summary
    }
}

//=========================================================================================
// Engine
//=========================================================================================

enum Lifecycle {
    Uninitialized,
    Ready(HistoryBook),
}

/// Serialized, store-backed owner of the scan history.
pub struct HistoryEngine {
    store: Arc<dyn ScanStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<Lifecycle>,
}

impl HistoryEngine {
    pub fn new(store: Arc<dyn ScanStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            state: Mutex::new(Lifecycle::Uninitialized),
        }
    }

    /// Loads the history from the store and makes the engine ready.
    pub async fn initialize(&self) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let book = self.load().await?;
        info!(scans = book.records.len(), "History engine ready.");
        *state = Lifecycle::Ready(book);
        Ok(())
    }

    /// Drops the in-memory state; later calls fail until re-initialized.
    pub async fn shutdown(&self) {
        *self.state.lock().await = Lifecycle::Uninitialized;
        info!("History engine shut down.");
    }

    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.lock().await, Lifecycle::Ready(_))
    }

    /// Reloads records and summary from the store, replacing in-memory state.
    pub async fn refresh(&self) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        ready(&mut state)?;
        let book = self.load().await?;
        *state = Lifecycle::Ready(book);
        Ok(())
    }

    /// Records a scan. An empty object list yields a zero-carbon record.
    pub async fn add_scan(&self, kind: ScanKind, objects: Vec<AnalyzedObject>) -> CoreResult<ScanRecord> {
        let mut state = self.state.lock().await;
        let book = ready(&mut state)?;

        let record = ScanRecord::new(kind, objects, self.clock.now());
        let summary = summary_with(&book.summary, &record);
        self.store.save_scan_record(&record, &summary).await?;

        debug!(id = %record.id, carbon = %record.total_carbon_kg, "Scan recorded.");
        book.records.insert(0, record.clone());
        book.summary = summary;
        Ok(record)
    }

    /// Deletes a scan; unknown ids are a silent no-op and return `None`.
    pub async fn remove_scan(&self, id: Uuid) -> CoreResult<Option<ScanRecord>> {
        let mut state = self.state.lock().await;
        let book = ready(&mut state)?;

        let Some(position) = book.records.iter().position(|r| r.id == id) else {
            debug!(%id, "Scan to remove was not found.");
            return Ok(None);
        };

        let mut remaining = book.records.clone();
        let removed = remaining.remove(position);
        let summary = compute_summary(&remaining);
        self.store.delete_scan_record(id, &summary).await?;

        book.records = remaining;
        book.summary = summary;
        Ok(Some(removed))
    }

    pub async fn clear_all(&self) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let book = ready(&mut state)?;
        self.store.clear_scan_history().await?;
        *book = HistoryBook::default();
        info!("Scan history cleared.");
        Ok(())
    }

    pub async fn records(&self) -> CoreResult<Vec<ScanRecord>> {
        let mut state = self.state.lock().await;
        Ok(ready(&mut state)?.records.clone())
    }

    pub async fn summary(&self) -> CoreResult<HistorySummary> {
        let mut state = self.state.lock().await;
        Ok(ready(&mut state)?.summary.clone())
    }

    /// Records and summary taken under one lock.
    pub async fn snapshot(&self) -> CoreResult<HistoryBook> {
        let mut state = self.state.lock().await;
        Ok(ready(&mut state)?.clone())
    }

    pub async fn find(&self, id: Uuid) -> CoreResult<Option<ScanRecord>> {
        let mut state = self.state.lock().await;
        Ok(ready(&mut state)?.records.iter().find(|r| r.id == id).cloned())
    }

    /// Records scanned at or after `since`, newest first.
    pub async fn records_since(&self, since: DateTime<Utc>) -> CoreResult<Vec<ScanRecord>> {
        let mut state = self.state.lock().await;
        Ok(ready(&mut state)?
            .records
            .iter()
            .filter(|r| r.scanned_at >= since)
            .cloned()
            .collect())
    }

    async fn load(&self) -> CoreResult<HistoryBook> {
        let mut records = self.store.get_scan_history().await?;
        records.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        let stored = self.store.get_history_summary().await?;
        Ok(HistoryBook::from_stored(records, stored))
    }
}

fn ready(state: &mut Lifecycle) -> CoreResult<&mut HistoryBook> {
    match state {
        Lifecycle::Ready(book) => Ok(book),
        Lifecycle::Uninitialized => {
            error!("History engine used before initialization.");
            Err(CoreError::NotInitialized)
        }
    }
}
