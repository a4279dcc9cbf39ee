//! services/api/src/adapters/memory.rs
//!
//! A process-local `ScanStore`, used when no `DATABASE_URL` is configured and
//! in the router tests. Data does not survive a restart.

use async_trait::async_trait;
use carbon_lens_core::domain::{HistorySummary, ScanRecord, UserProfile};
use carbon_lens_core::ports::{PortResult, ScanStore};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Contents {
    records: Vec<ScanRecord>,
    summary: Option<HistorySummary>,
    profile: Option<UserProfile>,
}

#[derive(Default)]
pub struct MemoryStore {
    contents: RwLock<Contents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn get_scan_history(&self) -> PortResult<Vec<ScanRecord>> {
        Ok(self.contents.read().await.records.clone())
    }

    async fn save_scan_record(&self, record: &ScanRecord, summary: &HistorySummary) -> PortResult<()> {
        let mut contents = self.contents.write().await;
        contents.records.insert(0, record.clone());
        contents.summary = Some(summary.clone());
        Ok(())
    }

    async fn delete_scan_record(&self, id: Uuid, summary: &HistorySummary) -> PortResult<()> {
        let mut contents = self.contents.write().await;
        contents.records.retain(|r| r.id != id);
        contents.summary = Some(summary.clone());
        Ok(())
    }

    async fn clear_scan_history(&self) -> PortResult<()> {
        let mut contents = self.contents.write().await;
        contents.records.clear();
        contents.summary = Some(HistorySummary::default());
        Ok(())
    }

    async fn get_history_summary(&self) -> PortResult<Option<HistorySummary>> {
        Ok(self.contents.read().await.summary.clone())
    }

    async fn get_user_profile(&self) -> PortResult<Option<UserProfile>> {
        Ok(self.contents.read().await.profile.clone())
    }

    async fn save_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        self.contents.write().await.profile = Some(profile.clone());
        Ok(())
    }
}
