//! Fakes shared by the unit tests of this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{AnalyzedObject, Category, HistorySummary, ScanRecord, Symbology, TransportMode, UserProfile};
use crate::ports::{
    BarcodeLookupService, Clock, DirectionsOutcome, DirectionsService, PortError, PortResult, ScanStore,
    VisionAnalysisService,
};

#[derive(Default)]
struct StoreData {
    records: Vec<ScanRecord>,
    summary: Option<HistorySummary>,
    profile: Option<UserProfile>,
}

/// In-memory store that can be told to fail its writes.
#[derive(Default)]
pub struct FakeStore {
    data: Mutex<StoreData>,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    /// Fails only `save_user_profile`, leaving history writes working.
    pub fail_profile_writes: AtomicBool,
    pub writes: AtomicUsize,
}

impl FakeStore {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_profile_writes(&self, fail: bool) {
        self.fail_profile_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored_records(&self) -> Vec<ScanRecord> {
        self.data.lock().unwrap().records.clone()
    }

    pub fn stored_summary(&self) -> Option<HistorySummary> {
        self.data.lock().unwrap().summary.clone()
    }

    pub fn stored_profile(&self) -> Option<UserProfile> {
        self.data.lock().unwrap().profile.clone()
    }

    /// Simulates another writer touching the store behind the engine's back.
    pub fn inject_record(&self, record: ScanRecord) {
        let mut data = self.data.lock().unwrap();
        data.records.insert(0, record);
    }

    pub fn overwrite_summary(&self, summary: HistorySummary) {
        self.data.lock().unwrap().summary = Some(summary);
    }

    fn check_write(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("write failed".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn check_read(&self) -> PortResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("read failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ScanStore for FakeStore {
    async fn get_scan_history(&self) -> PortResult<Vec<ScanRecord>> {
        self.check_read()?;
        Ok(self.data.lock().unwrap().records.clone())
    }

    async fn save_scan_record(&self, record: &ScanRecord, summary: &HistorySummary) -> PortResult<()> {
        self.check_write()?;
        let mut data = self.data.lock().unwrap();
        data.records.insert(0, record.clone());
        data.summary = Some(summary.clone());
        Ok(())
    }

    async fn delete_scan_record(&self, id: Uuid, summary: &HistorySummary) -> PortResult<()> {
        self.check_write()?;
        let mut data = self.data.lock().unwrap();
        data.records.retain(|r| r.id != id);
        data.summary = Some(summary.clone());
        Ok(())
    }

    async fn clear_scan_history(&self) -> PortResult<()> {
        self.check_write()?;
        let mut data = self.data.lock().unwrap();
        data.records.clear();
        data.summary = Some(HistorySummary::default());
        Ok(())
    }

    async fn get_history_summary(&self) -> PortResult<Option<HistorySummary>> {
        self.check_read()?;
        Ok(self.data.lock().unwrap().summary.clone())
    }

    async fn get_user_profile(&self) -> PortResult<Option<UserProfile>> {
        self.check_read()?;
        Ok(self.data.lock().unwrap().profile.clone())
    }

    async fn save_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        if self.fail_profile_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("profile write failed".to_string()));
        }
        self.check_write()?;
        self.data.lock().unwrap().profile = Some(profile.clone());
        Ok(())
    }
}

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn kg(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

pub fn food(name: &str, carbon: Decimal) -> AnalyzedObject {
    AnalyzedObject::new(name, Category::Food, carbon)
}

/// Vision and barcode fake: answers with fixed objects or fails.
pub struct ScriptedAnalyzer {
    pub objects: Vec<AnalyzedObject>,
    pub fail: bool,
    pub instructions: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    pub fn answering(objects: Vec<AnalyzedObject>) -> Self {
        Self { objects, fail: false, instructions: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { objects: Vec::new(), fail: true, instructions: Mutex::new(Vec::new()) }
    }

    fn answer(&self) -> PortResult<Vec<AnalyzedObject>> {
        if self.fail {
            Err(PortError::Unavailable("scripted failure".to_string()))
        } else {
            Ok(self.objects.clone())
        }
    }
}

#[async_trait]
impl VisionAnalysisService for ScriptedAnalyzer {
    async fn analyze(&self, _image_base64: &str, instruction: &str) -> PortResult<Vec<AnalyzedObject>> {
        self.instructions.lock().unwrap().push(instruction.to_string());
        self.answer()
    }
}

#[async_trait]
impl BarcodeLookupService for ScriptedAnalyzer {
    async fn lookup(&self, _code: &str, _symbology: Symbology) -> PortResult<Vec<AnalyzedObject>> {
        self.answer()
    }
}

/// Directions fake returning a fixed outcome, or an error when `None`.
pub struct ScriptedDirections(pub Option<DirectionsOutcome>);

#[async_trait]
impl DirectionsService for ScriptedDirections {
    async fn directions(
        &self,
        _origin: &str,
        _destination: &str,
        _mode: TransportMode,
    ) -> PortResult<DirectionsOutcome> {
        self.0
            .clone()
            .ok_or_else(|| PortError::Unexpected("provider error".to_string()))
    }
}
