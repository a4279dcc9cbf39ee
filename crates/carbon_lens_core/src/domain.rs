//! crates/carbon_lens_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry no database or transport concerns; they only derive
//! `serde` so adapters can persist and ship them as they are.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rounds a carbon mass to two decimal places, midpoints away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Adds two carbon masses, pinning at `Decimal::MAX` instead of overflowing.
pub fn add_carbon(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

/// Largest carbon mass accepted for a single object, in kg.
pub const MAX_OBJECT_CARBON_KG: i64 = 1_000_000_000;

//=========================================================================================
// Scan Content
//=========================================================================================

/// Broad grouping used for the per-category carbon breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Beverage,
    Product,
    Clothing,
    Electronics,
    Household,
    Packaging,
    Transport,
    Energy,
    #[serde(other)]
    Other,
}

impl Category {
    /// Lenient parse used for model output: unknown labels become `Other`.
    pub fn parse_lossy(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "food" | "meal" | "produce" => Category::Food,
            "beverage" | "drink" => Category::Beverage,
            "product" => Category::Product,
            "clothing" | "apparel" => Category::Clothing,
            "electronics" => Category::Electronics,
            "household" => Category::Household,
            "packaging" => Category::Packaging,
            "transport" | "transportation" => Category::Transport,
            "energy" => Category::Energy,
            _ => Category::Other,
        }
    }
}

/// One detected item from a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedObject {
    pub name: String,
    pub category: Category,
    pub carbon_kg: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AnalyzedObject {
    /// Creates an object; negative carbon estimates are clamped to zero.
    pub fn new(name: impl Into<String>, category: Category, carbon_kg: Decimal) -> Self {
        Self {
            name: name.into(),
            category,
            carbon_kg: carbon_kg.max(Decimal::ZERO),
            confidence: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Where a scan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    Product,
    Meal,
    Receipt,
    Barcode,
    Trip,
    Manual,
}

impl ScanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanKind::Product => "product",
            ScanKind::Meal => "meal",
            ScanKind::Receipt => "receipt",
            ScanKind::Barcode => "barcode",
            ScanKind::Trip => "trip",
            ScanKind::Manual => "manual",
        }
    }
}

impl std::str::FromStr for ScanKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(ScanKind::Product),
            "meal" => Ok(ScanKind::Meal),
            "receipt" => Ok(ScanKind::Receipt),
            "barcode" => Ok(ScanKind::Barcode),
            "trip" => Ok(ScanKind::Trip),
            "manual" => Ok(ScanKind::Manual),
            other => Err(format!("unknown scan kind '{}'", other)),
        }
    }
}

/// Barcode symbologies reported by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Qr,
    #[serde(other)]
    Unknown,
}

/// One completed scan event. Immutable once created, except for deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub kind: ScanKind,
    pub objects: Vec<AnalyzedObject>,
    pub total_carbon_kg: Decimal,
}

impl ScanRecord {
    /// Builds a record whose total is the rounded sum of its objects.
    pub fn new(kind: ScanKind, objects: Vec<AnalyzedObject>, scanned_at: DateTime<Utc>) -> Self {
        let total = objects.iter().fold(Decimal::ZERO, |acc, o| add_carbon(acc, o.carbon_kg));
        Self {
            id: Uuid::new_v4(),
            scanned_at,
            kind,
            objects,
            total_carbon_kg: round2(total),
        }
    }

    /// The transport modes of any trips contained in this record.
    pub fn transport_modes(&self) -> impl Iterator<Item = TransportMode> + '_ {
        self.objects
            .iter()
            .filter(|o| o.category == Category::Transport)
            .filter_map(|o| o.metadata.get("mode").and_then(|m| m.as_str()))
            .map(TransportMode::parse_lossy)
    }
}

//=========================================================================================
// Derived Summary
//=========================================================================================

/// An entry in the ranked list of most frequently scanned object names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFrequency {
    pub name: String,
    pub count: u32,
}

/// Derived aggregate over every `ScanRecord`. It is a cache and must always be
/// re-derivable from the full record collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_scans: u32,
    pub total_objects: u32,
    pub total_carbon_kg: Decimal,
    pub category_totals: BTreeMap<Category, Decimal>,
    pub object_frequencies: BTreeMap<String, u32>,
    pub top_objects: Vec<ObjectFrequency>,
    pub average_carbon_per_scan: Decimal,
}

impl HistorySummary {
    /// Category totals rounded for display.
    pub fn rounded_category_totals(&self) -> BTreeMap<Category, Decimal> {
        self.category_totals
            .iter()
            .map(|(category, total)| (*category, round2(*total)))
            .collect()
    }
}

//=========================================================================================
// Transport
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Car,
    Motorbike,
    Bus,
    Train,
    Bike,
    Walk,
    Plane,
}

impl TransportMode {
    /// Parses a mode name. Unknown names fall back to `Car`.
    pub fn parse_lossy(mode: &str) -> Self {
        match mode.trim().to_ascii_lowercase().as_str() {
            "car" | "driving" => TransportMode::Car,
            "motorbike" | "motorcycle" => TransportMode::Motorbike,
            "bus" | "transit" => TransportMode::Bus,
            "train" | "rail" => TransportMode::Train,
            "bike" | "bicycle" | "bicycling" | "cycling" => TransportMode::Bike,
            "walk" | "walking" => TransportMode::Walk,
            "plane" | "flight" => TransportMode::Plane,
            _ => TransportMode::Car,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Motorbike => "motorbike",
            TransportMode::Bus => "bus",
            TransportMode::Train => "train",
            TransportMode::Bike => "bike",
            TransportMode::Walk => "walk",
            TransportMode::Plane => "plane",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carbon and time estimate for one mode over a fixed distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeEstimate {
    pub mode: TransportMode,
    pub carbon_kg: Decimal,
    pub duration_min: u32,
}

/// Whether a trip's distance came from the mapping service or the formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Directions,
    Fallback,
}

/// A planned or logged trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripEstimate {
    pub mode: TransportMode,
    pub distance_km: Decimal,
    pub duration_min: u32,
    pub carbon_kg: Decimal,
    pub origin: String,
    pub destination: String,
    pub source: EstimateSource,
    pub alternatives: Vec<ModeEstimate>,
}

//=========================================================================================
// Profile
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Grid,
    Renewable,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeEnergy {
    pub source: EnergySource,
    pub household_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub daily_reminder: bool,
    pub achievement_alerts: bool,
    pub weekly_report: bool,
}

/// User-editable goals and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub daily_carbon_budget_kg: Decimal,
    pub weekly_carbon_budget_kg: Decimal,
    pub reduction_target_percent: u8,
    pub streak_goal_days: u32,
    pub home_energy: HomeEnergy,
    pub default_transport: TransportMode,
    pub notifications: NotificationPreferences,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            daily_carbon_budget_kg: Decimal::new(8, 0),
            weekly_carbon_budget_kg: Decimal::new(56, 0),
            reduction_target_percent: 20,
            streak_goal_days: 7,
            home_energy: HomeEnergy {
                source: EnergySource::Grid,
                household_size: 1,
            },
            default_transport: TransportMode::Car,
            notifications: NotificationPreferences {
                daily_reminder: true,
                achievement_alerts: true,
                weekly_report: false,
            },
        }
    }
}

/// Per-user unlock state of a catalog achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub requirement: String,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub progress: u8,
}

/// The single, long-lived user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub settings: UserSettings,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub lifetime_scans: u32,
    pub lifetime_carbon_kg: Decimal,
    pub achievements: Vec<Achievement>,
}

impl UserProfile {
    /// A fresh profile with default settings and every achievement locked.
    pub fn new(display_name: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            display_name: display_name.into(),
            joined_at,
            settings: UserSettings::default(),
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            lifetime_scans: 0,
            lifetime_carbon_kg: Decimal::ZERO,
            achievements: crate::gamification::locked_catalog(),
        }
    }

    /// Resets everything except the name and join date.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.display_name), self.joined_at);
    }
}

/// Derived from the total scan count; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLevel {
    pub level: u8,
    pub title: String,
    pub min_scans: u32,
    pub next_level_scans: Option<u32>,
}
