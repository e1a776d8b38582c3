//! Persistence collaborator: record shapes and the journal interface.
//!
//! Storage itself lives outside this crate; [`memory::InMemoryJournal`] backs
//! the demo binary and tests.

pub mod memory;

pub use memory::InMemoryJournal;

use crate::types::{Brewer, Coffee};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessType {
    Washed,
    Natural,
    Honey,
    Anaerobic,
    Other,
}

impl ProcessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::Washed => "washed",
            ProcessType::Natural => "natural",
            ProcessType::Honey => "honey",
            ProcessType::Anaerobic => "anaerobic",
            ProcessType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoastLevel {
    Light,
    MediumLight,
    Medium,
    MediumDark,
    Dark,
}

impl RoastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Light => "light",
            RoastLevel::MediumLight => "medium-light",
            RoastLevel::Medium => "medium",
            RoastLevel::MediumDark => "medium-dark",
            RoastLevel::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoffeeStatus {
    #[default]
    Active,
    Finished,
    Wishlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrewerType {
    V60,
    Chemex,
    Origami,
    Aeropress,
    Kalita,
    Other,
}

impl BrewerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrewerType::V60 => "v60",
            BrewerType::Chemex => "chemex",
            BrewerType::Origami => "origami",
            BrewerType::Aeropress => "aeropress",
            BrewerType::Kalita => "kalita",
            BrewerType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoffeeRecord {
    pub id: String,
    pub name: String,
    pub roaster: String,
    pub origin: Option<String>,
    pub process: Option<ProcessType>,
    pub roast_level: Option<RoastLevel>,
    pub roast_date: Option<String>,
    pub flavor_notes: Vec<String>,
    pub status: CoffeeStatus,
    pub created_at: DateTime<Utc>,
}

impl CoffeeRecord {
    pub fn days_off_roast(&self) -> Option<i64> {
        crate::calc::days_off_roast(self.roast_date.as_deref())
    }
}

impl From<&CoffeeRecord> for Coffee {
    fn from(record: &CoffeeRecord) -> Self {
        Coffee {
            id: record.id.clone(),
            name: record.name.clone(),
            roaster: record.roaster.clone(),
            origin: record.origin.clone(),
            roast_date: record.roast_date.clone(),
            flavor_notes: Some(record.flavor_notes.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrewerRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub brewer_type: BrewerType,
    pub filter_type: Option<String>,
    pub default_dose_g: Option<f64>,
    pub default_ratio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&BrewerRecord> for Brewer {
    fn from(record: &BrewerRecord) -> Self {
        Brewer {
            id: record.id.clone(),
            name: record.name.clone(),
            brewer_type: record.brewer_type.as_str().to_string(),
            default_dose_g: record.default_dose_g,
            default_ratio: record.default_ratio.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brew {
    pub id: String,
    pub coffee_id: String,
    pub brewer_id: Option<String>,
    pub brewed_at: DateTime<Utc>,
    pub dose_g: Option<f64>,
    pub water_g: Option<f64>,
    pub grind_setting: Option<f64>,
    pub water_temp_c: Option<i32>,
    pub bloom_water_g: Option<f64>,
    pub bloom_time_s: Option<u32>,
    pub total_time_s: Option<u32>,
    pub filter_type: Option<String>,
    pub rating: Option<u8>,
    pub tasting_notes: Vec<String>,
    pub feedback: Option<String>,
    pub goal: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Brew {
    pub fn ratio(&self) -> Option<String> {
        crate::calc::ratio(self.dose_g, self.water_g)
    }

    pub fn settings(&self) -> BrewSettings {
        BrewSettings {
            dose_g: self.dose_g,
            water_g: self.water_g,
            grind_setting: self.grind_setting,
            water_temp_c: self.water_temp_c,
            bloom_water_g: self.bloom_water_g,
            bloom_time_s: self.bloom_time_s,
            total_time_s: self.total_time_s,
            filter_type: self.filter_type.clone(),
        }
    }
}

/// Coffee plus its computed age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoffeeWithDaysOffRoast {
    #[serde(flatten)]
    pub coffee: CoffeeRecord,
    pub days_off_roast: Option<i64>,
}

/// Brew plus its computed ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrewWithRatio {
    #[serde(flatten)]
    pub brew: Brew,
    pub ratio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: String,
    pub grinder: Option<String>,
    pub kettle: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrewSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grind_setting: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_temp_c: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_water_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_time_s: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_s: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrewResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasting_notes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
}

/// Brew-creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrewInput {
    pub coffee_id: String,
    pub brewer_id: String,
    #[serde(default)]
    pub settings: BrewSettings,
    #[serde(default)]
    pub result: BrewResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoffeeInput {
    pub name: String,
    pub roaster: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub process: Option<ProcessType>,
    #[serde(default)]
    pub roast_level: Option<RoastLevel>,
    #[serde(default)]
    pub roast_date: Option<String>,
    #[serde(default)]
    pub flavor_notes: Vec<String>,
    #[serde(default)]
    pub status: CoffeeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrewerInput {
    pub name: String,
    #[serde(rename = "type")]
    pub brewer_type: BrewerType,
    #[serde(default)]
    pub filter_type: Option<String>,
    #[serde(default)]
    pub default_dose_g: Option<f64>,
    #[serde(default)]
    pub default_ratio: Option<String>,
}

/// Brew listing filter, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct BrewFilter {
    pub coffee_id: Option<String>,
    pub brewer_id: Option<String>,
    pub limit: usize,
}

impl Default for BrewFilter {
    fn default() -> Self {
        Self {
            coffee_id: None,
            brewer_id: None,
            limit: 20,
        }
    }
}

/// Interface to wherever coffees, brewers and brews are stored
#[allow(async_fn_in_trait)]
pub trait BrewJournal {
    /// Coffees with status active, by name
    async fn list_active_coffees(&self) -> anyhow::Result<Vec<Coffee>>;

    /// All brewers, by name
    async fn list_brewers(&self) -> anyhow::Result<Vec<Brewer>>;

    /// Store a new brew. Fails when the coffee or brewer id is empty.
    async fn create_brew(&self, input: BrewInput) -> anyhow::Result<Brew>;

    /// Settings of the most recent brew for a coffee/brewer pair
    async fn last_settings(
        &self,
        coffee_id: &str,
        brewer_id: &str,
    ) -> anyhow::Result<Option<BrewSettings>>;

    /// Highest rated brew for a coffee, newest first on ties
    async fn best_brew(
        &self,
        coffee_id: &str,
        brewer_id: Option<&str>,
    ) -> anyhow::Result<Option<Brew>>;

    async fn list_brews(&self, filter: &BrewFilter) -> anyhow::Result<Vec<Brew>>;

    async fn brew(&self, id: &str) -> anyhow::Result<Option<Brew>>;

    async fn coffee(&self, id: &str) -> anyhow::Result<Option<CoffeeRecord>>;

    async fn brewer(&self, id: &str) -> anyhow::Result<Option<BrewerRecord>>;

    async fn user_settings(&self) -> anyhow::Result<Option<UserSettings>>;
}
