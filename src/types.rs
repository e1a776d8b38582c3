use serde::{Deserialize, Serialize};

/// Wizard phase. Only the first five take part in linear navigation; the timed
/// phases are driven by the guided brew sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "welcome")]
    Welcome,
    #[serde(rename = "coffee")]
    Coffee,
    #[serde(rename = "brewer")]
    Brewer,
    #[serde(rename = "settings")]
    Settings,
    #[serde(rename = "results")]
    Results,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "bloom")]
    Bloom,
    #[serde(rename = "pour-1")]
    Pour1,
    #[serde(rename = "pour-2")]
    Pour2,
    #[serde(rename = "pour-3")]
    Pour3,
    #[serde(rename = "pour-4")]
    Pour4,
    #[serde(rename = "pour-5")]
    Pour5,
    #[serde(rename = "drawdown")]
    Drawdown,
    #[serde(rename = "complete")]
    Complete,
}

impl Phase {
    /// Pour phase for a 1-indexed pour number, if one exists.
    pub fn pour(number: u32) -> Option<Phase> {
        match number {
            1 => Some(Phase::Pour1),
            2 => Some(Phase::Pour2),
            3 => Some(Phase::Pour3),
            4 => Some(Phase::Pour4),
            5 => Some(Phase::Pour5),
            _ => None,
        }
    }

    pub fn pour_number(&self) -> Option<u32> {
        match self {
            Phase::Pour1 => Some(1),
            Phase::Pour2 => Some(2),
            Phase::Pour3 => Some(3),
            Phase::Pour4 => Some(4),
            Phase::Pour5 => Some(5),
            _ => None,
        }
    }

    /// Phases rendered on a dark background
    pub fn is_dark(&self) -> bool {
        matches!(self, Phase::Bloom | Phase::Drawdown) || self.pour_number().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Welcome => "welcome",
            Phase::Coffee => "coffee",
            Phase::Brewer => "brewer",
            Phase::Settings => "settings",
            Phase::Results => "results",
            Phase::Ready => "ready",
            Phase::Bloom => "bloom",
            Phase::Pour1 => "pour-1",
            Phase::Pour2 => "pour-2",
            Phase::Pour3 => "pour-3",
            Phase::Pour4 => "pour-4",
            Phase::Pour5 => "pour-5",
            Phase::Drawdown => "drawdown",
            Phase::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coffee as seen by the flow (reference data, read only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coffee {
    pub id: String,
    pub name: String,
    pub roaster: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub roast_date: Option<String>,
    #[serde(default)]
    pub flavor_notes: Option<Vec<String>>,
}

/// Brewer as seen by the flow (reference data, read only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brewer {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub brewer_type: String,
    #[serde(default)]
    pub default_dose_g: Option<f64>,
    #[serde(default)]
    pub default_ratio: Option<String>,
}

pub const DEFAULT_DOSE_G: f64 = 15.0;
pub const DEFAULT_WATER_G: f64 = 250.0;
pub const DEFAULT_WATER_TEMP_C: i32 = 93;
pub const DEFAULT_BLOOM_WATER_G: f64 = 30.0;
pub const DEFAULT_BLOOM_TIME_S: u32 = 45;
pub const DEFAULT_POUR_COUNT: u32 = 3;
pub const MAX_GUIDED_POURS: u32 = 5;
pub const TIMER_SAMPLE_INTERVAL_MS: u64 = 250;
