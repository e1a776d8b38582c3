use crate::calc::round_half_up;
use crate::system::config::RecipeDefaults;
use crate::types::{Brewer, Coffee, Phase};
use serde::{Deserialize, Serialize};

/// Everything the wizard knows about the brew in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    pub phase: Phase,

    // Reference data
    pub coffees: Vec<Coffee>,
    pub brewers: Vec<Brewer>,

    // Selections
    pub coffee_id: Option<String>,
    pub brewer_id: Option<String>,

    // Recipe
    pub dose_g: f64,
    pub water_g: f64,
    pub grind_setting: Option<f64>,
    pub water_temp_c: Option<i32>,
    pub bloom_water_g: f64,
    pub bloom_time_s: u32,
    pub pour_count: u32,

    // Timer mirror
    pub timer_started: bool,
    pub elapsed_seconds: u32,

    // Pour tracking
    pub current_pour_index: u32,
    pub pour_targets: Vec<i64>,

    // Results
    pub total_time_s: Option<u32>,
    pub rating: Option<u8>,
    pub tasting_notes: String,
    pub feedback: String,

    pub is_submitting: bool,
    pub error: Option<String>,
}

impl FlowState {
    /// Fresh state using the given recipe defaults and reference lists
    pub fn initial(defaults: &RecipeDefaults, coffees: Vec<Coffee>, brewers: Vec<Brewer>) -> Self {
        Self {
            phase: Phase::Welcome,
            coffees,
            brewers,
            coffee_id: None,
            brewer_id: None,
            dose_g: defaults.dose_g,
            water_g: defaults.water_g,
            grind_setting: None,
            water_temp_c: defaults.water_temp_c,
            bloom_water_g: defaults.bloom_water_g,
            bloom_time_s: defaults.bloom_time_s,
            pour_count: defaults.pour_count,
            timer_started: false,
            elapsed_seconds: 0,
            current_pour_index: 0,
            pour_targets: Vec::new(),
            total_time_s: None,
            rating: None,
            tasting_notes: String::new(),
            feedback: String::new(),
            is_submitting: false,
            error: None,
        }
    }

    pub fn selected_coffee(&self) -> Option<&Coffee> {
        let id = self.coffee_id.as_deref()?;
        self.coffees.iter().find(|c| c.id == id)
    }

    pub fn selected_brewer(&self) -> Option<&Brewer> {
        let id = self.brewer_id.as_deref()?;
        self.brewers.iter().find(|b| b.id == id)
    }

    pub fn ratio(&self) -> Option<String> {
        crate::calc::ratio(Some(self.dose_g), Some(self.water_g))
    }

    /// Cumulative water target for a 1-indexed pour, from the current recipe
    pub fn pour_target(&self, pour_number: u32) -> Option<i64> {
        if pour_number == 0 || pour_number > self.pour_count {
            return None;
        }
        crate::calc::pour_targets(self.water_g, self.bloom_water_g, self.pour_count)
            .get(pour_number as usize - 1)
            .copied()
    }

    /// Grams a given pour adds on top of the previous target (or the bloom)
    pub fn pour_increment(&self, pour_number: u32) -> Option<i64> {
        let target = self.pour_target(pour_number)?;
        if pour_number > 1 {
            return Some(target - self.pour_target(pour_number - 1)?);
        }
        Some(round_half_up(target as f64 - self.bloom_water_g))
    }
}

impl Default for FlowState {
    fn default() -> Self {
        Self::initial(&RecipeDefaults::default(), Vec::new(), Vec::new())
    }
}

/// Partial recipe update; `None` leaves a field untouched.
///
/// `grind_setting` and `water_temp_c` are nullable on the state, so they take
/// a nested option: `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub dose_g: Option<f64>,
    #[serde(default)]
    pub water_g: Option<f64>,
    #[serde(default)]
    pub grind_setting: Option<Option<f64>>,
    #[serde(default)]
    pub water_temp_c: Option<Option<i32>>,
    #[serde(default)]
    pub bloom_water_g: Option<f64>,
    #[serde(default)]
    pub bloom_time_s: Option<u32>,
    #[serde(default)]
    pub pour_count: Option<u32>,
}

impl SettingsPatch {
    pub fn dose(dose_g: f64) -> Self {
        Self {
            dose_g: Some(dose_g),
            ..Self::default()
        }
    }

    pub fn water(water_g: f64) -> Self {
        Self {
            water_g: Some(water_g),
            ..Self::default()
        }
    }

    /// True when the patch touches an input of the pour-target calculation
    pub fn affects_pour_targets(&self) -> bool {
        self.water_g.is_some() || self.bloom_water_g.is_some() || self.pour_count.is_some()
    }
}
