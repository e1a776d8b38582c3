//! Centralized configuration management

use crate::error::FlowError;
use crate::types::{
    DEFAULT_BLOOM_TIME_S, DEFAULT_BLOOM_WATER_G, DEFAULT_DOSE_G, DEFAULT_POUR_COUNT,
    DEFAULT_WATER_G, DEFAULT_WATER_TEMP_C, MAX_GUIDED_POURS, TIMER_SAMPLE_INTERVAL_MS,
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Starting recipe for a fresh flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeDefaults {
    pub dose_g: f64,
    pub water_g: f64,
    pub water_temp_c: Option<i32>,
    pub bloom_water_g: f64,
    pub bloom_time_s: u32,
    pub pour_count: u32,
}

impl Default for RecipeDefaults {
    fn default() -> Self {
        Self {
            dose_g: DEFAULT_DOSE_G,
            water_g: DEFAULT_WATER_G,
            water_temp_c: Some(DEFAULT_WATER_TEMP_C),
            bloom_water_g: DEFAULT_BLOOM_WATER_G,
            bloom_time_s: DEFAULT_BLOOM_TIME_S,
            pour_count: DEFAULT_POUR_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub recipe: RecipeDefaults,
    pub sample_interval_ms: u64,
    pub max_pours: u32,
    /// Number of earlier brews included in the AI export
    pub export_history: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            recipe: RecipeDefaults::default(),
            sample_interval_ms: TIMER_SAMPLE_INTERVAL_MS,
            max_pours: MAX_GUIDED_POURS,
            export_history: 3,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.sample_interval_ms == 0 {
            return Err(FlowError::Config(
                "sample_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_pours == 0 || self.max_pours > MAX_GUIDED_POURS {
            return Err(FlowError::Config(format!(
                "max_pours must be between 1 and {}",
                MAX_GUIDED_POURS
            )));
        }
        if self.recipe.pour_count > self.max_pours {
            return Err(FlowError::TooManyPours(self.recipe.pour_count));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<Mutex<CriticalSectionRawMutex, FlowConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_config(FlowConfig::default())
    }

    pub fn with_config(config: FlowConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }

    /// Parse a JSON document; missing keys fall back to defaults
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: FlowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(Self::with_config(config))
    }

    pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let manager = Self::from_json(&json)?;
        info!("Loaded flow configuration from {}", path.display());
        Ok(manager)
    }

    pub fn get_handle(&self) -> Arc<Mutex<CriticalSectionRawMutex, FlowConfig>> {
        Arc::clone(&self.config)
    }

    pub async fn get_config(&self) -> FlowConfig {
        self.config.lock().await.clone()
    }

    pub async fn update_config<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut FlowConfig),
    {
        let mut config = self.config.lock().await;
        update_fn(&mut config);
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
