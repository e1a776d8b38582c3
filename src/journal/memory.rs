use super::{
    Brew, BrewFilter, BrewInput, BrewJournal, BrewSettings, BrewerInput, BrewerRecord,
    CoffeeInput, CoffeeRecord, CoffeeStatus, UserSettings,
};
use crate::types::{Brewer, Coffee};
use anyhow::{anyhow, bail};
use chrono::Utc;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use log::{debug, info};
use std::sync::Arc;

#[derive(Debug, Default)]
struct JournalData {
    coffees: Vec<CoffeeRecord>,
    brewers: Vec<BrewerRecord>,
    brews: Vec<Brew>,
    user_settings: Option<UserSettings>,
}

/// Journal kept entirely in memory; cloning shares the same data
#[derive(Clone)]
pub struct InMemoryJournal {
    data: Arc<Mutex<CriticalSectionRawMutex, JournalData>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(JournalData::default())),
        }
    }

    pub async fn add_coffee(&self, input: CoffeeInput) -> CoffeeRecord {
        let record = CoffeeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            roaster: input.roaster,
            origin: input.origin,
            process: input.process,
            roast_level: input.roast_level,
            roast_date: input.roast_date,
            flavor_notes: input.flavor_notes,
            status: input.status,
            created_at: Utc::now(),
        };
        debug!("Adding coffee {} ({})", record.name, record.id);
        self.data.lock().await.coffees.push(record.clone());
        record
    }

    pub async fn add_brewer(&self, input: BrewerInput) -> BrewerRecord {
        let record = BrewerRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            brewer_type: input.brewer_type,
            filter_type: input.filter_type,
            default_dose_g: input.default_dose_g,
            default_ratio: input.default_ratio,
            created_at: Utc::now(),
        };
        debug!("Adding brewer {} ({})", record.name, record.id);
        self.data.lock().await.brewers.push(record.clone());
        record
    }

    pub async fn set_user_settings(&self, grinder: Option<String>, kettle: Option<String>) {
        let mut data = self.data.lock().await;
        let id = data
            .user_settings
            .as_ref()
            .map(|s| s.id.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        data.user_settings = Some(UserSettings {
            id,
            grinder,
            kettle,
            updated_at: Utc::now(),
        });
    }

    /// Store a brew as-is, keeping its id and timestamps
    pub async fn insert_brew(&self, brew: Brew) {
        self.data.lock().await.brews.push(brew);
    }

    /// Like [`BrewJournal::brew`] but an unknown id is an error
    pub async fn require_brew(&self, id: &str) -> anyhow::Result<Brew> {
        self.brew(id)
            .await?
            .ok_or_else(|| anyhow!("brew {} not found", id))
    }
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl BrewJournal for InMemoryJournal {
    async fn list_active_coffees(&self) -> anyhow::Result<Vec<Coffee>> {
        let data = self.data.lock().await;
        let mut coffees: Vec<&CoffeeRecord> = data
            .coffees
            .iter()
            .filter(|c| c.status == CoffeeStatus::Active)
            .collect();
        coffees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(coffees.into_iter().map(Coffee::from).collect())
    }

    async fn list_brewers(&self) -> anyhow::Result<Vec<Brewer>> {
        let data = self.data.lock().await;
        let mut brewers: Vec<&BrewerRecord> = data.brewers.iter().collect();
        brewers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brewers.into_iter().map(Brewer::from).collect())
    }

    async fn create_brew(&self, input: BrewInput) -> anyhow::Result<Brew> {
        if input.coffee_id.is_empty() || input.brewer_id.is_empty() {
            bail!("coffee_id and brewer_id are required");
        }

        let now = Utc::now();
        let BrewInput {
            coffee_id,
            brewer_id,
            settings,
            result,
        } = input;
        let brew = Brew {
            id: uuid::Uuid::new_v4().to_string(),
            coffee_id,
            brewer_id: Some(brewer_id),
            brewed_at: now,
            dose_g: settings.dose_g,
            water_g: settings.water_g,
            grind_setting: settings.grind_setting,
            water_temp_c: settings.water_temp_c,
            bloom_water_g: settings.bloom_water_g,
            bloom_time_s: settings.bloom_time_s,
            total_time_s: settings.total_time_s,
            filter_type: settings.filter_type,
            rating: result.rating,
            tasting_notes: result.tasting_notes.unwrap_or_default(),
            feedback: result.feedback,
            goal: result.goal,
            created_at: now,
        };

        self.data.lock().await.brews.push(brew.clone());
        info!("Brew {} saved for coffee {}", brew.id, brew.coffee_id);
        Ok(brew)
    }

    async fn last_settings(
        &self,
        coffee_id: &str,
        brewer_id: &str,
    ) -> anyhow::Result<Option<BrewSettings>> {
        let data = self.data.lock().await;
        let latest = data
            .brews
            .iter()
            .filter(|b| b.coffee_id == coffee_id && b.brewer_id.as_deref() == Some(brewer_id))
            .max_by_key(|b| b.brewed_at);
        Ok(latest.map(Brew::settings))
    }

    async fn best_brew(
        &self,
        coffee_id: &str,
        brewer_id: Option<&str>,
    ) -> anyhow::Result<Option<Brew>> {
        let data = self.data.lock().await;
        let best = data
            .brews
            .iter()
            .filter(|b| b.coffee_id == coffee_id && b.rating.is_some())
            .filter(|b| brewer_id.map_or(true, |id| b.brewer_id.as_deref() == Some(id)))
            .max_by_key(|b| (b.rating, b.brewed_at));
        Ok(best.cloned())
    }

    async fn list_brews(&self, filter: &BrewFilter) -> anyhow::Result<Vec<Brew>> {
        let data = self.data.lock().await;
        let mut brews: Vec<Brew> = data
            .brews
            .iter()
            .filter(|b| {
                filter
                    .coffee_id
                    .as_deref()
                    .map_or(true, |id| b.coffee_id == id)
            })
            .filter(|b| {
                filter
                    .brewer_id
                    .as_deref()
                    .map_or(true, |id| b.brewer_id.as_deref() == Some(id))
            })
            .cloned()
            .collect();
        brews.sort_by(|a, b| b.brewed_at.cmp(&a.brewed_at));
        brews.truncate(filter.limit);
        Ok(brews)
    }

    async fn brew(&self, id: &str) -> anyhow::Result<Option<Brew>> {
        let data = self.data.lock().await;
        Ok(data.brews.iter().find(|b| b.id == id).cloned())
    }

    async fn coffee(&self, id: &str) -> anyhow::Result<Option<CoffeeRecord>> {
        let data = self.data.lock().await;
        Ok(data.coffees.iter().find(|c| c.id == id).cloned())
    }

    async fn brewer(&self, id: &str) -> anyhow::Result<Option<BrewerRecord>> {
        let data = self.data.lock().await;
        Ok(data.brewers.iter().find(|b| b.id == id).cloned())
    }

    async fn user_settings(&self) -> anyhow::Result<Option<UserSettings>> {
        Ok(self.data.lock().await.user_settings.clone())
    }
}
