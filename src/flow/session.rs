//! Single-writer owner of the flow state

use super::navigation;
use super::reducer::{apply_with_defaults, FlowAction};
use super::state::{FlowState, SettingsPatch};
use crate::calc::parse_tasting_notes;
use crate::error::FlowError;
use crate::journal::{Brew, BrewInput, BrewJournal, BrewResult, BrewSettings};
use crate::system::config::RecipeDefaults;
use crate::types::{Brewer, Coffee, Phase};
use log::{debug, error, info, warn};

pub struct FlowSession {
    state: FlowState,
    defaults: RecipeDefaults,
}

impl FlowSession {
    pub fn new(coffees: Vec<Coffee>, brewers: Vec<Brewer>) -> Self {
        Self::with_defaults(RecipeDefaults::default(), coffees, brewers)
    }

    pub fn with_defaults(defaults: RecipeDefaults, coffees: Vec<Coffee>, brewers: Vec<Brewer>) -> Self {
        Self {
            state: FlowState::initial(&defaults, coffees, brewers),
            defaults,
        }
    }

    /// Fetch the reference lists from the journal and start a session
    pub async fn load<J: BrewJournal>(journal: &J, defaults: RecipeDefaults) -> anyhow::Result<Self> {
        let coffees = journal.list_active_coffees().await?;
        let brewers = journal.list_brewers().await?;
        info!(
            "Flow loaded with {} coffees and {} brewers",
            coffees.len(),
            brewers.len()
        );
        Ok(Self::with_defaults(defaults, coffees, brewers))
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn defaults(&self) -> &RecipeDefaults {
        &self.defaults
    }

    pub fn dispatch(&mut self, action: FlowAction) {
        let from = self.state.phase;
        let state = std::mem::take(&mut self.state);
        self.state = apply_with_defaults(state, action, &self.defaults);
        if self.state.phase != from {
            info!("Phase {} -> {}", from, self.state.phase);
        }
    }

    pub fn go_to_phase(&mut self, phase: Phase) {
        self.dispatch(FlowAction::SetPhase { phase });
    }

    pub fn next_phase(&mut self) {
        let phase = navigation::next_phase(self.state.phase);
        self.go_to_phase(phase);
    }

    pub fn prev_phase(&mut self) {
        let phase = navigation::prev_phase(self.state.phase);
        self.go_to_phase(phase);
    }

    pub fn select_coffee(&mut self, coffee_id: impl Into<String>) {
        self.dispatch(FlowAction::SelectCoffee {
            coffee_id: coffee_id.into(),
        });
    }

    pub fn select_brewer(&mut self, brewer_id: impl Into<String>) {
        self.dispatch(FlowAction::SelectBrewer {
            brewer_id: brewer_id.into(),
        });
    }

    pub fn update_settings(&mut self, settings: SettingsPatch) {
        self.dispatch(FlowAction::UpdateSettings { settings });
    }

    pub fn start_timer(&mut self) {
        self.dispatch(FlowAction::StartTimer);
    }

    pub fn restart_timer(&mut self) {
        self.dispatch(FlowAction::RestartTimer);
    }

    pub fn update_elapsed(&mut self, seconds: u32) {
        self.dispatch(FlowAction::UpdateElapsed { seconds });
    }

    pub fn advance_pour(&mut self) {
        self.dispatch(FlowAction::AdvancePour);
    }

    pub fn set_total_time(&mut self, seconds: Option<u32>) {
        self.dispatch(FlowAction::SetTotalTime { seconds });
    }

    pub fn set_rating(&mut self, rating: Option<u8>) {
        self.dispatch(FlowAction::SetRating { rating });
    }

    pub fn set_tasting_notes(&mut self, notes: impl Into<String>) {
        self.dispatch(FlowAction::SetTastingNotes {
            notes: notes.into(),
        });
    }

    pub fn set_feedback(&mut self, feedback: impl Into<String>) {
        self.dispatch(FlowAction::SetFeedback {
            feedback: feedback.into(),
        });
    }

    pub fn reset(&mut self) {
        self.dispatch(FlowAction::Reset);
    }

    pub fn selected_coffee(&self) -> Option<&Coffee> {
        self.state.selected_coffee()
    }

    pub fn selected_brewer(&self) -> Option<&Brewer> {
        self.state.selected_brewer()
    }

    pub fn ratio(&self) -> Option<String> {
        self.state.ratio()
    }

    pub fn pour_target(&self, pour_number: u32) -> Option<i64> {
        self.state.pour_target(pour_number)
    }

    pub fn pour_increment(&self, pour_number: u32) -> Option<i64> {
        self.state.pour_increment(pour_number)
    }

    /// Pre-fill the recipe from the latest brew with the selected coffee and
    /// brewer. Zero and missing values are skipped; a journal failure only logs.
    pub async fn prefill_from_last_brew<J: BrewJournal>(&mut self, journal: &J) -> bool {
        let (Some(coffee_id), Some(brewer_id)) =
            (self.state.coffee_id.clone(), self.state.brewer_id.clone())
        else {
            return false;
        };

        let settings = match journal.last_settings(&coffee_id, &brewer_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => return false,
            Err(e) => {
                debug!("No previous settings for {}/{}: {:?}", coffee_id, brewer_id, e);
                return false;
            }
        };

        let patch = SettingsPatch {
            dose_g: settings.dose_g.filter(|v| *v != 0.0),
            water_g: settings.water_g.filter(|v| *v != 0.0),
            grind_setting: settings.grind_setting.filter(|v| *v != 0.0).map(Some),
            water_temp_c: settings.water_temp_c.filter(|v| *v != 0).map(Some),
            bloom_water_g: settings.bloom_water_g.filter(|v| *v != 0.0),
            bloom_time_s: settings.bloom_time_s.filter(|v| *v != 0),
            pour_count: None,
        };
        info!("Loaded previous settings for {}/{}", coffee_id, brewer_id);
        self.update_settings(patch);
        true
    }

    /// Build the brew-creation request from the current state
    pub fn brew_request(&self) -> Result<BrewInput, FlowError> {
        let (Some(coffee_id), Some(brewer_id)) = (&self.state.coffee_id, &self.state.brewer_id)
        else {
            return Err(FlowError::MissingSelection);
        };

        let notes = parse_tasting_notes(&self.state.tasting_notes);
        let feedback = self.state.feedback.trim();

        Ok(BrewInput {
            coffee_id: coffee_id.clone(),
            brewer_id: brewer_id.clone(),
            settings: BrewSettings {
                dose_g: Some(self.state.dose_g),
                water_g: Some(self.state.water_g),
                grind_setting: self.state.grind_setting,
                water_temp_c: self.state.water_temp_c,
                bloom_water_g: Some(self.state.bloom_water_g),
                bloom_time_s: Some(self.state.bloom_time_s),
                total_time_s: self.state.total_time_s,
                filter_type: None,
            },
            result: BrewResult {
                rating: self.state.rating,
                tasting_notes: if notes.is_empty() { None } else { Some(notes) },
                feedback: if feedback.is_empty() {
                    None
                } else {
                    Some(self.state.feedback.clone())
                },
                goal: None,
            },
        })
    }

    /// Save the brew through the journal.
    ///
    /// Failures leave a user-facing message in `error` and clear
    /// `is_submitting` so the user can retry.
    pub async fn submit<J: BrewJournal>(&mut self, journal: &J) -> Result<Brew, FlowError> {
        if self.state.is_submitting {
            warn!("Submit ignored, a save is already in progress");
            return Err(FlowError::SubmissionInProgress);
        }

        let request = match self.brew_request() {
            Ok(request) => request,
            Err(e) => {
                warn!("Cannot save brew: {}", e);
                self.dispatch(FlowAction::SetError {
                    error: Some(e.user_message()),
                });
                return Err(e);
            }
        };

        self.dispatch(FlowAction::SetSubmitting { is_submitting: true });
        self.dispatch(FlowAction::SetError { error: None });

        match journal.create_brew(request).await {
            Ok(brew) => {
                info!("Brew saved: {}", brew.id);
                self.dispatch(FlowAction::SetSubmitting { is_submitting: false });
                Ok(brew)
            }
            Err(e) => {
                error!("Failed to save brew: {:?}", e);
                let err = FlowError::Submission(e.to_string());
                self.dispatch(FlowAction::SetError {
                    error: Some(err.user_message()),
                });
                self.dispatch(FlowAction::SetSubmitting { is_submitting: false });
                Err(err)
            }
        }
    }
}
