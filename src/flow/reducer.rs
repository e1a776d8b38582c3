//! Pure state transitions for the brew flow

use super::state::{FlowState, SettingsPatch};
use crate::calc::pour_targets;
use crate::system::config::RecipeDefaults;
use crate::types::{Brewer, Coffee, Phase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowAction {
    SetData { coffees: Vec<Coffee>, brewers: Vec<Brewer> },
    SetPhase { phase: Phase },
    SelectCoffee { coffee_id: String },
    SelectBrewer { brewer_id: String },
    UpdateSettings { settings: SettingsPatch },
    StartTimer,
    /// Back to an unstarted brew; the recipe and tasting fields stay
    RestartTimer,
    UpdateElapsed { seconds: u32 },
    AdvancePour,
    SetTotalTime { seconds: Option<u32> },
    SetRating { rating: Option<u8> },
    SetTastingNotes { notes: String },
    SetFeedback { feedback: String },
    SetSubmitting { is_submitting: bool },
    SetError { error: Option<String> },
    Reset,
}

/// Apply an action with the built-in recipe defaults
pub fn apply(state: FlowState, action: FlowAction) -> FlowState {
    apply_with_defaults(state, action, &RecipeDefaults::default())
}

/// Apply an action; `defaults` is what `Reset` restores.
///
/// Never fails and never validates ids: a bad selection only shows up when the
/// brew is submitted.
pub fn apply_with_defaults(
    mut state: FlowState,
    action: FlowAction,
    defaults: &RecipeDefaults,
) -> FlowState {
    match action {
        FlowAction::SetData { coffees, brewers } => {
            state.coffees = coffees;
            state.brewers = brewers;
        }
        FlowAction::SetPhase { phase } => {
            state.phase = phase;
        }
        FlowAction::SelectCoffee { coffee_id } => {
            state.coffee_id = Some(coffee_id);
        }
        FlowAction::SelectBrewer { brewer_id } => {
            let default_dose = state
                .brewers
                .iter()
                .find(|b| b.id == brewer_id)
                .and_then(|b| b.default_dose_g);
            if let Some(dose) = default_dose {
                state.dose_g = dose;
            }
            state.brewer_id = Some(brewer_id);
        }
        FlowAction::UpdateSettings { settings } => {
            let recompute = settings.affects_pour_targets();
            merge_settings(&mut state, settings);
            if recompute {
                state.pour_targets =
                    pour_targets(state.water_g, state.bloom_water_g, state.pour_count);
            }
        }
        FlowAction::StartTimer => {
            state.timer_started = true;
            state.pour_targets = pour_targets(state.water_g, state.bloom_water_g, state.pour_count);
        }
        FlowAction::RestartTimer => {
            state.timer_started = false;
            state.elapsed_seconds = 0;
            state.current_pour_index = 0;
            state.total_time_s = None;
        }
        FlowAction::UpdateElapsed { seconds } => {
            state.elapsed_seconds = seconds;
        }
        FlowAction::AdvancePour => {
            state.current_pour_index += 1;
        }
        FlowAction::SetTotalTime { seconds } => {
            state.total_time_s = seconds;
        }
        FlowAction::SetRating { rating } => {
            state.rating = rating;
        }
        FlowAction::SetTastingNotes { notes } => {
            state.tasting_notes = notes;
        }
        FlowAction::SetFeedback { feedback } => {
            state.feedback = feedback;
        }
        FlowAction::SetSubmitting { is_submitting } => {
            state.is_submitting = is_submitting;
        }
        FlowAction::SetError { error } => {
            state.error = error;
        }
        FlowAction::Reset => {
            let coffees = std::mem::take(&mut state.coffees);
            let brewers = std::mem::take(&mut state.brewers);
            state = FlowState::initial(defaults, coffees, brewers);
        }
    }
    state
}

fn merge_settings(state: &mut FlowState, settings: SettingsPatch) {
    if let Some(dose) = settings.dose_g {
        state.dose_g = dose;
    }
    if let Some(water) = settings.water_g {
        state.water_g = water;
    }
    if let Some(grind) = settings.grind_setting {
        state.grind_setting = grind;
    }
    if let Some(temp) = settings.water_temp_c {
        state.water_temp_c = temp;
    }
    if let Some(bloom_water) = settings.bloom_water_g {
        state.bloom_water_g = bloom_water;
    }
    if let Some(bloom_time) = settings.bloom_time_s {
        state.bloom_time_s = bloom_time;
    }
    if let Some(pours) = settings.pour_count {
        state.pour_count = pours;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brewer(id: &str, default_dose_g: Option<f64>) -> Brewer {
        Brewer {
            id: id.to_string(),
            name: format!("Brewer {}", id),
            brewer_type: "v60".to_string(),
            default_dose_g,
            default_ratio: None,
        }
    }

    fn coffee(id: &str) -> Coffee {
        Coffee {
            id: id.to_string(),
            name: "Huila".to_string(),
            roaster: "Local".to_string(),
            origin: Some("Colombia".to_string()),
            roast_date: None,
            flavor_notes: None,
        }
    }

    #[test]
    fn test_start_timer_computes_targets() {
        let state = apply(FlowState::default(), FlowAction::StartTimer);
        assert!(state.timer_started);
        assert_eq!(state.pour_targets, vec![103, 177, 250]);
    }

    #[test]
    fn test_update_settings_recomputes_targets() {
        let state = apply(
            FlowState::default(),
            FlowAction::UpdateSettings {
                settings: SettingsPatch {
                    water_g: Some(300.0),
                    pour_count: Some(2),
                    ..SettingsPatch::default()
                },
            },
        );
        assert_eq!(state.pour_targets, vec![165, 300]);
    }

    #[test]
    fn test_dose_only_update_leaves_targets() {
        let state = apply(FlowState::default(), FlowAction::StartTimer);
        let state = apply(
            state,
            FlowAction::UpdateSettings {
                settings: SettingsPatch::dose(20.0),
            },
        );
        assert_eq!(state.dose_g, 20.0);
        assert_eq!(state.pour_targets, vec![103, 177, 250]);
    }

    #[test]
    fn test_nullable_settings_can_be_cleared() {
        let state = apply(
            FlowState::default(),
            FlowAction::UpdateSettings {
                settings: SettingsPatch {
                    grind_setting: Some(Some(22.5)),
                    ..SettingsPatch::default()
                },
            },
        );
        assert_eq!(state.grind_setting, Some(22.5));
        let state = apply(
            state,
            FlowAction::UpdateSettings {
                settings: SettingsPatch {
                    grind_setting: Some(None),
                    water_temp_c: Some(None),
                    ..SettingsPatch::default()
                },
            },
        );
        assert_eq!(state.grind_setting, None);
        assert_eq!(state.water_temp_c, None);
    }

    #[test]
    fn test_select_brewer_applies_default_dose() {
        let state = apply(
            FlowState::default(),
            FlowAction::SetData {
                coffees: vec![],
                brewers: vec![brewer("v60", Some(18.0)), brewer("kalita", None)],
            },
        );
        let state = apply(
            state,
            FlowAction::UpdateSettings {
                settings: SettingsPatch::dose(12.0),
            },
        );
        let state = apply(
            state,
            FlowAction::SelectBrewer {
                brewer_id: "v60".to_string(),
            },
        );
        assert_eq!(state.dose_g, 18.0);

        // No default: the manual dose stays
        let state = apply(
            state,
            FlowAction::UpdateSettings {
                settings: SettingsPatch::dose(14.0),
            },
        );
        let state = apply(
            state,
            FlowAction::SelectBrewer {
                brewer_id: "kalita".to_string(),
            },
        );
        assert_eq!(state.dose_g, 14.0);
        assert_eq!(state.brewer_id.as_deref(), Some("kalita"));
    }

    #[test]
    fn test_unknown_ids_are_accepted() {
        let state = apply(
            FlowState::default(),
            FlowAction::SelectCoffee {
                coffee_id: "missing".to_string(),
            },
        );
        assert_eq!(state.coffee_id.as_deref(), Some("missing"));
        assert!(state.selected_coffee().is_none());
    }

    #[test]
    fn test_set_phase_is_verbatim() {
        let state = apply(
            FlowState::default(),
            FlowAction::SetPhase {
                phase: Phase::Pour4,
            },
        );
        assert_eq!(state.phase, Phase::Pour4);
    }

    #[test]
    fn test_reset_keeps_reference_data() {
        let mut state = apply(
            FlowState::default(),
            FlowAction::SetData {
                coffees: vec![coffee("c1")],
                brewers: vec![brewer("b1", None)],
            },
        );
        for action in [
            FlowAction::SelectCoffee {
                coffee_id: "c1".to_string(),
            },
            FlowAction::SetPhase {
                phase: Phase::Results,
            },
            FlowAction::SetRating { rating: Some(4) },
            FlowAction::StartTimer,
            FlowAction::AdvancePour,
            FlowAction::UpdateElapsed { seconds: 42 },
        ] {
            state = apply(state, action);
        }
        let state = apply(state, FlowAction::Reset);

        assert_eq!(state.coffees.len(), 1);
        assert_eq!(state.brewers.len(), 1);
        assert_eq!(state.phase, Phase::Welcome);
        assert_eq!(state.coffee_id, None);
        assert_eq!(state.rating, None);
        assert!(!state.timer_started);
        assert_eq!(state.current_pour_index, 0);
        assert_eq!(state.elapsed_seconds, 0);
        assert!(state.pour_targets.is_empty());
    }

    #[test]
    fn test_restart_timer_rewinds_the_brew() {
        let mut state = FlowState::default();
        for action in [
            FlowAction::StartTimer,
            FlowAction::AdvancePour,
            FlowAction::AdvancePour,
            FlowAction::UpdateElapsed { seconds: 150 },
            FlowAction::SetTotalTime { seconds: Some(150) },
            FlowAction::SetRating { rating: Some(3) },
        ] {
            state = apply(state, action);
        }
        let state = apply(state, FlowAction::RestartTimer);

        assert!(!state.timer_started);
        assert_eq!(state.current_pour_index, 0);
        assert_eq!(state.elapsed_seconds, 0);
        assert_eq!(state.total_time_s, None);
        assert_eq!(state.rating, Some(3));
        assert_eq!(state.pour_targets, vec![103, 177, 250]);
    }

    #[test]
    fn test_action_json_shape() {
        let action: FlowAction =
            serde_json::from_str(r#"{"type":"SELECT_COFFEE","coffee_id":"c9"}"#).unwrap();
        assert_eq!(
            action,
            FlowAction::SelectCoffee {
                coffee_id: "c9".to_string()
            }
        );
        let json = serde_json::to_string(&FlowAction::StartTimer).unwrap();
        assert_eq!(json, r#"{"type":"START_TIMER"}"#);
    }
}
