use crate::{
    calc::parse_brew_time,
    error::FlowError,
    flow::{FlowAction, FlowSession, GuidedBrew, GuidedInput, GuidedOutput, SettingsPatch},
    journal::{Brew, BrewJournal},
    system::{
        config::FlowConfig,
        events::{EventBus, FlowEvent},
    },
    timer::{BrewTimer, TimerSample, TimerSampler, TimerSnapshot},
    types::Phase,
};
use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::Duration;
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum FlowCommand {
    Dispatch(FlowAction),
    Next,
    Back,
    SelectCoffee(String),
    SelectBrewer(String),
    UpdateSettings(SettingsPatch),
    LoadLastSettings,
    BeginBrew,
    Continue,
    FinishBrew,
    RestartBrew,
    ToggleTimer,
    SetRating(Option<u8>),
    SetTastingNotes(String),
    SetFeedback(String),
    /// Free-text "M:SS"; anything unparseable clears the total time
    SetBrewTime(String),
    Submit,
    Reset,
    Shutdown,
}

pub type FlowCommandChannel = Channel<CriticalSectionRawMutex, FlowCommand, 8>;

pub struct BrewController<J: BrewJournal> {
    session: FlowSession,
    sampler: TimerSampler,
    guided: GuidedBrew,
    journal: J,
    commands: Arc<FlowCommandChannel>,
    events: Arc<EventBus>,
    last_saved: Option<Brew>,
}

impl<J: BrewJournal> BrewController<J> {
    pub fn new(session: FlowSession, journal: J, config: &FlowConfig) -> Result<Self, FlowError> {
        config.validate()?;
        let state = session.state();
        let guided = GuidedBrew::new(state.pour_count, state.bloom_time_s)?;
        let sampler = TimerSampler::new(
            BrewTimer::new(),
            Duration::from_millis(config.sample_interval_ms),
        );

        Ok(Self {
            session,
            sampler,
            guided,
            journal,
            commands: Arc::new(Channel::new()),
            events: Arc::new(EventBus::new()),
            last_saved: None,
        })
    }

    pub fn command_sender(&self) -> Arc<FlowCommandChannel> {
        Arc::clone(&self.commands)
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn session(&self) -> &FlowSession {
        &self.session
    }

    pub fn guided(&self) -> &GuidedBrew {
        &self.guided
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }

    pub fn last_saved(&self) -> Option<&Brew> {
        self.last_saved.as_ref()
    }

    pub async fn timer_snapshot(&self) -> TimerSnapshot {
        self.sampler.snapshot().await
    }

    /// Run until a `Shutdown` command arrives
    pub async fn run(&mut self) {
        info!("Starting brew flow loop");

        loop {
            let command_fut = self.commands.receive();
            let sample_fut = self.sampler.next_sample();

            match select(command_fut, sample_fut).await {
                Either::First(FlowCommand::Shutdown) => {
                    self.sampler.stop().await;
                    info!("Brew flow loop stopped");
                    break;
                }
                Either::First(command) => {
                    self.handle_command(command).await;
                }
                Either::Second(Some(sample)) => {
                    self.handle_sample(sample);
                }
                Either::Second(None) => {}
            }
        }
    }

    fn handle_sample(&mut self, sample: TimerSample) {
        debug!("Timer sample: {}s", sample.elapsed_seconds);
        self.session.update_elapsed(sample.elapsed_seconds);
        self.events.emit(FlowEvent::Tick {
            elapsed_seconds: sample.elapsed_seconds,
        });
        if sample.target_reached {
            info!("Timer target reached at {}s", sample.elapsed_seconds);
            self.events.emit(FlowEvent::TargetReached {
                elapsed_seconds: sample.elapsed_seconds,
            });
        }
    }

    pub async fn handle_command(&mut self, command: FlowCommand) {
        debug!("Command: {:?}", command);
        let before = self.session.phase();

        match command {
            FlowCommand::Dispatch(action) => self.session.dispatch(action),
            FlowCommand::Next => self.session.next_phase(),
            FlowCommand::Back => self.session.prev_phase(),
            FlowCommand::SelectCoffee(id) => self.session.select_coffee(id),
            FlowCommand::SelectBrewer(id) => self.session.select_brewer(id),
            FlowCommand::UpdateSettings(patch) => self.session.update_settings(patch),
            FlowCommand::LoadLastSettings => {
                self.session.prefill_from_last_brew(&self.journal).await;
            }
            FlowCommand::BeginBrew => {
                let state = self.session.state();
                if let Err(e) = self.guided.configure(state.pour_count, state.bloom_time_s) {
                    warn!("Cannot begin guided brew: {}", e);
                    self.session.dispatch(FlowAction::SetError {
                        error: Some(e.user_message()),
                    });
                } else {
                    self.drive_guided(GuidedInput::Begin).await;
                }
            }
            FlowCommand::Continue => self.drive_guided(GuidedInput::Continue).await,
            FlowCommand::FinishBrew => {
                if self.guided.phase() == Phase::Drawdown {
                    let elapsed_seconds = self.sampler.stop().await;
                    self.session.update_elapsed(elapsed_seconds);
                    self.drive_guided(GuidedInput::Finish { elapsed_seconds }).await;
                } else {
                    debug!("Finish ignored during {}", self.guided.phase());
                }
            }
            FlowCommand::RestartBrew => self.drive_guided(GuidedInput::Restart).await,
            FlowCommand::ToggleTimer => {
                if self.sampler.is_running().await {
                    self.stop_timer().await;
                } else {
                    self.sampler.start().await;
                    self.events.emit(FlowEvent::TimerStarted);
                }
            }
            FlowCommand::SetRating(rating) => self.session.set_rating(rating),
            FlowCommand::SetTastingNotes(notes) => self.session.set_tasting_notes(notes),
            FlowCommand::SetFeedback(feedback) => self.session.set_feedback(feedback),
            FlowCommand::SetBrewTime(text) => self.session.set_total_time(parse_brew_time(&text)),
            FlowCommand::Submit => self.submit().await,
            FlowCommand::Reset => {
                self.sampler.reset().await;
                self.drive_guided(GuidedInput::Restart).await;
                self.session.reset();
                self.events.emit(FlowEvent::Reset);
            }
            FlowCommand::Shutdown => {}
        }

        let after = self.session.phase();
        if before != after {
            self.events.emit(FlowEvent::PhaseChanged {
                from: before,
                to: after,
            });
        }
    }

    async fn drive_guided(&mut self, input: GuidedInput) {
        let outputs = self.guided.handle_input(input);
        for output in outputs {
            self.apply_output(output).await;
        }
    }

    async fn apply_output(&mut self, output: GuidedOutput) {
        match output {
            GuidedOutput::StartTimer { target_seconds } => {
                self.sampler.set_target(target_seconds).await;
                self.sampler.start().await;
                self.session.start_timer();
                self.events.emit(FlowEvent::TimerStarted);
            }
            GuidedOutput::StopTimer => {
                self.stop_timer().await;
            }
            GuidedOutput::ResetTimer => {
                self.sampler.reset().await;
                self.session.restart_timer();
            }
            GuidedOutput::EnterPhase(phase) => {
                self.session.go_to_phase(phase);
            }
            GuidedOutput::AdvancePour => {
                self.session.advance_pour();
            }
            GuidedOutput::RecordTotalTime(seconds) => {
                self.session.set_total_time(Some(seconds));
            }
        }
    }

    async fn stop_timer(&mut self) {
        let elapsed_seconds = self.sampler.stop().await;
        self.session.update_elapsed(elapsed_seconds);
        self.events.emit(FlowEvent::TimerStopped { elapsed_seconds });
    }

    async fn submit(&mut self) {
        match self.session.submit(&self.journal).await {
            Ok(brew) => {
                self.events.emit(FlowEvent::BrewSaved {
                    brew_id: brew.id.clone(),
                });
                self.last_saved = Some(brew);
            }
            Err(e) => {
                self.events.emit(FlowEvent::SubmitFailed {
                    message: e.user_message(),
                });
            }
        }
    }

    /// Phase of the flow as the wizard shows it
    pub fn phase(&self) -> Phase {
        self.session.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{BrewFilter, InMemoryJournal};
    use embassy_futures::{block_on, join::join};
    use embassy_time::Timer;

    fn fast_config() -> FlowConfig {
        FlowConfig {
            sample_interval_ms: 10,
            ..FlowConfig::default()
        }
    }

    fn controller() -> BrewController<InMemoryJournal> {
        let session = FlowSession::new(vec![], vec![]);
        BrewController::new(session, InMemoryJournal::new(), &fast_config()).unwrap()
    }

    async fn send_all(channel: &FlowCommandChannel, commands: Vec<FlowCommand>) {
        for command in commands {
            channel.send(command).await;
        }
    }

    #[test]
    fn test_guided_brew_and_submit() {
        let mut controller = controller();
        let sender = controller.command_sender();
        let events = controller.events();
        let mut sub = events.subscriber().unwrap();

        let script = vec![
            FlowCommand::SelectCoffee("c1".to_string()),
            FlowCommand::SelectBrewer("b1".to_string()),
            FlowCommand::BeginBrew,
            FlowCommand::Continue,
            FlowCommand::Continue,
            FlowCommand::Continue,
            FlowCommand::Continue,
            FlowCommand::FinishBrew,
            FlowCommand::SetRating(Some(4)),
            FlowCommand::SetTastingNotes("cacao, panela".to_string()),
            FlowCommand::Submit,
            FlowCommand::Shutdown,
        ];
        block_on(join(controller.run(), send_all(&sender, script)));

        let state = controller.session().state();
        assert_eq!(state.phase, Phase::Complete);
        assert_eq!(state.current_pour_index, 3);
        assert_eq!(state.pour_targets, vec![103, 177, 250]);
        assert!(state.timer_started);
        assert!(state.total_time_s.is_some());

        let saved = controller.last_saved().unwrap();
        assert_eq!(saved.rating, Some(4));
        assert_eq!(saved.tasting_notes, vec!["cacao", "panela"]);

        let stored = block_on(controller.journal().list_brews(&BrewFilter::default())).unwrap();
        assert_eq!(stored.len(), 1);

        let seen = sub.drain();
        assert!(seen.contains(&FlowEvent::PhaseChanged {
            from: Phase::Welcome,
            to: Phase::Bloom
        }));
        assert!(seen.iter().any(|e| matches!(e, FlowEvent::BrewSaved { .. })));
    }

    #[test]
    fn test_ticks_update_elapsed() {
        let mut controller = controller();
        let sender = controller.command_sender();

        let script = async {
            sender.send(FlowCommand::BeginBrew).await;
            Timer::after(Duration::from_millis(1200)).await;
            sender.send(FlowCommand::Continue).await;
            sender.send(FlowCommand::Continue).await;
            sender.send(FlowCommand::Continue).await;
            sender.send(FlowCommand::Continue).await;
            sender.send(FlowCommand::FinishBrew).await;
            sender.send(FlowCommand::Shutdown).await;
        };
        block_on(join(controller.run(), script));

        let state = controller.session().state();
        assert!(state.elapsed_seconds >= 1, "elapsed = {}", state.elapsed_seconds);
        assert_eq!(state.total_time_s, Some(state.elapsed_seconds));
    }

    #[test]
    fn test_finish_before_drawdown_keeps_timer_running() {
        let mut controller = controller();
        let events = controller.events();
        let mut sub = events.subscriber().unwrap();
        block_on(async {
            controller.handle_command(FlowCommand::BeginBrew).await;
            controller.handle_command(FlowCommand::Continue).await;
            controller.handle_command(FlowCommand::FinishBrew).await;
        });

        assert!(block_on(controller.timer_snapshot()).is_running);
        assert_eq!(controller.phase(), Phase::Pour1);
        assert_eq!(controller.session().state().total_time_s, None);
        assert!(!sub
            .drain()
            .iter()
            .any(|e| matches!(e, FlowEvent::TimerStopped { .. })));
    }

    #[test]
    fn test_restart_then_brew_again_counts_pours_from_zero() {
        let mut controller = controller();
        let full_brew = [
            FlowCommand::BeginBrew,
            FlowCommand::Continue,
            FlowCommand::Continue,
            FlowCommand::Continue,
            FlowCommand::Continue,
            FlowCommand::FinishBrew,
        ];
        block_on(async {
            for command in full_brew.clone() {
                controller.handle_command(command).await;
            }
            assert_eq!(controller.session().state().current_pour_index, 3);
            assert!(controller.session().state().total_time_s.is_some());

            controller.handle_command(FlowCommand::RestartBrew).await;
            let state = controller.session().state();
            assert_eq!(state.phase, Phase::Ready);
            assert_eq!(state.current_pour_index, 0);
            assert_eq!(state.total_time_s, None);
            assert!(!state.timer_started);

            for command in full_brew {
                controller.handle_command(command).await;
            }
        });

        let state = controller.session().state();
        assert_eq!(state.phase, Phase::Complete);
        assert_eq!(state.current_pour_index, 3);
        assert!(state.total_time_s.is_some());
    }

    #[test]
    fn test_submit_without_selection_reports_failure() {
        let mut controller = controller();
        let events = controller.events();
        let mut sub = events.subscriber().unwrap();
        block_on(controller.handle_command(FlowCommand::Submit));

        assert!(controller.last_saved().is_none());
        assert_eq!(
            sub.drain(),
            vec![FlowEvent::SubmitFailed {
                message: crate::error::MISSING_SELECTION_MESSAGE.to_string()
            }]
        );
    }

    #[test]
    fn test_too_many_pours_blocks_begin() {
        let mut controller = controller();
        block_on(async {
            controller
                .handle_command(FlowCommand::UpdateSettings(SettingsPatch {
                    pour_count: Some(6),
                    ..SettingsPatch::default()
                }))
                .await;
            controller.handle_command(FlowCommand::BeginBrew).await;
        });
        assert_eq!(controller.phase(), Phase::Welcome);
        assert!(controller.session().state().error.is_some());
        assert!(!controller.session().state().timer_started);
    }

    #[test]
    fn test_brew_time_text() {
        let mut controller = controller();
        block_on(async {
            controller
                .handle_command(FlowCommand::SetBrewTime("3:05".to_string()))
                .await;
            assert_eq!(controller.session().state().total_time_s, Some(185));
            controller
                .handle_command(FlowCommand::SetBrewTime("3:5".to_string()))
                .await;
            assert_eq!(controller.session().state().total_time_s, None);
        });
    }

    #[test]
    fn test_reset_returns_to_welcome() {
        let mut controller = controller();
        block_on(async {
            controller.handle_command(FlowCommand::Next).await;
            controller.handle_command(FlowCommand::BeginBrew).await;
            controller.handle_command(FlowCommand::Reset).await;
        });
        assert_eq!(controller.phase(), Phase::Welcome);
        assert_eq!(controller.guided().phase(), Phase::Ready);
        assert!(!controller.session().state().timer_started);
        assert!(!block_on(controller.sampler.is_running()));
    }
}
