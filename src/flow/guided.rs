//! Guided brew sequence: ready → bloom → pour-1..pour-N → drawdown → complete
//!
//! The machine only decides what happens next; the controller applies the
//! outputs to the session and the timer.

use crate::error::FlowError;
use crate::types::{Phase, MAX_GUIDED_POURS};
use log::info;
use statig::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum GuidedInput {
    Begin,
    Continue,
    Finish { elapsed_seconds: u32 },
    Restart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuidedOutput {
    StartTimer { target_seconds: Option<u32> },
    StopTimer,
    ResetTimer,
    EnterPhase(Phase),
    AdvancePour,
    RecordTotalTime(u32),
}

pub const MAX_GUIDED_OUTPUTS: usize = 8;

#[derive(Debug)]
pub struct GuidedContext {
    pour_count: u32,
    bloom_time_s: u32,
    outputs: heapless::Vec<GuidedOutput, MAX_GUIDED_OUTPUTS>,
}

impl GuidedContext {
    fn emit(&mut self, output: GuidedOutput) {
        let _ = self.outputs.push(output);
    }

    fn enter(&mut self, phase: Phase) {
        self.emit(GuidedOutput::EnterPhase(phase));
    }

    fn restart(&mut self) -> Response<State> {
        self.emit(GuidedOutput::ResetTimer);
        self.enter(Phase::Ready);
        Response::Transition(State::ready())
    }

    // After pour `done` (0 = bloom), move on to the next pour or to drawdown
    fn after_pour(&mut self, done: u32) -> Response<State> {
        if done < self.pour_count {
            let next = done + 1;
            if let Some(phase) = Phase::pour(next) {
                self.enter(phase);
                return Response::Transition(State::pouring(next));
            }
        }
        self.enter(Phase::Drawdown);
        Response::Transition(State::drawdown())
    }
}

#[derive(Debug, Default)]
pub struct GuidedMachine;

#[state_machine(
    initial = "State::ready()",
    state(derive(Debug)),
    on_transition = "Self::on_transition"
)]
impl GuidedMachine {
    #[state]
    fn ready(context: &mut GuidedContext, event: &GuidedInput) -> Response<State> {
        use Response::*;

        match event {
            GuidedInput::Begin => {
                context.emit(GuidedOutput::StartTimer {
                    target_seconds: Some(context.bloom_time_s),
                });
                context.enter(Phase::Bloom);
                Transition(State::bloom())
            }
            _ => Handled,
        }
    }

    #[state]
    fn bloom(context: &mut GuidedContext, event: &GuidedInput) -> Response<State> {
        use Response::*;

        match event {
            GuidedInput::Continue => context.after_pour(0),
            GuidedInput::Restart => context.restart(),
            _ => Handled,
        }
    }

    #[state]
    fn pouring(context: &mut GuidedContext, pour: &mut u32, event: &GuidedInput) -> Response<State> {
        use Response::*;

        match event {
            GuidedInput::Continue => {
                context.emit(GuidedOutput::AdvancePour);
                context.after_pour(*pour)
            }
            GuidedInput::Restart => context.restart(),
            _ => Handled,
        }
    }

    #[state]
    fn drawdown(context: &mut GuidedContext, event: &GuidedInput) -> Response<State> {
        use Response::*;

        match event {
            GuidedInput::Finish { elapsed_seconds } => {
                context.emit(GuidedOutput::StopTimer);
                context.emit(GuidedOutput::RecordTotalTime(*elapsed_seconds));
                context.enter(Phase::Complete);
                Transition(State::complete())
            }
            GuidedInput::Restart => context.restart(),
            _ => Handled,
        }
    }

    #[state]
    fn complete(context: &mut GuidedContext, event: &GuidedInput) -> Response<State> {
        use Response::*;

        match event {
            GuidedInput::Restart => context.restart(),
            _ => Handled,
        }
    }
}

impl GuidedMachine {
    fn on_transition(&mut self, source: &State, target: &State) {
        info!(
            "Guided brew: {} -> {}",
            Self::state_to_phase(source),
            Self::state_to_phase(target)
        );
    }

    fn state_to_phase(state: &State) -> Phase {
        match state {
            State::Ready {} => Phase::Ready,
            State::Bloom {} => Phase::Bloom,
            State::Pouring { pour } => Phase::pour(*pour).unwrap_or(Phase::Drawdown),
            State::Drawdown {} => Phase::Drawdown,
            State::Complete {} => Phase::Complete,
        }
    }
}

pub struct GuidedBrew {
    machine: statig::prelude::StateMachine<GuidedMachine>,
    context: GuidedContext,
}

impl GuidedBrew {
    /// Sequence for `pour_count` pours after a bloom of `bloom_time_s`
    pub fn new(pour_count: u32, bloom_time_s: u32) -> Result<Self, FlowError> {
        Self::check_pours(pour_count)?;
        Ok(Self {
            machine: GuidedMachine::default().state_machine(),
            context: GuidedContext {
                pour_count,
                bloom_time_s,
                outputs: heapless::Vec::new(),
            },
        })
    }

    fn check_pours(pour_count: u32) -> Result<(), FlowError> {
        if pour_count > MAX_GUIDED_POURS {
            return Err(FlowError::TooManyPours(pour_count));
        }
        Ok(())
    }

    /// Change the recipe; only possible before the sequence has begun
    pub fn configure(&mut self, pour_count: u32, bloom_time_s: u32) -> Result<(), FlowError> {
        Self::check_pours(pour_count)?;
        if self.phase() == Phase::Ready {
            self.context.pour_count = pour_count;
            self.context.bloom_time_s = bloom_time_s;
        }
        Ok(())
    }

    /// Process an input event and return output events
    pub fn handle_input(
        &mut self,
        input: GuidedInput,
    ) -> heapless::Vec<GuidedOutput, MAX_GUIDED_OUTPUTS> {
        self.context.outputs.clear();
        let _ = self.machine.handle_with_context(&input, &mut self.context);
        std::mem::take(&mut self.context.outputs)
    }

    pub fn phase(&self) -> Phase {
        GuidedMachine::state_to_phase(self.machine.state())
    }

    pub fn pour_count(&self) -> u32 {
        self.context.pour_count
    }

    pub fn current_pour(&self) -> Option<u32> {
        match self.machine.state() {
            State::Pouring { pour } => Some(*pour),
            _ => None,
        }
    }
}
